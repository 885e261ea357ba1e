/// Return this error from a poll probe when more entities were observed than were requested.
///
/// The poller treats every other probe error as transient and retries. This one stops the poll
/// straight away.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Found {observed}/{expected} {what}, more than requested")]
pub struct OvershootError {
    what: String,
    observed: usize,
    expected: usize,
}

impl OvershootError {
    pub fn new(what: impl Into<String>, observed: usize, expected: usize) -> Self {
        Self {
            what: what.into(),
            observed,
            expected,
        }
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn expected(&self) -> usize {
        self.expected
    }
}
