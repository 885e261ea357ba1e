mod overshoot;
mod poll;
mod timeout;

pub mod prelude {
    pub use crate::overshoot::OvershootError;
    pub use crate::poll::{poll_until, PollOptions, PollReport};
    pub use crate::timeout::PollTimeoutError;
}
