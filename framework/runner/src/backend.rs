use crate::status::ClusterStatus;
use crate::types::SettleBenchResult;

/// What the benchmark asks a backend to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Number of consumers to run.
    pub consumers: usize,
    /// Base URL the consumers should be configured with.
    pub base_url: String,
}

impl DeploymentTarget {
    pub fn new(consumers: usize, base_url: impl Into<String>) -> Self {
        Self {
            consumers,
            base_url: base_url.into(),
        }
    }
}

/// A way of deploying consumers onto a cluster.
///
/// The sweep driver only talks to the cluster through this trait. Errors returned from
/// [Backend::query_status] are treated as transient and the query is retried, errors from every
/// other method stop the run.
pub trait Backend {
    /// Short name recorded in the run summary, e.g. `kubectl` or `helm`.
    fn name(&self) -> &str;

    /// Name of the group column in the measurement log.
    fn group_label(&self) -> &str {
        "namespace"
    }

    /// The namespace or model that `target` is deployed into.
    fn group_id(&self, target: &DeploymentTarget) -> String;

    /// Name of the phase that waits for the consumers to be running.
    fn ready_phase(&self) -> &str {
        "pods"
    }

    /// Name of the phase that waits for the cluster to settle.
    fn settle_phase(&self) -> &str {
        "settled"
    }

    /// Settings that identify the deployment, recorded in the run summary.
    fn settings(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Deploy `target.consumers` consumers configured with `target.base_url`.
    fn apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()>;

    /// Reconfigure the running deployment to use `target.base_url`.
    fn mutate_config(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()>;

    /// Remove everything that [Backend::apply] created.
    fn remove(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()>;

    /// List the entities of the deployment and their state.
    fn query_status(&mut self, target: &DeploymentTarget) -> SettleBenchResult<ClusterStatus>;
}
