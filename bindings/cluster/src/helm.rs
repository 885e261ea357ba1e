use std::path::PathBuf;
use std::sync::Arc;

use settle_bench_runner::prelude::{
    Backend, ClusterStatus, DeploymentTarget, SettleBenchResult,
};

use crate::command::{CommandRunner, Invocation};
use crate::kubectl::Kubectl;

/// The chart to install and the values it takes the base URL and consumer count from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmChart {
    pub release: String,
    pub chart: String,
    pub base_url_key: String,
    pub count_key: String,
}

impl Default for HelmChart {
    fn default() -> Self {
        Self {
            release: "sse-relations-benchmark".to_string(),
            chart: "sse-relations".to_string(),
            base_url_key: "sseServerBaseUrl".to_string(),
            count_key: "numConsumers".to_string(),
        }
    }
}

/// Deploys consumers by installing a Helm chart, and changes the base URL with `helm upgrade`.
pub struct HelmBackend {
    runner: Arc<dyn CommandRunner + Send + Sync>,
    helm_path: PathBuf,
    kubectl: Kubectl,
    chart: HelmChart,
    prefix: String,
}

impl HelmBackend {
    pub fn new(
        runner: Arc<dyn CommandRunner + Send + Sync>,
        helm_path: impl Into<PathBuf>,
        kubectl_path: impl Into<PathBuf>,
        namespace: impl Into<String>,
        chart: HelmChart,
    ) -> Self {
        Self {
            kubectl: Kubectl::new(runner.clone(), kubectl_path, namespace),
            runner,
            helm_path: helm_path.into(),
            chart,
            prefix: "sse-consumer".to_string(),
        }
    }

    /// Prefix of the consumer pod names created by the chart. Defaults to `sse-consumer`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn helm(&self, command: &str) -> Invocation {
        Invocation::new(&self.helm_path).args([command, "-n", self.kubectl.namespace()])
    }

    fn install_or_upgrade(&self, command: &str, target: &DeploymentTarget) -> SettleBenchResult<()> {
        let invocation = self
            .helm(command)
            .arg("--set")
            .arg(format!("{}={}", self.chart.base_url_key, target.base_url))
            .arg("--set")
            .arg(format!("{}={}", self.chart.count_key, target.consumers))
            .args([self.chart.release.as_str(), self.chart.chart.as_str()]);

        self.runner.run(&invocation)
    }
}

impl std::fmt::Debug for HelmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelmBackend")
            .field("helm_path", &self.helm_path)
            .field("kubectl", &self.kubectl)
            .field("chart", &self.chart)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Backend for HelmBackend {
    fn name(&self) -> &str {
        "helm"
    }

    fn group_id(&self, _target: &DeploymentTarget) -> String {
        self.kubectl.namespace().to_string()
    }

    fn settings(&self) -> Vec<(String, String)> {
        vec![
            ("namespace".to_string(), self.kubectl.namespace().to_string()),
            ("release".to_string(), self.chart.release.clone()),
            ("chart".to_string(), self.chart.chart.clone()),
        ]
    }

    fn apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.install_or_upgrade("install", target)
    }

    fn mutate_config(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.install_or_upgrade("upgrade", target)
    }

    fn remove(&mut self, _target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.runner
            .run(&self.helm("uninstall").arg(self.chart.release.as_str()))
    }

    fn query_status(&mut self, _target: &DeploymentTarget) -> SettleBenchResult<ClusterStatus> {
        Ok(self
            .kubectl
            .get_pods()?
            .iter()
            .map(|pod| {
                if pod.name().starts_with(&self.prefix) {
                    pod.to_consumer("base-url")
                } else {
                    pod.to_other()
                }
            })
            .collect())
    }
}
