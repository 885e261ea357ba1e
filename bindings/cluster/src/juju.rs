mod bundle;
mod status;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use settle_bench_runner::prelude::{
    Backend, ClusterStatus, DeploymentTarget, Entity, EntityKind, EntityPhase, SettleBenchResult,
};

use crate::command::{CommandRunner, Invocation};
use crate::kubectl::Kubectl;

pub use bundle::JujuBundle;
pub use status::JujuStatus;

/// Deploys consumers as charms into a fresh Juju model per sweep value.
///
/// The base URL is configured on the `endpoint` application and relayed to the consumers over
/// their relation, so a consumer is only ready once its logs show the new base URL.
pub struct JujuBackend {
    runner: Arc<dyn CommandRunner + Send + Sync>,
    juju_path: PathBuf,
    kubectl_path: PathBuf,
    model_prefix: String,
    cloud: String,
    bundle: JujuBundle,
    consumer_prefix: String,
    consumer_charm: String,
    endpoint: String,
}

impl JujuBackend {
    pub fn new(
        runner: Arc<dyn CommandRunner + Send + Sync>,
        juju_path: impl Into<PathBuf>,
        kubectl_path: impl Into<PathBuf>,
        model_prefix: impl Into<String>,
        cloud: impl Into<String>,
        bundle: JujuBundle,
    ) -> Self {
        Self {
            runner,
            juju_path: juju_path.into(),
            kubectl_path: kubectl_path.into(),
            model_prefix: model_prefix.into(),
            cloud: cloud.into(),
            bundle,
            consumer_prefix: "consumer".to_string(),
            consumer_charm: "cs:~tengu-team/sse-consumer-2".to_string(),
            endpoint: "endpoint".to_string(),
        }
    }

    /// Charm deployed for every consumer. Defaults to `cs:~tengu-team/sse-consumer-2`.
    pub fn with_consumer_charm(mut self, charm: impl Into<String>) -> Self {
        self.consumer_charm = charm.into();
        self
    }

    fn model(&self, target: &DeploymentTarget) -> String {
        format!("{}-{}", self.model_prefix, target.consumers)
    }

    fn juju(&self) -> Invocation {
        Invocation::new(&self.juju_path)
    }

    fn kubectl(&self, model: &str) -> Kubectl {
        Kubectl::new(self.runner.clone(), &self.kubectl_path, model)
    }

    fn juju_status(&self, model: &str) -> SettleBenchResult<JujuStatus> {
        let output = self
            .runner
            .output(&self.juju().args(["status", "--format", "json", "-m", model]))?;

        JujuStatus::parse(&output)
            .with_context(|| format!("Failed to parse the status of model {model}"))
    }
}

impl std::fmt::Debug for JujuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JujuBackend")
            .field("juju_path", &self.juju_path)
            .field("kubectl_path", &self.kubectl_path)
            .field("model_prefix", &self.model_prefix)
            .field("cloud", &self.cloud)
            .field("consumer_charm", &self.consumer_charm)
            .finish()
    }
}

impl Backend for JujuBackend {
    fn name(&self) -> &str {
        "juju"
    }

    fn group_label(&self) -> &str {
        "model_name"
    }

    fn group_id(&self, target: &DeploymentTarget) -> String {
        self.model(target)
    }

    fn settle_phase(&self) -> &str {
        "juju"
    }

    fn settings(&self) -> Vec<(String, String)> {
        vec![
            ("model_prefix".to_string(), self.model_prefix.clone()),
            ("cloud".to_string(), self.cloud.clone()),
            ("consumer_charm".to_string(), self.consumer_charm.clone()),
        ]
    }

    fn apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        let model = self.model(target);
        self.runner
            .run(&self.juju().args(["add-model", model.as_str(), self.cloud.as_str()]))?;

        let mut bundle = self.bundle.with_consumers(
            target.consumers,
            &self.consumer_prefix,
            &self.consumer_charm,
            &format!("{}:sse-endpoint", self.endpoint),
        );
        bundle.set_option(&self.endpoint, "base-url", &target.base_url)?;

        let mut file = tempfile::Builder::new()
            .prefix("settle-bench-bundle-")
            .suffix(".yaml")
            .tempfile()
            .context("Failed to create file for the rendered bundle")?;
        file.write_all(bundle.to_yaml()?.as_bytes())
            .context("Failed to write the rendered bundle")?;
        file.flush()?;

        self.runner.run(
            &self
                .juju()
                .arg("deploy")
                .arg(file.path().display().to_string())
                .args(["-m", model.as_str()]),
        )
    }

    fn mutate_config(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        let model = self.model(target);
        self.runner.run(
            &self
                .juju()
                .args(["config", "-m", model.as_str(), self.endpoint.as_str()])
                .arg(format!("base-url={}", target.base_url)),
        )
    }

    fn remove(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        let model = self.model(target);
        log::info!("Clearing model {model}");

        let status = self.juju_status(&model)?;

        let applications = status.application_names();
        if !applications.is_empty() {
            self.runner.run(
                &self
                    .juju()
                    .arg("remove-application")
                    .args(applications)
                    .args(["-m", model.as_str()]),
            )?;
        }

        let machines = status.machine_ids();
        if !machines.is_empty() {
            self.runner.run(
                &self
                    .juju()
                    .arg("remove-machine")
                    .args(machines)
                    .args(["-m", model.as_str()]),
            )?;
        }

        Ok(())
    }

    fn query_status(&mut self, target: &DeploymentTarget) -> SettleBenchResult<ClusterStatus> {
        let model = self.model(target);
        let kubectl = self.kubectl(&model);

        let mut status = ClusterStatus::new(self.juju_status(&model)?.entities());

        for pod in kubectl.get_pods()? {
            let is_consumer = pod
                .label("juju-application")
                .is_some_and(|app| app.starts_with(&self.consumer_prefix));
            if !is_consumer {
                status.push(pod.to_other());
                continue;
            }

            // The base URL is relayed to consumers, it only shows up in their logs.
            let mut entity = Entity::new(pod.name(), EntityKind::Consumer, pod.phase());
            if entity.phase == EntityPhase::Running {
                match kubectl.logs(pod.name()) {
                    Ok(logs) if logs.contains(&target.base_url) => {
                        entity = entity.with_base_url(&target.base_url);
                    }
                    Ok(_) => {
                        log::debug!("Pod {} doesn't have {} in its logs", pod.name(), target.base_url);
                    }
                    Err(e) => {
                        log::warn!("Failed to get logs of pod {}: {e}", pod.name());
                    }
                }
            }
            status.push(entity);
        }

        Ok(status)
    }
}
