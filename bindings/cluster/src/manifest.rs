mod template;

use std::io::Write;

use anyhow::Context;
use settle_bench_runner::prelude::{
    Backend, ClusterStatus, DeploymentTarget, SettleBenchResult,
};
use tempfile::NamedTempFile;

use crate::kubectl::Kubectl;

pub use template::{ManifestError, ManifestFlavour, ManifestTemplate};

/// Deploys consumers by rendering a [ManifestTemplate] and applying it with `kubectl`.
///
/// Changing the base URL re-renders the manifest and applies it again. The last applied manifest
/// is kept so that exactly those resources can be deleted.
#[derive(Debug)]
pub struct ManifestBackend {
    kubectl: Kubectl,
    template: ManifestTemplate,
    prefix: String,
    applied: Option<NamedTempFile>,
}

impl ManifestBackend {
    pub fn new(kubectl: Kubectl, template: ManifestTemplate) -> Self {
        Self {
            kubectl,
            template,
            prefix: "sse-consumer".to_string(),
            applied: None,
        }
    }

    /// Prefix of the consumer deployment names. Defaults to `sse-consumer`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn render_and_apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        let rendered = self
            .template
            .render(target.consumers, &self.prefix, &target.base_url)?;

        let mut file = tempfile::Builder::new()
            .prefix("settle-bench-")
            .suffix(".yaml")
            .tempfile()
            .context("Failed to create file for the rendered manifest")?;
        file.write_all(rendered.as_bytes())
            .context("Failed to write the rendered manifest")?;
        file.flush()?;

        log::debug!(
            "Applying {} consumers with base URL {} from {}",
            target.consumers,
            target.base_url,
            file.path().display()
        );
        self.kubectl.apply_file(file.path())?;
        self.applied = Some(file);

        Ok(())
    }
}

impl Backend for ManifestBackend {
    fn name(&self) -> &str {
        "kubectl"
    }

    fn group_id(&self, _target: &DeploymentTarget) -> String {
        self.kubectl.namespace().to_string()
    }

    fn settings(&self) -> Vec<(String, String)> {
        vec![
            ("namespace".to_string(), self.kubectl.namespace().to_string()),
            ("flavour".to_string(), self.template.flavour().to_string()),
            ("prefix".to_string(), self.prefix.clone()),
        ]
    }

    fn apply(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        self.render_and_apply(target)
    }

    fn mutate_config(&mut self, target: &DeploymentTarget) -> SettleBenchResult<()> {
        if self.applied.is_none() {
            anyhow::bail!("Cannot change the base URL, nothing has been applied");
        }
        self.render_and_apply(target)
    }

    fn remove(&mut self, _target: &DeploymentTarget) -> SettleBenchResult<()> {
        let Some(applied) = self.applied.take() else {
            anyhow::bail!("Cannot remove the consumers, nothing has been applied");
        };

        self.kubectl.delete_file(applied.path())
    }

    fn query_status(&mut self, _target: &DeploymentTarget) -> SettleBenchResult<ClusterStatus> {
        let base_url_label = self.template.flavour().base_url_label();

        Ok(self
            .kubectl
            .get_pods()?
            .iter()
            .map(|pod| {
                if pod.name().starts_with(&self.prefix) {
                    pod.to_consumer(base_url_label)
                } else {
                    pod.to_other()
                }
            })
            .collect())
    }
}
