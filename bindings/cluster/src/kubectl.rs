use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use settle_bench_runner::prelude::{Entity, EntityKind, EntityPhase, SettleBenchResult};

use crate::command::{CommandRunner, Invocation};

/// `kubectl` bound to a single namespace.
#[derive(Clone)]
pub struct Kubectl {
    runner: Arc<dyn CommandRunner + Send + Sync>,
    path: PathBuf,
    namespace: String,
}

impl Kubectl {
    pub fn new(
        runner: Arc<dyn CommandRunner + Send + Sync>,
        path: impl Into<PathBuf>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.path).args(["-n", self.namespace.as_str()])
    }

    /// All pods in the namespace.
    pub fn get_pods(&self) -> SettleBenchResult<Vec<Pod>> {
        let invocation = self.invocation().args(["get", "pods", "-o", "json"]);
        let output = self.runner.output(&invocation)?;

        let pods: PodList = serde_json::from_str(&output).with_context(|| {
            format!("Failed to parse the pods of namespace {}", self.namespace)
        })?;

        Ok(pods.items)
    }

    pub fn logs(&self, pod: &str) -> SettleBenchResult<String> {
        self.runner.output(&self.invocation().args(["logs", pod]))
    }

    pub fn apply_file(&self, path: &Path) -> SettleBenchResult<()> {
        self.runner.run(
            &self
                .invocation()
                .args(["apply", "-f"])
                .arg(path.display().to_string()),
        )
    }

    pub fn delete_file(&self, path: &Path) -> SettleBenchResult<()> {
        self.runner.run(
            &self
                .invocation()
                .args(["delete", "-f"])
                .arg(path.display().to_string()),
        )
    }
}

impl std::fmt::Debug for Kubectl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kubectl")
            .field("path", &self.path)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

/// The parts of a Kubernetes pod the benchmark looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    deletion_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PodStatus {
    phase: Option<String>,
}

impl Pod {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata.labels.get(key).map(String::as_str)
    }

    /// A pod that is being deleted is terminating, whatever its phase says.
    pub fn phase(&self) -> EntityPhase {
        if self.metadata.deletion_timestamp.is_some() {
            return EntityPhase::Terminating;
        }

        self.status
            .phase
            .as_deref()
            .map(EntityPhase::from_pod_phase)
            .unwrap_or(EntityPhase::Unknown)
    }

    /// Consumer entity whose base URL is read from the pod label `base_url_label`.
    pub fn to_consumer(&self, base_url_label: &str) -> Entity {
        let entity = Entity::new(self.name(), EntityKind::Consumer, self.phase());
        match self.label(base_url_label) {
            Some(base_url) => entity.with_base_url(base_url),
            None => entity,
        }
    }

    pub fn to_other(&self) -> Entity {
        Entity::new(self.name(), EntityKind::Other, self.phase())
    }
}
