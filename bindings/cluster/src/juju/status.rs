use std::collections::BTreeMap;

use serde::Deserialize;
use settle_bench_runner::prelude::{Entity, EntityKind, EntityPhase};

/// Output of `juju status --format json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JujuStatus {
    #[serde(default)]
    applications: BTreeMap<String, ApplicationStatus>,
    #[serde(default)]
    machines: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApplicationStatus {
    #[serde(default)]
    units: BTreeMap<String, UnitStatus>,
}

#[derive(Debug, Clone, Deserialize)]
struct UnitStatus {
    #[serde(rename = "workload-status", default)]
    workload_status: StatusInfo,
    #[serde(rename = "juju-status", default)]
    juju_status: StatusInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StatusInfo {
    #[serde(default)]
    current: String,
    #[serde(default)]
    message: String,
}

impl UnitStatus {
    fn is_ready(&self) -> bool {
        self.workload_status.current.contains("active")
            && self.juju_status.current.contains("idle")
            && !self.workload_status.message.contains("waiting")
    }
}

impl JujuStatus {
    pub fn parse(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn application_names(&self) -> Vec<String> {
        self.applications.keys().cloned().collect()
    }

    pub fn machine_ids(&self) -> Vec<String> {
        self.machines.keys().cloned().collect()
    }

    /// Applications, units and machines of the model. Units that are not ready are converging,
    /// except for endpoint units which are always considered ready.
    pub fn entities(&self) -> Vec<Entity> {
        let applications = self
            .applications
            .keys()
            .map(|name| Entity::new(name, EntityKind::Application, EntityPhase::Running));

        let units = self
            .applications
            .values()
            .flat_map(|application| application.units.iter())
            .map(|(name, unit)| {
                let phase = if unit.is_ready() || name.contains("endpoint") {
                    EntityPhase::Running
                } else {
                    log::debug!(
                        "{name} is not ready: {}",
                        unit.workload_status.message
                    );
                    EntityPhase::Converging
                };
                Entity::new(name, EntityKind::Unit, phase)
            });

        let machines = self
            .machines
            .keys()
            .map(|id| Entity::new(format!("machine-{id}"), EntityKind::Machine, EntityPhase::Running));

        applications.chain(units).chain(machines).collect()
    }
}
