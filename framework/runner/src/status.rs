/// What an entity in the cluster is, as far as the benchmark cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A workload that consumes from the base URL and is counted towards readiness.
    Consumer,
    /// An application listed by a model-based orchestrator, whether or not it still has units.
    Application,
    /// A unit managed by a model-based orchestrator.
    Unit,
    /// A machine allocated by a model-based orchestrator.
    Machine,
    /// Anything else. Only considered when checking whether the cluster has settled.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPhase {
    Pending,
    Running,
    /// Still being configured by its orchestrator.
    Converging,
    Terminating,
    Succeeded,
    Failed,
    Unknown,
}

impl EntityPhase {
    /// Map a Kubernetes pod phase.
    pub fn from_pod_phase(phase: &str) -> Self {
        match phase {
            "Pending" => EntityPhase::Pending,
            "Running" => EntityPhase::Running,
            "Succeeded" => EntityPhase::Succeeded,
            "Failed" => EntityPhase::Failed,
            _ => EntityPhase::Unknown,
        }
    }

    pub fn is_transitional(&self) -> bool {
        matches!(self, EntityPhase::Converging | EntityPhase::Terminating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub phase: EntityPhase,
    /// The base URL this entity was observed to use, if known.
    pub base_url: Option<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind, phase: EntityPhase) -> Self {
        Self {
            name: name.into(),
            kind,
            phase,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Snapshot of the cluster returned by [crate::prelude::Backend::query_status].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStatus {
    entities: Vec<Entity>,
}

impl ClusterStatus {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Number of running consumers configured with `base_url`.
    pub fn ready_consumers(&self, base_url: &str) -> usize {
        self.entities
            .iter()
            .filter(|e| e.kind == EntityKind::Consumer)
            .filter(|e| e.phase == EntityPhase::Running)
            .filter(|e| e.base_url.as_deref() == Some(base_url))
            .count()
    }

    /// Number of entities that are terminating or still converging.
    pub fn transitional(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.phase.is_transitional())
            .count()
    }

    pub fn is_settled(&self) -> bool {
        self.transitional() == 0
    }

    /// Number of entities that belong to the deployment.
    pub fn remaining(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.kind != EntityKind::Other)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl FromIterator<Entity> for ClusterStatus {
    fn from_iter<T: IntoIterator<Item = Entity>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumer(name: &str, phase: EntityPhase, base_url: &str) -> Entity {
        Entity::new(name, EntityKind::Consumer, phase).with_base_url(base_url)
    }

    #[test]
    fn counts_only_running_consumers_with_matching_base_url() {
        let status = ClusterStatus::from_iter([
            consumer("sse-consumer-0", EntityPhase::Running, "1endpoint.example.com"),
            consumer("sse-consumer-1", EntityPhase::Running, "endpoint.example.com"),
            consumer("sse-consumer-2", EntityPhase::Pending, "1endpoint.example.com"),
            Entity::new("other", EntityKind::Other, EntityPhase::Running)
                .with_base_url("1endpoint.example.com"),
            Entity::new("sse-consumer-3", EntityKind::Consumer, EntityPhase::Running),
        ]);

        assert_eq!(1, status.ready_consumers("1endpoint.example.com"));
        assert_eq!(1, status.ready_consumers("endpoint.example.com"));
    }

    #[test]
    fn settled_when_nothing_is_transitional() {
        let mut status = ClusterStatus::from_iter([
            consumer("a", EntityPhase::Running, "u"),
            consumer("b", EntityPhase::Pending, "u"),
        ]);
        assert!(status.is_settled());

        status.push(Entity::new(
            "old",
            EntityKind::Other,
            EntityPhase::Terminating,
        ));
        assert_eq!(1, status.transitional());
        assert!(!status.is_settled());
    }

    #[test]
    fn converging_units_are_not_settled() {
        let status = ClusterStatus::from_iter([Entity::new(
            "consumer0/0",
            EntityKind::Unit,
            EntityPhase::Converging,
        )]);

        assert!(!status.is_settled());
    }

    #[test]
    fn empty_ignores_unrelated_entities() {
        let status = ClusterStatus::from_iter([Entity::new(
            "coredns",
            EntityKind::Other,
            EntityPhase::Running,
        )]);
        assert!(status.is_empty());

        let status = ClusterStatus::from_iter([Entity::new(
            "0",
            EntityKind::Machine,
            EntityPhase::Running,
        )]);
        assert_eq!(1, status.remaining());
        assert!(!status.is_empty());
    }

    #[test]
    fn application_without_units_is_not_empty() {
        let status = ClusterStatus::from_iter([Entity::new(
            "consumer0",
            EntityKind::Application,
            EntityPhase::Running,
        )]);

        assert!(status.is_settled());
        assert!(!status.is_empty());
    }

    #[test]
    fn maps_pod_phases() {
        assert_eq!(EntityPhase::Running, EntityPhase::from_pod_phase("Running"));
        assert_eq!(EntityPhase::Pending, EntityPhase::from_pod_phase("Pending"));
        assert_eq!(EntityPhase::Unknown, EntityPhase::from_pod_phase("Evicted"));
    }
}
