mod backend;
mod cli;
mod definition;
mod init;
mod progress;
mod recorder;
mod run;
mod status;
mod types;

pub mod prelude {
    pub use crate::backend::{Backend, DeploymentTarget};
    pub use crate::cli::SweepCli;
    pub use crate::definition::{ReadyPolicy, SweepDefinition, SweepDefinitionBuilder};
    pub use crate::init::init;
    pub use crate::recorder::MeasurementRecorder;
    pub use crate::run::{run, SweepOutcome};
    pub use crate::status::{ClusterStatus, Entity, EntityKind, EntityPhase};
    pub use crate::types::SettleBenchResult;

    pub use settle_bench_core::prelude::*;
    pub use settle_bench_instruments::{Measurement, PhaseClock};
}
