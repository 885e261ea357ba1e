mod command;
mod helm;
mod juju;
mod kubectl;
mod manifest;
mod tool_path;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::command::{CommandRunner, Invocation, SystemCommandRunner};
    pub use crate::helm::{HelmBackend, HelmChart};
    pub use crate::juju::{JujuBackend, JujuBundle, JujuStatus};
    pub use crate::kubectl::{Kubectl, Pod};
    pub use crate::manifest::{ManifestBackend, ManifestError, ManifestFlavour, ManifestTemplate};
    pub use crate::tool_path::{
        helm_path, juju_path, kubectl_path, SETTLE_BENCH_HELM_PATH_ENV,
        SETTLE_BENCH_JUJU_PATH_ENV, SETTLE_BENCH_KUBECTL_PATH_ENV,
    };

    /// Re-export of the `settle_bench_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use settle_bench_runner::prelude::*;
}
