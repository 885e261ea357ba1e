use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use settle_bench_runner::prelude::SettleBenchResult;

/// Environment variable to override the path to the `kubectl` binary.
pub const SETTLE_BENCH_KUBECTL_PATH_ENV: &str = "SETTLE_BENCH_KUBECTL_PATH";
/// Environment variable to override the path to the `helm` binary.
pub const SETTLE_BENCH_HELM_PATH_ENV: &str = "SETTLE_BENCH_HELM_PATH";
/// Environment variable to override the path to the `juju` binary.
pub const SETTLE_BENCH_JUJU_PATH_ENV: &str = "SETTLE_BENCH_JUJU_PATH";

/// Get the path to the `kubectl` binary.
///
/// Uses [`SETTLE_BENCH_KUBECTL_PATH_ENV`] if set, otherwise looks for `kubectl` in the user's `PATH`.
pub fn kubectl_path() -> SettleBenchResult<PathBuf> {
    tool_path(SETTLE_BENCH_KUBECTL_PATH_ENV, "kubectl")
}

/// Get the path to the `helm` binary.
///
/// Uses [`SETTLE_BENCH_HELM_PATH_ENV`] if set, otherwise looks for `helm` in the user's `PATH`.
pub fn helm_path() -> SettleBenchResult<PathBuf> {
    tool_path(SETTLE_BENCH_HELM_PATH_ENV, "helm")
}

/// Get the path to the `juju` binary.
///
/// Uses [`SETTLE_BENCH_JUJU_PATH_ENV`] if set, otherwise looks for `juju` in the user's `PATH`.
pub fn juju_path() -> SettleBenchResult<PathBuf> {
    tool_path(SETTLE_BENCH_JUJU_PATH_ENV, "juju")
}

fn tool_path(env_name: &str, binary: &str) -> SettleBenchResult<PathBuf> {
    resolve_tool_path(env_name, env::var(env_name).ok().as_deref(), binary)
}

fn resolve_tool_path(
    env_name: &str,
    env_value: Option<&str>,
    binary: &str,
) -> SettleBenchResult<PathBuf> {
    match env_value {
        Some("") => {
            bail!("'{env_name}' set to empty string");
        }
        Some(value) if value == binary => which_tool(env_name, binary),
        None => which_tool(env_name, binary),
        Some(path) => {
            let tool_path = PathBuf::from(path);
            if !tool_path.exists() {
                bail!(
                    "Path to {binary} overwritten with '{env_name}={path}' but that path doesn't exist",
                    path = tool_path.display()
                );
            }
            Ok(tool_path)
        }
    }
}

fn which_tool(env_name: &str, binary: &str) -> SettleBenchResult<PathBuf> {
    log::debug!("'{env_name}' is not a path so looking in user's 'PATH'");
    which::which(binary).with_context(|| {
        format!("{binary} not found in PATH. Please install it or set '{env_name}' to the correct path.")
    })
}
