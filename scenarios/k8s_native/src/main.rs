use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use settle_bench_cluster::prelude::*;

/// Measure how long plain Kubernetes deployments take to pick up a new base URL.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Namespace the consumers are deployed into
    #[arg(long, default_value = "k8s-native-test")]
    namespace: String,

    /// Deployment template to use instead of the bundled one: a `ConfigMap` followed by the
    /// consumer `Deployment`
    #[arg(long)]
    template: Option<PathBuf>,

    #[command(flatten)]
    sweep: SweepCli,
}

fn main() -> anyhow::Result<()> {
    let cli = init::<Cli>();

    let yaml = match &cli.template {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?,
        None => include_str!("../deployment.yaml").to_string(),
    };
    let template = ManifestTemplate::parse(&yaml, ManifestFlavour::K8sNative)?;

    let kubectl = Kubectl::new(Arc::new(SystemCommandRunner), kubectl_path()?, cli.namespace);
    let mut backend = ManifestBackend::new(kubectl, template);

    run(
        SweepDefinitionBuilder::new(env!("CARGO_PKG_NAME"), cli.sweep),
        &mut backend,
    )?;

    Ok(())
}
