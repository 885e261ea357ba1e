use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use settle_bench_cluster::prelude::*;

/// Measure how long Juju takes to relay a new base URL from the endpoint charm to its consumers.
///
/// Every consumer count gets its own model named `<model-prefix>-<count>`.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Prefix of the model names
    #[arg(long, default_value = "k8s-test4")]
    model_prefix: String,

    /// Cloud the models are added to
    #[arg(long, default_value = "k8s-relations-k8s")]
    cloud: String,

    /// Charm deployed for every consumer
    #[arg(long, default_value = "cs:~tengu-team/sse-consumer-2")]
    consumer_charm: String,

    /// Bundle to use instead of the bundled one. It must contain the `endpoint` application.
    #[arg(long)]
    bundle: Option<PathBuf>,

    #[command(flatten)]
    sweep: SweepCli,
}

fn main() -> anyhow::Result<()> {
    let cli = init::<Cli>();

    let yaml = match &cli.bundle {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle {}", path.display()))?,
        None => include_str!("../bundle.yaml").to_string(),
    };
    let bundle = JujuBundle::parse(&yaml)?;

    let mut backend = JujuBackend::new(
        Arc::new(SystemCommandRunner),
        juju_path()?,
        kubectl_path()?,
        cli.model_prefix,
        cli.cloud,
        bundle,
    )
    .with_consumer_charm(cli.consumer_charm);

    // More consumers than requested means units from an earlier run are still around.
    let builder = SweepDefinitionBuilder::new(env!("CARGO_PKG_NAME"), cli.sweep)
        .with_default_sweep(45, 50, 5)
        .with_ready_policy(ReadyPolicy::Exactly);

    run(builder, &mut backend)?;

    Ok(())
}
