use std::sync::Arc;

use clap::Parser;
use settle_bench_cluster::prelude::*;

/// Measure how long a Helm release takes to roll out a new base URL to its consumers.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
struct Cli {
    /// Namespace the release is installed into
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Name of the release
    #[arg(long, default_value = "sse-relations-benchmark")]
    release: String,

    /// Chart reference passed to `helm install`
    #[arg(long, default_value = "sse-relations")]
    chart: String,

    /// Chart value that sets the base URL
    #[arg(long, default_value = "sseServerBaseUrl")]
    base_url_key: String,

    /// Chart value that sets the number of consumers
    #[arg(long, default_value = "numConsumers")]
    count_key: String,

    #[command(flatten)]
    sweep: SweepCli,
}

fn main() -> anyhow::Result<()> {
    let cli = init::<Cli>();

    let chart = HelmChart {
        release: cli.release,
        chart: cli.chart,
        base_url_key: cli.base_url_key,
        count_key: cli.count_key,
    };
    let mut backend = HelmBackend::new(
        Arc::new(SystemCommandRunner),
        helm_path()?,
        kubectl_path()?,
        cli.namespace,
        chart,
    );

    run(
        SweepDefinitionBuilder::new(env!("CARGO_PKG_NAME"), cli.sweep),
        &mut backend,
    )?;

    Ok(())
}
