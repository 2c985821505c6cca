use clap::Parser;
use eyre::{Result, WrapErr};
use prometheus::Registry;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use unit_exporter::config::{parse_const_labels, parse_duration};
use unit_exporter::{register_build_info, MetricsServer, StatusClient, UnitCollector};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "unit-exporter: publish NGINX Unit status counters as Prometheus metrics"
)]
pub struct ExporterArgs {
    #[arg(
        long = "web.listen-address",
        env = "LISTEN_ADDRESS",
        default_value = "0.0.0.0:9113",
        help = "Address to listen on for the metrics endpoint"
    )]
    listen_address: String,

    #[arg(
        long = "web.telemetry-path",
        env = "TELEMETRY_PATH",
        default_value = "/metrics",
        help = "Path under which to expose metrics"
    )]
    telemetry_path: String,

    #[arg(
        long = "unit.scrape-uri",
        env = "SCRAPE_URI",
        default_value = "http://127.0.0.1:8000/status",
        help = "URI of the NGINX Unit status endpoint"
    )]
    scrape_uri: String,

    #[arg(
        long = "unit.timeout",
        env = "TIMEOUT",
        default_value = "5s",
        value_parser = parse_duration,
        help = "Timeout for a single status request (e.g. 500ms, 5s)"
    )]
    timeout: Duration,

    #[arg(
        long = "prometheus.namespace",
        env = "NAMESPACE",
        default_value = "nginxunit",
        help = "Prefix for all exported metric names"
    )]
    namespace: String,

    #[arg(
        long = "prometheus.const-labels",
        env = "CONST_LABELS",
        default_value = "",
        value_parser = parse_const_labels,
        help = "Labels attached to every metric, in key1=value1,key2=value2 form"
    )]
    const_labels: HashMap<String, String>,

    #[arg(
        long,
        env = "LOG_LEVEL",
        default_value = "info",
        help = "Log filter used when RUST_LOG is unset"
    )]
    log_level: String,

    #[arg(
        long,
        default_value_t = 4,
        help = "Number of threads serving scrape requests"
    )]
    http_workers: usize,
}

fn main() -> Result<()> {
    let args = ExporterArgs::parse();

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting unit-exporter");

    let client = StatusClient::with_timeout(&args.scrape_uri, args.timeout)
        .wrap_err("Could not create the NGINX Unit client")?;
    let collector = UnitCollector::new(client, &args.namespace, &args.const_labels)
        .wrap_err("Invalid metric namespace or const labels")?;

    let registry = Registry::new();
    registry.register(Box::new(collector))?;
    register_build_info(&registry, &args.namespace)?;

    let server = MetricsServer::bind(&args.listen_address, &args.telemetry_path, registry)?;
    let workers = server.spawn(args.http_workers)?;

    for worker in workers {
        if worker.join().is_err() {
            eyre::bail!("HTTP worker thread panicked");
        }
    }

    Ok(())
}
