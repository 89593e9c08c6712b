use anyhow::Result;
use clap::Parser;
use common::ReplicaSpec;
use dispatcher::{build_app, DispatcherConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "dispatcher")]
#[command(about = "Query router, crawl frontier, and stats broadcaster")]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Replica endpoint as name=base_url; repeat for each replica
    #[arg(long = "replica", required = true)]
    replicas: Vec<ReplicaSpec>,
    /// Failover attempts per replica before giving up on a query
    #[arg(long, default_value_t = 3)]
    max_retries: usize,
    /// Declared frontier size limit (read but not enforced)
    #[arg(long, default_value_t = 100_000)]
    max_queue_size: usize,
    /// Per-call timeout towards replicas, seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Observer long-poll window, seconds
    #[arg(long, default_value_t = 25)]
    poll_window_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    for spec in &args.replicas {
        tracing::info!(name = %spec.name, url = %spec.base_url, "replica configured");
    }

    let app = build_app(DispatcherConfig {
        replicas: args.replicas,
        max_retries: args.max_retries,
        max_queue_size: args.max_queue_size,
        request_timeout: Duration::from_secs(args.timeout_secs),
        poll_window: Duration::from_secs(args.poll_window_secs),
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dispatcher listening");
    axum::serve(listener, app).await?;
    Ok(())
}
