use anyhow::Result;
use clap::Parser;
use common::snapshot;
use parking_lot::RwLock;
use replica::{build_app, SharedIndex};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "replica")]
#[command(about = "Index replica: ingest, search, link lookup, snapshot persistence")]
struct Args {
    /// Replica name (used in logs; the dispatcher names replicas on its side)
    #[arg(long, default_value = "replica1")]
    name: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8081)]
    port: u16,
    /// Snapshot file path
    #[arg(long, default_value = "./replica.snapshot")]
    data: PathBuf,
}

/// Saves the snapshot when dropped, covering every exit path out of `main`:
/// normal return, shutdown signal, or panic unwind. This is the replica's
/// only durability checkpoint.
struct SnapshotGuard {
    index: SharedIndex,
    path: PathBuf,
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        let index = self.index.write();
        match snapshot::save(&index, &self.path) {
            Ok(()) => tracing::info!(pages = index.len(), path = %self.path.display(), "snapshot saved on shutdown"),
            Err(err) => tracing::error!(%err, path = %self.path.display(), "snapshot save failed on shutdown"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index: SharedIndex = Arc::new(RwLock::new(snapshot::load_or_default(&args.data)));
    tracing::info!(name = %args.name, pages = index.read().len(), "index loaded");
    let _guard = SnapshotGuard {
        index: index.clone(),
        path: args.data.clone(),
    };

    let app = build_app(index);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, name = %args.name, "replica listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
