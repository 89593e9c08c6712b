use anyhow::Result;
use clap::Parser;
use common::{PagePayload, ReplicaSpec};
use crawler::client::{DispatcherStub, ReplicaStub};
use crawler::delivery::deliver_page;
use crawler::fetch::{fetch_client, fetch_page};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "crawler")]
#[command(about = "Pulls urls from the dispatcher frontier and delivers pages to the replicas")]
struct Args {
    /// Dispatcher base url
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    dispatcher: String,
    /// Replica endpoint as name=base_url; repeat for each replica
    #[arg(long = "replica", required = true)]
    replicas: Vec<ReplicaSpec>,
    /// Idle backoff between frontier polls, milliseconds
    #[arg(long, default_value_t = 500)]
    backoff_ms: u64,
    /// Pause between delivery rounds while every replica is down, milliseconds
    #[arg(long, default_value_t = 2000)]
    delivery_pause_ms: u64,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string for page fetches
    #[arg(long, default_value = "search-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let timeout = Duration::from_secs(args.timeout_secs);
    let backoff = Duration::from_millis(args.backoff_ms);
    let delivery_pause = Duration::from_millis(args.delivery_pause_ms);

    let mut dispatcher = DispatcherStub::connect(&args.dispatcher, timeout);
    let mut replicas: Vec<ReplicaStub> = args
        .replicas
        .iter()
        .map(|s| ReplicaStub::connect(&s.name, &s.base_url, timeout))
        .collect();
    let fetcher = fetch_client(&args.user_agent, timeout)?;
    tracing::info!(dispatcher = %args.dispatcher, replicas = replicas.len(), "crawler started");

    loop {
        let url = match dispatcher.take_next().await {
            Ok(Some(url)) => url,
            Ok(None) => {
                sleep(backoff).await;
                continue;
            }
            Err(err) => {
                tracing::warn!(%err, "frontier poll failed, refreshing dispatcher stub");
                dispatcher.refresh();
                sleep(backoff).await;
                continue;
            }
        };

        let harvested = match fetch_page(&fetcher, &url).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(%url, %err, "fetch failed, dropping url");
                continue;
            }
        };
        let page = PagePayload {
            url: url.clone(),
            title: harvested.title,
            text: harvested.text,
            outgoing_links: harvested.outgoing_links,
        };

        let report = deliver_page(&mut replicas, &page, delivery_pause).await;
        tracing::info!(
            %url,
            accepted = report.accepted.len(),
            missed = report.missed.len(),
            outgoing = page.outgoing_links.len(),
            "page processed"
        );

        // Harvested links feed the frontier only when the page actually
        // landed somewhere.
        if report.any_accepted() {
            for link in &page.outgoing_links {
                if let Err(err) = dispatcher.put_new_url(link).await {
                    tracing::warn!(%link, %err, "failed to queue harvested link, refreshing dispatcher stub");
                    dispatcher.refresh();
                }
            }
        }
    }
}
