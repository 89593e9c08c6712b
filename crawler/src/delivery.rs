use crate::client::ReplicaStub;
use common::PagePayload;
use std::time::Duration;

/// Outcome of one redundant delivery: which replicas accepted the page.
#[derive(Debug)]
pub struct DeliveryReport {
    pub accepted: Vec<String>,
    pub missed: Vec<String>,
}

impl DeliveryReport {
    pub fn any_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }
}

/// Redundant-write protocol: keep attempting every replica (refreshing a
/// failed replica's stub each round) until at least one accepts the page,
/// then give each remaining replica exactly one best-effort attempt. A page
/// can end up on a single replica; that gap is logged and accepted.
pub async fn deliver_page(
    replicas: &mut [ReplicaStub],
    page: &PagePayload,
    retry_pause: Duration,
) -> DeliveryReport {
    let mut delivered = vec![false; replicas.len()];

    // Mandatory phase: loop until someone takes it.
    loop {
        for (i, stub) in replicas.iter_mut().enumerate() {
            if delivered[i] {
                continue;
            }
            match stub.send_page(page).await {
                Ok(()) => {
                    delivered[i] = true;
                    tracing::info!(replica = %stub.name, url = %page.url, "page delivered");
                }
                Err(err) => {
                    tracing::warn!(replica = %stub.name, url = %page.url, %err, "delivery failed, refreshing stub");
                    stub.refresh();
                }
            }
        }
        if delivered.iter().any(|d| *d) {
            break;
        }
        tracing::warn!(url = %page.url, "no replica accepted page, pausing before retry");
        tokio::time::sleep(retry_pause).await;
    }

    // Best-effort phase: one more shot for the stragglers, no retry.
    for (i, stub) in replicas.iter_mut().enumerate() {
        if delivered[i] {
            continue;
        }
        match stub.send_page(page).await {
            Ok(()) => {
                delivered[i] = true;
                tracing::info!(replica = %stub.name, url = %page.url, "page delivered on second pass");
            }
            Err(err) => {
                tracing::warn!(replica = %stub.name, url = %page.url, %err, "page left partially replicated");
            }
        }
    }

    let (accepted, missed) = replicas
        .iter()
        .zip(&delivered)
        .partition::<Vec<_>, _>(|(_, ok)| **ok);
    DeliveryReport {
        accepted: accepted.into_iter().map(|(s, _)| s.name.clone()).collect(),
        missed: missed.into_iter().map(|(s, _)| s.name.clone()).collect(),
    }
}
