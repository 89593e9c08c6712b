use anyhow::{anyhow, Result};
use common::StatsSnapshot;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-observer queue depth. An observer that stops polling long enough to
/// fill its queue is treated as gone and deregistered on the next push.
const QUEUE_DEPTH: usize = 8;

struct Observer {
    tx: mpsc::Sender<StatsSnapshot>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<StatsSnapshot>>>,
}

/// Registered stats observers, keyed by client id. Observers drive delivery
/// by long-polling their queue; the dispatcher pushes into the queues when
/// the Top-10 changes. The set self-heals: any observer that cannot accept
/// a push is removed without disturbing the others.
#[derive(Default)]
pub struct ObserverHub {
    observers: Mutex<HashMap<Uuid, Observer>>,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer and queue its immediate full snapshot. If the
    /// initial push cannot be queued the registration is rolled back and the
    /// error surfaces to the caller.
    pub fn register(&self, initial: StatsSnapshot) -> Result<Uuid> {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tx.try_send(initial)
            .map_err(|_| anyhow!("initial stats push failed"))?;
        let id = Uuid::new_v4();
        self.observers.lock().insert(
            id,
            Observer {
                tx,
                rx: Arc::new(tokio::sync::Mutex::new(rx)),
            },
        );
        tracing::info!(client = %id, total = self.observers.lock().len(), "observer registered");
        Ok(id)
    }

    /// Unconditional removal. Dropping the sender wakes any in-flight poll.
    pub fn unregister(&self, id: &Uuid) {
        if self.observers.lock().remove(id).is_some() {
            tracing::info!(client = %id, "observer unregistered");
        }
    }

    /// The receiving end of an observer's queue, for the long-poll handler.
    pub fn receiver(&self, id: &Uuid) -> Option<Arc<tokio::sync::Mutex<mpsc::Receiver<StatsSnapshot>>>> {
        self.observers.lock().get(id).map(|o| o.rx.clone())
    }

    /// Queue a snapshot for every observer. Failures remove the offending
    /// observer only; delivery continues to the rest and never propagates
    /// back to the query path that triggered the push.
    pub fn push(&self, snapshot: &StatsSnapshot) {
        let targets: Vec<(Uuid, mpsc::Sender<StatsSnapshot>)> = self
            .observers
            .lock()
            .iter()
            .map(|(id, o)| (*id, o.tx.clone()))
            .collect();

        let mut failed = Vec::new();
        for (id, tx) in targets {
            if tx.try_send(snapshot.clone()).is_err() {
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            let mut observers = self.observers.lock();
            for id in failed {
                observers.remove(&id);
                tracing::warn!(client = %id, "observer not accepting pushes, removed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot::default()
    }

    #[tokio::test]
    async fn register_queues_immediate_snapshot() {
        let hub = ObserverHub::new();
        let id = hub.register(snapshot()).unwrap();
        let rx = hub.receiver(&id).unwrap();
        let first = rx.lock().await.try_recv();
        assert!(first.is_ok());
    }

    #[tokio::test]
    async fn push_failure_removes_only_that_observer() {
        let hub = ObserverHub::new();
        let stuck = hub.register(snapshot()).unwrap();
        let healthy = hub.register(snapshot()).unwrap();

        // Drain the healthy observer; let the stuck one fill up.
        let rx = hub.receiver(&healthy).unwrap();
        rx.lock().await.try_recv().unwrap();
        for _ in 0..QUEUE_DEPTH {
            hub.push(&snapshot());
        }

        assert!(hub.receiver(&stuck).is_none());
        assert!(hub.receiver(&healthy).is_some());
    }

    #[tokio::test]
    async fn unregister_is_unconditional() {
        let hub = ObserverHub::new();
        let id = hub.register(snapshot()).unwrap();
        hub.unregister(&id);
        assert!(hub.is_empty());
        hub.unregister(&id); // second removal is a no-op
    }
}
