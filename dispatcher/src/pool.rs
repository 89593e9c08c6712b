use anyhow::{anyhow, Context, Result};
use common::{IndexSize, ReplicaSpec, SearchHit};
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Location-transparent client stub for one replica: an address plus a
/// reconnect routine. Reconnecting rebuilds the HTTP client for the slot.
#[derive(Clone)]
struct ReplicaStub {
    name: String,
    base_url: String,
    client: Client,
}

impl ReplicaStub {
    fn connect(name: &str, base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            client,
        }
    }

    async fn search(&self, q: &str, page: usize) -> Result<Vec<SearchHit>> {
        let resp = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", q), ("page", &page.to_string())])
            .send()
            .await?
            .error_for_status()?;
        resp.json().await.context("decode search response")
    }

    async fn incoming_links(&self, url: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(format!("{}/links", self.base_url))
            .query(&[("url", url)])
            .send()
            .await?
            .error_for_status()?;
        resp.json().await.context("decode links response")
    }

    async fn size(&self) -> Result<usize> {
        let resp = self
            .client
            .get(format!("{}/size", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        let size: IndexSize = resp.json().await.context("decode size response")?;
        Ok(size.pages)
    }
}

/// A successful routed query, with enough context for stats tracking.
pub struct Served {
    pub hits: Vec<SearchHit>,
    pub replica: String,
    pub elapsed: Duration,
}

/// The replica set plus the round-robin pointer. Stubs are swapped in place
/// on reconnect; the pointer only ever advances past a replica that actually
/// served a request.
pub struct ReplicaPool {
    stubs: Mutex<Vec<ReplicaStub>>,
    next: Mutex<usize>,
    max_retries: usize,
    timeout: Duration,
}

impl ReplicaPool {
    pub fn new(specs: &[ReplicaSpec], max_retries: usize, timeout: Duration) -> Self {
        let stubs = specs
            .iter()
            .map(|s| ReplicaStub::connect(&s.name, &s.base_url, timeout))
            .collect();
        Self {
            stubs: Mutex::new(stubs),
            next: Mutex::new(0),
            max_retries: max_retries.max(1),
            timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.stubs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.lock().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.stubs.lock().iter().map(|s| s.name.clone()).collect()
    }

    fn stub(&self, i: usize) -> ReplicaStub {
        self.stubs.lock()[i].clone()
    }

    fn reconnect(&self, i: usize) -> ReplicaStub {
        let mut stubs = self.stubs.lock();
        let fresh = ReplicaStub::connect(&stubs[i].name, &stubs[i].base_url, self.timeout);
        stubs[i] = fresh.clone();
        tracing::info!(replica = %fresh.name, "replica stub reconnected");
        fresh
    }

    /// Route a search: start at the round-robin pointer, try each replica in
    /// turn up to `replica_count * max_retries` total attempts. A failed call
    /// gets one reconnect-and-retry against the same replica before moving
    /// on. On success the pointer advances past the serving replica so the
    /// next fresh query starts elsewhere.
    pub async fn search(&self, q: &str, page: usize) -> Result<Served> {
        let n = self.len();
        if n == 0 {
            return Err(anyhow!("no replica available"));
        }
        let start_index = *self.next.lock();

        for attempt in 0..n * self.max_retries {
            let i = (start_index + attempt) % n;
            let stub = self.stub(i);
            let started = Instant::now();
            match stub.search(q, page).await {
                Ok(hits) => {
                    *self.next.lock() = (i + 1) % n;
                    return Ok(Served {
                        hits,
                        replica: stub.name,
                        elapsed: started.elapsed(),
                    });
                }
                Err(err) => {
                    tracing::warn!(replica = %stub.name, %err, "search failed, reconnecting");
                    let stub = self.reconnect(i);
                    let started = Instant::now();
                    if let Ok(hits) = stub.search(q, page).await {
                        *self.next.lock() = (i + 1) % n;
                        return Ok(Served {
                            hits,
                            replica: stub.name,
                            elapsed: started.elapsed(),
                        });
                    }
                }
            }
        }
        Err(anyhow!("no replica available"))
    }

    /// Link lookups always scan from replica 0, not the round-robin pointer,
    /// and are not stats-tracked.
    pub async fn incoming_links(&self, url: &str) -> Result<Vec<String>> {
        let n = self.len();
        if n == 0 {
            return Err(anyhow!("no replica available"));
        }

        for attempt in 0..n * self.max_retries {
            let i = attempt % n;
            let stub = self.stub(i);
            match stub.incoming_links(url).await {
                Ok(links) => return Ok(links),
                Err(err) => {
                    tracing::warn!(replica = %stub.name, %err, "links lookup failed, reconnecting");
                    let stub = self.reconnect(i);
                    if let Ok(links) = stub.incoming_links(url).await {
                        return Ok(links);
                    }
                }
            }
        }
        Err(anyhow!("no replica available"))
    }

    /// Live page counts per replica. A replica that fails the call is simply
    /// left out of the map.
    pub async fn sizes(&self) -> HashMap<String, usize> {
        let stubs: Vec<ReplicaStub> = self.stubs.lock().clone();
        let mut sizes = HashMap::new();
        for stub in stubs {
            match stub.size().await {
                Ok(pages) => {
                    sizes.insert(stub.name, pages);
                }
                Err(err) => {
                    tracing::warn!(replica = %stub.name, %err, "size probe failed, omitting from status")
                }
            }
        }
        sizes
    }
}
