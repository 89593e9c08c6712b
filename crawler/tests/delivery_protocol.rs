use common::index::PageIndex;
use common::PagePayload;
use crawler::client::ReplicaStub;
use crawler::delivery::deliver_page;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_replica() -> (String, replica::SharedIndex) {
    let index: replica::SharedIndex = Arc::new(RwLock::new(PageIndex::new()));
    let app = replica::build_app(index.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), index)
}

async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn sample_page() -> PagePayload {
    PagePayload {
        url: "http://site.test/p".to_string(),
        title: "Sample".to_string(),
        text: "cats are great".to_string(),
        outgoing_links: vec!["http://site.test/q".to_string()],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delivers_to_every_reachable_replica() {
    let (url1, idx1) = spawn_replica().await;
    let (url2, idx2) = spawn_replica().await;
    let mut replicas = vec![
        ReplicaStub::connect("r1", &url1, Duration::from_secs(2)),
        ReplicaStub::connect("r2", &url2, Duration::from_secs(2)),
    ];

    let report = deliver_page(&mut replicas, &sample_page(), Duration::from_millis(50)).await;
    assert_eq!(report.accepted, vec!["r1", "r2"]);
    assert!(report.missed.is_empty());

    for idx in [idx1, idx2] {
        let hits = idx.read().search(&["cats".to_string()], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "http://site.test/p");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn partial_replication_is_accepted_after_one_extra_attempt() {
    let dead = dead_endpoint().await;
    let (live, idx) = spawn_replica().await;
    let mut replicas = vec![
        ReplicaStub::connect("dead", &dead, Duration::from_secs(2)),
        ReplicaStub::connect("live", &live, Duration::from_secs(2)),
    ];

    let report = deliver_page(&mut replicas, &sample_page(), Duration::from_millis(50)).await;
    assert_eq!(report.accepted, vec!["live"]);
    assert_eq!(report.missed, vec!["dead"]);
    assert!(report.any_accepted());

    let hits = idx.read().search(&["cats".to_string()], 1);
    assert_eq!(hits.len(), 1);
}
