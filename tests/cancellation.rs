//! Client cancellation: a client hanging up mid-request is recorded as a
//! cancellation and never counts against the backend.
//!
//! Lives in its own test binary because it installs the global metrics
//! recorder.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use passive_lb::observability::metrics;

mod common;

/// Scrape the exporter until `needle` shows up or we give up.
async fn scrape_until(client: &reqwest::Client, url: &str, needle: &str) -> String {
    let mut last = String::new();
    for _ in 0..40 {
        if let Ok(res) = client.get(url).send().await {
            last = res.text().await.unwrap_or_default();
            if last.contains(needle) {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    last
}

#[tokio::test]
async fn test_client_cancellation_keeps_backend() {
    let metrics_addr = common::unused_addr();
    metrics::init_metrics(metrics_addr);

    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let addr = common::start_programmable_backend(move |_| {
        let first = seen.fetch_add(1, Ordering::SeqCst) == 0;
        async move {
            if first {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            (200, "ok".to_string())
        }
    })
    .await;

    let lb = common::start_lb().await;
    let client = common::client();
    common::register(&client, &lb, &format!("http://{addr}")).await;

    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .no_proxy()
        .build()
        .unwrap();
    let res = impatient.get(common::data_url(&lb, "/slow")).send().await;
    assert!(res.is_err(), "client should give up first");
    // The request was in flight at the backend when the client left.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let rendered = scrape_until(
        &client,
        &format!("http://{metrics_addr}/metrics"),
        r#"lb_dispatch_failures_total{kind="cancelled"} 1"#,
    )
    .await;
    assert!(
        rendered.contains(r#"lb_dispatch_failures_total{kind="cancelled"} 1"#),
        "{rendered}"
    );
    assert!(!rendered.contains(r#"kind="unreachable""#), "{rendered}");

    assert_eq!(lb.pool().len(), 1);
    assert!(!lb.pool().all_backends()[0].is_dead());
    assert_eq!(common::get(&client, &lb, "/").await, (200, "ok".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    lb.shutdown().await.unwrap();
}
