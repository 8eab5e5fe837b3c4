//! Wire-level tests for the Xymon reporter against a local TCP listener.

use std::time::Duration;

use assert_matches::assert_matches;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use solrmon_agent::config::XymonConfig;
use solrmon_agent::reporter::{ReportError, Reporter, XymonReporter};
use solrmon_core::verdict::Verdict;

/// Accept one connection and return everything the client wrote.
async fn capture_one(listener: TcpListener) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buf = String::new();
    socket.read_to_string(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn sends_status_message_and_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(capture_one(listener));

    let reporter = XymonReporter::new("127.0.0.1".into(), port);
    reporter
        .report("solr01.example.com", "solr", Verdict::Yellow, "Core: core_1\n")
        .await
        .unwrap();

    let received = server.await.unwrap();
    let (header, body) = received.split_once('\n').unwrap();
    assert!(header.starts_with("status solr01,example,com.solr yellow "));
    assert_eq!(body, "Core: core_1\n\n");
}

#[tokio::test]
async fn lifetime_from_config_is_sent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(capture_one(listener));

    let reporter = XymonReporter::from_config(&XymonConfig {
        server: "127.0.0.1".into(),
        port,
        lifetime: Some("30m".into()),
    });
    reporter
        .report("solr01", "solr", Verdict::Red, "down")
        .await
        .unwrap();

    assert!(server.await.unwrap().starts_with("status+30m solr01.solr red "));
}

#[tokio::test]
async fn unreachable_server_is_an_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let reporter =
        XymonReporter::new("127.0.0.1".into(), port).with_timeout(Duration::from_secs(5));
    let result = reporter.report("solr01", "solr", Verdict::Green, "ok").await;

    assert_matches!(result, Err(ReportError::Io(_)));
}
