//! Shared fixtures: a fake Solr admin endpoint and a recording reporter.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{TimeDelta, Utc};

use solrmon_agent::reporter::{ReportError, Reporter};
use solrmon_core::verdict::Verdict;

pub const ADMIN_PATH: &str = "/solr/admin/cores";

/// One `report()` invocation as seen by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCall {
    pub host: String,
    pub test: String,
    pub color: Verdict,
    pub message: String,
}

/// Reporter that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    calls: Arc<Mutex<Vec<ReportCall>>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<ReportCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn report(
        &self,
        host: &str,
        test: &str,
        color: Verdict,
        message: &str,
    ) -> Result<(), ReportError> {
        self.calls.lock().unwrap().push(ReportCall {
            host: host.to_string(),
            test: test.to_string(),
            color,
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Reporter that always fails, for delivery-error paths.
pub struct FailingReporter;

#[async_trait]
impl Reporter for FailingReporter {
    async fn report(&self, _: &str, _: &str, _: Verdict, _: &str) -> Result<(), ReportError> {
        Err(ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "xymond went away",
        )))
    }
}

/// Serve `body` with `status` on an ephemeral port and return the admin URL.
pub async fn serve_status(status: StatusCode, body: String) -> String {
    let app = Router::new().route(
        ADMIN_PATH,
        get(move || {
            let body = body.clone();
            async move { (status, body) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}{ADMIN_PATH}?action=STATUS&wt=json")
}

/// Admin URL pointing at a port nothing listens on.
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{ADMIN_PATH}?action=STATUS&wt=json")
}

/// `lastModified` value `minutes` before now, in Solr's layout.
pub fn solr_timestamp(minutes_ago: i64) -> String {
    (Utc::now() - TimeDelta::minutes(minutes_ago))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// CoreAdmin STATUS body for `(name, numDocs, lastModified)` entries.
pub fn status_body(cores: &[(&str, u64, Option<String>)]) -> String {
    let status: serde_json::Map<String, serde_json::Value> = cores
        .iter()
        .map(|(name, docs, modified)| {
            (
                name.to_string(),
                serde_json::json!({
                    "name": name,
                    "index": { "numDocs": docs, "lastModified": modified },
                }),
            )
        })
        .collect();

    serde_json::json!({
        "responseHeader": { "status": 0, "QTime": 1 },
        "initFailures": {},
        "status": status,
    })
    .to_string()
}

/// In-memory log sink for a thread-local fmt subscriber.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Install a plain-text subscriber writing into this capture for the
    /// current thread until the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
