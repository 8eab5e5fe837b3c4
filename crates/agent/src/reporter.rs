//! Status delivery to Xymon.
//!
//! [`XymonReporter`] speaks the Xymon client protocol: one TCP
//! connection per message, the message is written in full and the write
//! half is closed, which tells `xymond` the message is complete.
//! [`DryRunReporter`] renders the same message to stdout, or to any
//! other writer it is given.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use solrmon_core::types::Timestamp;
use solrmon_core::verdict::Verdict;

use crate::config::XymonConfig;

/// Port `xymond` listens on.
pub const DEFAULT_XYMON_PORT: u16 = 1984;

/// Upper bound on connecting to Xymon and writing one message.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from report delivery.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to deliver report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers one status message to the monitoring dashboard.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn report(
        &self,
        host: &str,
        test: &str,
        color: Verdict,
        message: &str,
    ) -> Result<(), ReportError>;
}

/// Xymon files hosts under their name with dots turned into commas.
pub fn xymon_host(host: &str) -> String {
    host.replace('.', ",")
}

/// Render a Xymon `status` message.
///
/// ```text
/// status[+LIFETIME] HOST.TEST COLOR DATE
/// MESSAGE
/// ```
pub fn status_message(
    host: &str,
    test: &str,
    color: Verdict,
    message: &str,
    lifetime: Option<&str>,
    now: Timestamp,
) -> String {
    let command = match lifetime {
        Some(lifetime) => format!("status+{lifetime}"),
        None => "status".to_string(),
    };
    format!(
        "{command} {}.{test} {color} {}\n{message}\n",
        xymon_host(host),
        now.format("%a %b %e %H:%M:%S UTC %Y"),
    )
}

// ---------------------------------------------------------------------------
// XymonReporter
// ---------------------------------------------------------------------------

/// Sends status messages to a Xymon server over TCP.
pub struct XymonReporter {
    server: String,
    port: u16,
    lifetime: Option<String>,
    timeout: Duration,
}

impl XymonReporter {
    pub fn new(server: String, port: u16) -> Self {
        Self {
            server,
            port,
            lifetime: None,
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn from_config(config: &XymonConfig) -> Self {
        Self::new(config.server.clone(), config.port).with_lifetime(config.lifetime.clone())
    }

    pub fn with_lifetime(mut self, lifetime: Option<String>) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send(&self, wire: &str) -> Result<(), std::io::Error> {
        let mut stream = TcpStream::connect((self.server.as_str(), self.port)).await?;
        stream.write_all(wire.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl Reporter for XymonReporter {
    async fn report(
        &self,
        host: &str,
        test: &str,
        color: Verdict,
        message: &str,
    ) -> Result<(), ReportError> {
        let wire = status_message(
            host,
            test,
            color,
            message,
            self.lifetime.as_deref(),
            Utc::now(),
        );

        tracing::debug!(
            server = %self.server,
            port = self.port,
            bytes = wire.len(),
            "Sending Xymon status",
        );

        tokio::time::timeout(self.timeout, self.send(&wire))
            .await
            .map_err(|_| ReportError::Timeout(self.timeout))??;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DryRunReporter
// ---------------------------------------------------------------------------

/// Writes the Xymon message to a local writer instead of sending it.
pub struct DryRunReporter<W = Stdout> {
    lifetime: Option<String>,
    out: Mutex<W>,
}

impl DryRunReporter {
    /// Print messages to stdout.
    pub fn new(lifetime: Option<String>) -> Self {
        Self::with_writer(tokio::io::stdout(), lifetime)
    }
}

impl<W> DryRunReporter<W> {
    pub fn with_writer(out: W, lifetime: Option<String>) -> Self {
        Self {
            lifetime,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W> Reporter for DryRunReporter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn report(
        &self,
        host: &str,
        test: &str,
        color: Verdict,
        message: &str,
    ) -> Result<(), ReportError> {
        let wire = status_message(
            host,
            test,
            color,
            message,
            self.lifetime.as_deref(),
            Utc::now(),
        );
        let mut out = self.out.lock().await;
        out.write_all(wire.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap()
    }

    #[test]
    fn host_dots_become_commas() {
        assert_eq!(xymon_host("solr01.prod.example.com"), "solr01,prod,example,com");
        assert_eq!(xymon_host("solr01"), "solr01");
    }

    #[test]
    fn status_message_layout() {
        let wire = status_message("solr01.example.com", "solr", Verdict::Yellow, "body", None, at());
        assert_eq!(
            wire,
            "status solr01,example,com.solr yellow Tue Mar  5 09:07:01 UTC 2024\nbody\n"
        );
    }

    #[test]
    fn lifetime_suffixes_the_command() {
        let wire = status_message("h", "solr", Verdict::Red, "x", Some("30m"), at());
        assert!(wire.starts_with("status+30m h.solr red "));
    }

    #[test]
    fn timeout_display() {
        let err = ReportError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Report delivery timed out after 10s");
    }

    #[test]
    fn sub_second_timeout_keeps_its_unit() {
        let err = ReportError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "Report delivery timed out after 500ms");
    }

    /// Split a rendered message into its header without the date, and its body.
    fn without_date(wire: &str) -> (Vec<String>, String) {
        let (header, body) = wire.split_once('\n').unwrap();
        let fields = header.split_whitespace().take(3).map(str::to_string).collect();
        (fields, body.to_string())
    }

    #[tokio::test]
    async fn dry_run_writes_the_rendered_message() {
        let reporter = DryRunReporter::with_writer(Vec::new(), Some("30m".into()));
        reporter
            .report("solr01.example.com", "solr", Verdict::Red, "Core: core_1\n")
            .await
            .unwrap();

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        let expected = status_message(
            "solr01.example.com",
            "solr",
            Verdict::Red,
            "Core: core_1\n",
            Some("30m"),
            at(),
        );
        assert_eq!(without_date(&written), without_date(&expected));
        assert_eq!(written.lines().count(), expected.lines().count());
    }

    #[tokio::test]
    async fn dry_run_appends_each_report() {
        let reporter = DryRunReporter::with_writer(Vec::new(), None);
        reporter.report("h", "solr", Verdict::Green, "one").await.unwrap();
        reporter.report("h", "solr", Verdict::Yellow, "two").await.unwrap();

        let written = String::from_utf8(reporter.into_inner()).unwrap();
        let headers: Vec<_> = written.lines().filter(|l| l.starts_with("status ")).collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("status h.solr green "));
        assert!(headers[1].starts_with("status h.solr yellow "));
    }
}
