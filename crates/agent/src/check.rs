//! One Solr health check run: fetch, evaluate, report.
//!
//! [`SolrCheck`] owns everything a run needs, including the tracing span
//! it is handed at construction and attaches its log lines to. A run reports exactly once: either the
//! aggregated verdict over all monitored cores or, if the status document
//! could not be fetched, a red report carrying the error.

use chrono::Utc;
use tracing::Instrument;

use solrmon_core::evaluate::evaluate;
use solrmon_core::report::Report;
use solrmon_core::thresholds::ThresholdSet;

use crate::config::AgentConfig;
use crate::fetch::{FetchError, SolrAdminClient};
use crate::reporter::{ReportError, Reporter};

/// Version stamped at the bottom of every report.
const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a completed run delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub report: Report,
    /// `true` when the status document could not be fetched and the
    /// delivered report is the red fetch-failure report.
    pub fetch_failed: bool,
}

/// Health check for one Solr instance.
pub struct SolrCheck {
    client: SolrAdminClient,
    reporter: Box<dyn Reporter>,
    thresholds: ThresholdSet,
    hostname: String,
    service: String,
    span: tracing::Span,
}

/// Span a check logs under when the caller has no span of its own.
pub fn check_span(hostname: &str, service: &str) -> tracing::Span {
    tracing::info_span!("solr_check", host = %hostname, service = %service)
}

impl SolrCheck {
    /// `span` is entered for every log line the check emits.
    pub fn new(
        client: SolrAdminClient,
        reporter: Box<dyn Reporter>,
        thresholds: ThresholdSet,
        hostname: String,
        service: String,
        span: tracing::Span,
    ) -> Self {
        Self {
            client,
            reporter,
            thresholds,
            hostname,
            service,
            span,
        }
    }

    /// Build a check from a loaded configuration.
    pub fn from_config(
        config: &AgentConfig,
        reporter: Box<dyn Reporter>,
    ) -> Result<Self, FetchError> {
        let client = SolrAdminClient::new(config.admin_url.clone(), config.request_timeout)?;
        Ok(Self::new(
            client,
            reporter,
            config.thresholds.clone(),
            config.hostname.clone(),
            config.service.clone(),
            check_span(&config.hostname, &config.service),
        ))
    }

    /// Fetch the status document and evaluate every monitored core.
    ///
    /// Nothing is reported; see [`SolrCheck::run`].
    pub async fn evaluate(&self) -> Result<Report, FetchError> {
        self.evaluate_inner().instrument(self.span.clone()).await
    }

    /// Evaluate and deliver exactly one report.
    ///
    /// A fetch failure is not an error here: it becomes a red report and
    /// is flagged in the returned [`RunOutcome`]. Only delivery failures
    /// are returned as errors.
    pub async fn run(&self) -> Result<RunOutcome, ReportError> {
        self.run_inner().instrument(self.span.clone()).await
    }

    async fn evaluate_inner(&self) -> Result<Report, FetchError> {
        let doc = self.client.fetch_status().await?;
        let evaluation = evaluate(&doc, &self.thresholds, Utc::now());

        for core in &evaluation.cores {
            tracing::debug!(core = %core.name, verdict = %core.verdict, "Core evaluated");
        }

        Ok(Report::from_evaluation(&evaluation, AGENT_VERSION))
    }

    async fn run_inner(&self) -> Result<RunOutcome, ReportError> {
        tracing::info!(url = %self.client.admin_url(), "Checking Solr status");

        let (report, fetch_failed) = match self.evaluate_inner().await {
            Ok(report) => (report, false),
            Err(e) => {
                let description = describe_error(&e);
                tracing::error!(error = %description, "Error fetching data from Solr");
                (Report::fetch_failure(&description), true)
            }
        };

        tracing::debug!(message = %report.message, "Report body");

        self.reporter
            .report(&self.hostname, &self.service, report.color, &report.message)
            .await?;

        tracing::info!(color = %report.color, fetch_failed, "Status reported");

        Ok(RunOutcome {
            report,
            fetch_failed,
        })
    }
}

/// Render an error together with its chain of sources.
///
/// `reqwest` keeps the useful part (e.g. "Connection refused") in the
/// source chain rather than in the top-level message.
pub fn describe_error(err: &dyn std::error::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !description.contains(&cause_text) {
            description.push_str(": ");
            description.push_str(&cause_text);
        }
        source = cause.source();
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn describe_error_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert_eq!(describe_error(&err), "outer: Connection refused");
    }

    #[test]
    fn describe_error_skips_repeated_text() {
        let err = FetchError::Decode(serde_json::from_str::<u8>("x").unwrap_err());
        let description = describe_error(&err);
        // The decode error is both the Display payload and the source.
        assert_eq!(description.matches("expected value").count(), 1);
    }
}
