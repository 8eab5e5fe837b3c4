//! Threshold evaluation engine for Solr cores.
//!
//! Pure logic -- no network access. The caller fetches the CoreAdmin
//! status document and supplies the current time, which keeps every
//! verdict reproducible in tests.

use std::collections::BTreeSet;

use crate::status::{CoreStatus, StatusDocument};
use crate::thresholds::{CoreThresholds, ThresholdSet};
use crate::types::Timestamp;
use crate::verdict::Verdict;

/// What was observed for one monitored core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreFinding {
    /// Solr reported the core; both signals were evaluated.
    Measured {
        status: CoreStatus,
        count: Verdict,
        freshness: Verdict,
    },
    /// The core is configured but absent from the `status` mapping.
    NotReported,
    /// Solr failed to load the core.
    InitFailure(String),
}

/// Verdict for a single core together with the thresholds it was held to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreEvaluation {
    pub name: String,
    pub thresholds: CoreThresholds,
    pub finding: CoreFinding,
    pub verdict: Verdict,
}

/// Result of one evaluation pass over every monitored core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub cores: Vec<CoreEvaluation>,
    pub overall: Verdict,
}

// ---------------------------------------------------------------------------
// Signal verdicts
// ---------------------------------------------------------------------------

/// Evaluate a document count. Fewer documents is worse.
///
/// - red if `num_docs < red_count`
/// - yellow if `num_docs < yellow_count`
/// - green otherwise
pub fn count_verdict(num_docs: u64, thresholds: &CoreThresholds) -> Verdict {
    if num_docs < thresholds.red_count {
        Verdict::Red
    } else if num_docs < thresholds.yellow_count {
        Verdict::Yellow
    } else {
        Verdict::Green
    }
}

/// Evaluate index freshness. Older is worse; an unknown age is red.
///
/// Bounds are strict: an age exactly equal to a bound does not cross it.
/// A timestamp ahead of `now` (clock skew) counts as fresh.
pub fn freshness_verdict(
    last_modified: Option<Timestamp>,
    now: Timestamp,
    thresholds: &CoreThresholds,
) -> Verdict {
    let Some(last_modified) = last_modified else {
        return Verdict::Red;
    };

    let age = now.signed_duration_since(last_modified);
    if age > thresholds.red_age() {
        Verdict::Red
    } else if age > thresholds.yellow_age() {
        Verdict::Yellow
    } else {
        Verdict::Green
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Evaluate every monitored core in `doc` against `thresholds`.
///
/// Monitored cores are all explicitly configured cores plus, when a
/// default is configured, every core Solr reports. Cores are visited in
/// name order; the overall verdict is the worst core verdict. A pass that
/// monitors no core at all is red.
pub fn evaluate(doc: &StatusDocument, thresholds: &ThresholdSet, now: Timestamp) -> Evaluation {
    let mut names: BTreeSet<&str> = thresholds.cores.keys().map(String::as_str).collect();
    if thresholds.default.is_some() {
        names.extend(doc.status.keys().map(String::as_str));
        names.extend(doc.init_failures.keys().map(String::as_str));
    }

    let mut overall = Verdict::Green;
    let mut cores = Vec::with_capacity(names.len());

    for name in names {
        let Some(core_thresholds) = thresholds.resolve(name) else {
            continue;
        };
        let evaluation = evaluate_core(doc, name, core_thresholds, now);
        overall = overall.worst(evaluation.verdict);
        cores.push(evaluation);
    }

    if cores.is_empty() {
        overall = Verdict::Red;
    }

    Evaluation { cores, overall }
}

fn evaluate_core(
    doc: &StatusDocument,
    name: &str,
    thresholds: &CoreThresholds,
    now: Timestamp,
) -> CoreEvaluation {
    let (finding, verdict) = if let Some(failure) = doc.init_failure(name) {
        (CoreFinding::InitFailure(failure.to_string()), Verdict::Red)
    } else if let Some(status) = doc.core(name) {
        let count = count_verdict(status.num_docs, thresholds);
        let freshness = freshness_verdict(status.last_modified, now, thresholds);
        (
            CoreFinding::Measured {
                status,
                count,
                freshness,
            },
            count.worst(freshness),
        )
    } else {
        (CoreFinding::NotReported, Verdict::Red)
    };

    CoreEvaluation {
        name: name.to_string(),
        thresholds: *thresholds,
        finding,
        verdict,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
