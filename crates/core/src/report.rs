//! Human-readable status report built from an [`Evaluation`].
//!
//! The message body is plain text with inline HTML icons, which the
//! Xymon web UI renders next to each measured value.

use std::fmt::Write;

use crate::evaluate::{CoreEvaluation, CoreFinding, Evaluation};
use crate::verdict::Verdict;

/// Separator line closing each core block.
const CORE_SEPARATOR: &str = "--------------------------------";

/// Prefix of the message sent when the admin endpoint could not be read.
pub const FETCH_FAILURE_PREFIX: &str = "Error fetching data from Solr";

/// Aggregated outcome of one run, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub color: Verdict,
    pub message: String,
}

impl Report {
    /// Render an evaluation into a report.
    ///
    /// `version` is appended as the final line so the dashboard shows which
    /// build produced the status.
    pub fn from_evaluation(evaluation: &Evaluation, version: &str) -> Self {
        let mut message = String::new();

        if evaluation.cores.is_empty() {
            let _ = writeln!(
                message,
                "No monitored cores were reported by Solr {}\n",
                Verdict::Red.icon_html()
            );
        }

        for core in &evaluation.cores {
            write_core_block(&mut message, core);
        }

        let _ = writeln!(message, "\nVersion: {version}");

        Self {
            color: evaluation.overall,
            message,
        }
    }

    /// Red report for a run where the status document could not be fetched.
    pub fn fetch_failure(error: &dyn std::fmt::Display) -> Self {
        Self {
            color: Verdict::Red,
            message: format!("{FETCH_FAILURE_PREFIX}: {error}"),
        }
    }
}

fn write_core_block(out: &mut String, core: &CoreEvaluation) {
    let t = &core.thresholds;

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "Core: {name}\n\n\
         Conditions for Yellow: Number of documents < {yc} or \n\
         last modified date is older than {yt} minutes\n\
         Conditions for Red: Number of documents < {rc} or \n\
         last modified date is older than {rt} minutes\n\n",
        name = core.name,
        yc = t.yellow_count,
        yt = t.yellow_time_minutes,
        rc = t.red_count,
        rt = t.red_time_minutes,
    );

    match &core.finding {
        CoreFinding::Measured {
            status,
            count,
            freshness,
        } => {
            let last_modified = status
                .last_modified
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f UTC").to_string())
                .unwrap_or_else(|| "never".to_string());
            let _ = write!(
                out,
                "Number of Documents: {} {}\n\
                 Last Modified Date: {} {}\n\n",
                status.num_docs,
                count.icon_html(),
                last_modified,
                freshness.icon_html(),
            );
        }
        CoreFinding::NotReported => {
            let _ = write!(
                out,
                "Core not reported by Solr {}\n\n",
                Verdict::Red.icon_html()
            );
        }
        CoreFinding::InitFailure(failure) => {
            let _ = write!(
                out,
                "Core failed to initialise: {} {}\n\n",
                failure,
                Verdict::Red.icon_html()
            );
        }
    }

    let _ = write!(out, "{CORE_SEPARATOR}\n\n");
}
