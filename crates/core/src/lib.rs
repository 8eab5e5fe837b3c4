//! `solrmon-core` -- pure health-evaluation logic for Solr cores.
//!
//! No I/O lives here: the agent crate fetches the CoreAdmin status
//! document and delivers the report, this crate decides what colour it is.

pub mod error;
pub mod evaluate;
pub mod report;
pub mod status;
pub mod thresholds;
pub mod types;
pub mod verdict;
