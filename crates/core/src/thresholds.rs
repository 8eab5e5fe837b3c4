//! Per-core health thresholds and their validation.
//!
//! A [`ThresholdSet`] holds an optional global default plus explicit
//! per-core overrides. Both are checked once at load time so the
//! evaluator can assume well-formed bounds.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Below this many documents a core is yellow.
pub const DEFAULT_YELLOW_COUNT: u64 = 50;
/// Below this many documents a core is red.
pub const DEFAULT_RED_COUNT: u64 = 5;
/// An index untouched for longer than this is yellow.
pub const DEFAULT_YELLOW_TIME_MINUTES: u64 = 120;
/// An index untouched for longer than this is red.
pub const DEFAULT_RED_TIME_MINUTES: u64 = 720;

// ---------------------------------------------------------------------------
// CoreThresholds
// ---------------------------------------------------------------------------

/// Warning and failure bounds for a single core.
///
/// Document counts are lower bounds (fewer is worse); ages are upper
/// bounds (older is worse). Hence `red_count <= yellow_count` and
/// `red_time_minutes >= yellow_time_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreThresholds {
    pub yellow_count: u64,
    pub red_count: u64,
    pub yellow_time_minutes: u64,
    pub red_time_minutes: u64,
}

impl Default for CoreThresholds {
    fn default() -> Self {
        Self {
            yellow_count: DEFAULT_YELLOW_COUNT,
            red_count: DEFAULT_RED_COUNT,
            yellow_time_minutes: DEFAULT_YELLOW_TIME_MINUTES,
            red_time_minutes: DEFAULT_RED_TIME_MINUTES,
        }
    }
}

impl CoreThresholds {
    /// Validate the ordering of the bounds.
    ///
    /// `name` identifies the entry in the error message (a core name or
    /// `"default"`).
    pub fn validate(&self, name: &str) -> Result<(), CoreError> {
        if self.red_count > self.yellow_count {
            return Err(CoreError::Validation(format!(
                "{name}: red_count ({}) must be <= yellow_count ({})",
                self.red_count, self.yellow_count
            )));
        }
        if self.red_time_minutes < self.yellow_time_minutes {
            return Err(CoreError::Validation(format!(
                "{name}: red_time_minutes ({}) must be >= yellow_time_minutes ({})",
                self.red_time_minutes, self.yellow_time_minutes
            )));
        }
        // Only the larger bound needs checking once the ordering holds.
        if minutes_to_delta(self.red_time_minutes).is_none() {
            return Err(CoreError::Validation(format!(
                "{name}: red_time_minutes ({}) is out of range",
                self.red_time_minutes
            )));
        }
        Ok(())
    }

    /// Age above which the index is considered stale enough for yellow.
    pub fn yellow_age(&self) -> TimeDelta {
        minutes_to_delta(self.yellow_time_minutes).unwrap_or(TimeDelta::MAX)
    }

    /// Age above which the index is considered stale enough for red.
    pub fn red_age(&self) -> TimeDelta {
        minutes_to_delta(self.red_time_minutes).unwrap_or(TimeDelta::MAX)
    }
}

fn minutes_to_delta(minutes: u64) -> Option<TimeDelta> {
    i64::try_from(minutes).ok().and_then(TimeDelta::try_minutes)
}

// ---------------------------------------------------------------------------
// ThresholdSet
// ---------------------------------------------------------------------------

/// All thresholds for one monitored Solr instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdSet {
    /// Applied to every core reported by Solr that has no explicit entry.
    #[serde(default)]
    pub default: Option<CoreThresholds>,
    /// Explicit per-core thresholds, keyed by core name.
    #[serde(default)]
    pub cores: BTreeMap<String, CoreThresholds>,
}

impl ThresholdSet {
    /// Build a set from explicit per-core entries only.
    pub fn per_core<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, CoreThresholds)>,
        S: Into<String>,
    {
        Self {
            default: None,
            cores: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build a set that applies the same thresholds to every core.
    pub fn global(thresholds: CoreThresholds) -> Self {
        Self {
            default: Some(thresholds),
            cores: BTreeMap::new(),
        }
    }

    /// Thresholds governing `core`, if it is monitored at all.
    pub fn resolve(&self, core: &str) -> Option<&CoreThresholds> {
        self.cores.get(core).or(self.default.as_ref())
    }

    /// Validate every entry and reject a set that monitors nothing.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.default.is_none() && self.cores.is_empty() {
            return Err(CoreError::Validation(
                "threshold set must define a default or at least one core".to_string(),
            ));
        }
        if let Some(default) = &self.default {
            default.validate("default")?;
        }
        for (name, thresholds) in &self.cores {
            if name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "core name must not be empty".to_string(),
                ));
            }
            thresholds.validate(name)?;
        }
        Ok(())
    }
}
