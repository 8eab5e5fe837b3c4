//! Agent configuration loaded from environment variables and a TOML
//! threshold file.
//!
//! Everything is validated here, once, so a misconfigured agent exits
//! before it touches Solr or Xymon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use solrmon_core::error::CoreError;
use solrmon_core::thresholds::ThresholdSet;

use crate::reporter::DEFAULT_XYMON_PORT;

/// Threshold file read when `SOLRMON_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/solrmon/cores.toml";
/// CoreAdmin STATUS endpoint of a local Solr.
pub const DEFAULT_ADMIN_URL: &str = "http://localhost:8983/solr/admin/cores?action=STATUS&wt=json";
/// Xymon test (column) name.
pub const DEFAULT_SERVICE: &str = "solr";
/// Upper bound on the admin endpoint request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Xymon server host.
pub const DEFAULT_XYMON_SERVER: &str = "localhost";

/// Errors raised while loading the agent configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("{var} is invalid: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Where and how status messages are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XymonConfig {
    pub server: String,
    pub port: u16,
    /// Optional `status+<lifetime>` suffix, e.g. `30m`.
    pub lifetime: Option<String>,
}

/// Full agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Host name the status is filed under in Xymon.
    pub hostname: String,
    /// Xymon test (column) name.
    pub service: String,
    /// Solr CoreAdmin STATUS URL.
    pub admin_url: String,
    pub request_timeout: Duration,
    /// Path the thresholds were loaded from.
    pub config_path: PathBuf,
    pub xymon: XymonConfig,
    /// Print the status message instead of sending it.
    pub dry_run: bool,
    pub thresholds: ThresholdSet,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                        |
    /// |------------------------|--------------------------------|
    /// | `MACHINE`              | -- (required)                  |
    /// | `SOLRMON_CONFIG`       | `/etc/solrmon/cores.toml`      |
    /// | `SOLR_ADMIN_URL`       | local CoreAdmin STATUS URL     |
    /// | `SOLRMON_SERVICE`      | `solr`                         |
    /// | `REQUEST_TIMEOUT_SECS` | `10`                           |
    /// | `XYMON_SERVER`         | `localhost`                    |
    /// | `XYMON_PORT`           | `1984`                         |
    /// | `XYMON_LIFETIME`       | unset                          |
    /// | `SOLRMON_DRY_RUN`      | `false`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let hostname = var("MACHINE").ok_or(ConfigError::MissingVar("MACHINE"))?;
        if hostname.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidVar {
                var: "MACHINE",
                reason: format!("'{hostname}' must not contain whitespace"),
            });
        }

        let service = var("SOLRMON_SERVICE").unwrap_or_else(|| DEFAULT_SERVICE.into());
        validate_service(&service)?;

        let admin_url = var("SOLR_ADMIN_URL").unwrap_or_else(|| DEFAULT_ADMIN_URL.into());
        validate_admin_url(&admin_url)?;

        let request_timeout_secs: u64 = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number("REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidVar {
                var: "REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let port: u16 = match var("XYMON_PORT") {
            Some(raw) => parse_number("XYMON_PORT", &raw)?,
            None => DEFAULT_XYMON_PORT,
        };

        let lifetime = var("XYMON_LIFETIME");
        if let Some(lifetime) = &lifetime {
            if !is_valid_lifetime(lifetime) {
                return Err(ConfigError::InvalidVar {
                    var: "XYMON_LIFETIME",
                    reason: format!("'{lifetime}' is not a duration like 30, 30m, 2h, 1d or 1w"),
                });
            }
        }

        let dry_run = match var("SOLRMON_DRY_RUN") {
            Some(raw) => parse_flag("SOLRMON_DRY_RUN", &raw)?,
            None => false,
        };

        let config_path = PathBuf::from(
            var("SOLRMON_CONFIG").unwrap_or_else(|| DEFAULT_CONFIG_PATH.into()),
        );
        let thresholds = load_thresholds(&config_path)?;

        Ok(Self {
            hostname,
            service,
            admin_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            config_path,
            xymon: XymonConfig {
                server: var("XYMON_SERVER").unwrap_or_else(|| DEFAULT_XYMON_SERVER.into()),
                port,
                lifetime,
            },
            dry_run,
            thresholds,
        })
    }
}

/// Read and validate a TOML threshold file.
pub fn load_thresholds(path: &Path) -> Result<ThresholdSet, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_thresholds(&text, path)
}

/// Parse and validate threshold definitions. `path` is only used in errors.
pub fn parse_thresholds(text: &str, path: &Path) -> Result<ThresholdSet, ConfigError> {
    let thresholds: ThresholdSet = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    thresholds.validate()?;
    Ok(thresholds)
}

// ---- private helpers ----

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        var,
        reason: format!("'{raw}': {e}"),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            var,
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}

/// Xymon column names cannot contain dots or whitespace.
fn validate_service(service: &str) -> Result<(), ConfigError> {
    let ok = service
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(ConfigError::InvalidVar {
            var: "SOLRMON_SERVICE",
            reason: format!("'{service}' may only contain letters, digits, '-' and '_'"),
        });
    }
    Ok(())
}

fn validate_admin_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidVar {
        var: "SOLR_ADMIN_URL",
        reason: format!("'{url}': {e}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidVar {
            var: "SOLR_ADMIN_URL",
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}

/// Digits with an optional `m`, `h`, `d` or `w` unit (Xymon defaults to minutes).
fn is_valid_lifetime(lifetime: &str) -> bool {
    let digits = lifetime.trim_end_matches(['m', 'h', 'd', 'w']);
    let unit_len = lifetime.len() - digits.len();
    unit_len <= 1 && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
