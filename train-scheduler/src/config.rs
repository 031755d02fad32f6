//! Server configuration.

use std::net::SocketAddr;

use crate::domain::{TransitionPolicy, UnknownPolicy};

/// Environment variable names.
pub const BIND_ADDR_VAR: &str = "SCHEDULER_BIND_ADDR";
pub const STATUS_POLICY_VAR: &str = "SCHEDULER_STATUS_POLICY";
pub const DEFAULT_PAGE_LIMIT_VAR: &str = "SCHEDULER_DEFAULT_PAGE_LIMIT";
pub const MAX_PAGE_LIMIT_VAR: &str = "SCHEDULER_MAX_PAGE_LIMIT";

/// Error from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("default page limit {default} exceeds maximum {max}")]
    PageLimits { default: usize, max: usize },
}

/// Configuration for the scheduling server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,

    /// Which status changes are allowed.
    pub status_policy: TransitionPolicy,

    /// Page size when a list request gives no `limit`.
    pub default_page_limit: usize,

    /// Upper bound on any requested `limit`.
    pub max_page_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            status_policy: TransitionPolicy::Strict,
            default_page_limit: 100,
            max_page_limit: 1000,
        }
    }
}

impl Config {
    /// Read configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = value
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(BIND_ADDR_VAR, &value, e))?;
        }
        if let Some(value) = lookup(STATUS_POLICY_VAR) {
            config.status_policy = value
                .parse()
                .map_err(|e: UnknownPolicy| invalid(STATUS_POLICY_VAR, &value, e))?;
        }
        if let Some(value) = lookup(DEFAULT_PAGE_LIMIT_VAR) {
            config.default_page_limit = parse_limit(DEFAULT_PAGE_LIMIT_VAR, &value)?;
        }
        if let Some(value) = lookup(MAX_PAGE_LIMIT_VAR) {
            config.max_page_limit = parse_limit(MAX_PAGE_LIMIT_VAR, &value)?;
        }

        if config.default_page_limit > config.max_page_limit {
            return Err(ConfigError::PageLimits {
                default: config.default_page_limit,
                max: config.max_page_limit,
            });
        }
        Ok(config)
    }

    /// The effective page size for a list request.
    pub fn page_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_limit)
            .min(self.max_page_limit)
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_limit(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) => Err(invalid(var, value, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(var, value, e)),
    }
}
