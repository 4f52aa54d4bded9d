//! Configuration management
//!
//! The only process-wide setting is the [`BacktraceMode`] used when an error
//! is built. It decides what `ReportOptions::with_backtrace` has to show.
//!
//! Settings are read from `BETTER_ERROR_*` variables by [`crate::init`] or
//! installed directly with [`install`].
//!
//! # Example
//!
//! ```rust
//! use better_error::config::{self, BacktraceMode, ErrorConfig};
//!
//! config::install(ErrorConfig::new().with_backtrace(BacktraceMode::Off));
//! assert_eq!(config::current().backtrace, BacktraceMode::Off);
//! ```

mod env;

pub use env::{build_env_key, get_env, get_env_parse};

use crate::Result;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::fmt;
use std::str::FromStr;

/// Prefix of every environment variable read by [`ErrorConfig::from_env`]
pub const ENV_PREFIX: &str = "BETTER_ERROR_";

static GLOBAL: Lazy<RwLock<ErrorConfig>> = Lazy::new(|| RwLock::new(ErrorConfig::default()));

/// When to capture a backtrace at construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacktraceMode {
    /// Follow `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`
    #[default]
    Env,
    /// Always capture
    Force,
    /// Never capture
    Off,
}

impl BacktraceMode {
    pub fn capture(self) -> Backtrace {
        match self {
            Self::Env => Backtrace::capture(),
            Self::Force => Backtrace::force_capture(),
            Self::Off => Backtrace::disabled(),
        }
    }
}

impl FromStr for BacktraceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "force" | "always" => Ok(Self::Force),
            "off" | "never" => Ok(Self::Off),
            other => Err(format!("unknown backtrace mode '{}'", other)),
        }
    }
}

impl fmt::Display for BacktraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Env => "env",
            Self::Force => "force",
            Self::Off => "off",
        };
        f.write_str(name)
    }
}

/// Error construction settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorConfig {
    pub backtrace: BacktraceMode,
}

impl ErrorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backtrace(mut self, backtrace: BacktraceMode) -> Self {
        self.backtrace = backtrace;
        self
    }

    /// Load from variables named `{prefix}BACKTRACE`, keeping defaults for unset ones
    ///
    /// A variable that is set but unparsable is an error.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            backtrace: get_env_parse(&build_env_key(prefix, "backtrace"))?
                .unwrap_or(defaults.backtrace),
        })
    }
}

/// Install `config` for the whole process
pub fn install(config: ErrorConfig) {
    tracing::debug!(backtrace = %config.backtrace, "Installing error configuration");
    *GLOBAL.write() = config;
}

/// Snapshot of the installed configuration
pub fn current() -> ErrorConfig {
    GLOBAL.read().clone()
}
