//! Structured, enrichable error values
//!
//! This crate replaces ad-hoc error strings with error values that carry a
//! stable identity, free-form structured context, message templates rendered
//! against that context, and a link to the error that caused them.
//!
//! # Modules
//!
//! - `variant` - Error variants, their pretty names and id generators
//! - `error` - The `BetterError` instance, cause-chain walking and reports
//! - `handling` - Ambient "error being handled" slot used for implicit causes
//! - `context` - String-keyed context map used to render details
//! - `config` - Backtrace capture policy, loaded from the environment
//!
//! # Example
//!
//! ```rust
//! use better_error::{Variant, ReportOptions};
//!
//! let timeout = Variant::root().create("ConnectionTimeoutError").build().unwrap();
//! assert_eq!(timeout.pretty_name(), "Connection Timeout");
//!
//! let error = timeout
//!     .error()
//!     .detail("Gave up on {{ host }} after {{ secs }}s")
//!     .context("host", "db.internal")
//!     .context("secs", 30)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(error.to_string(), "Gave up on db.internal after 30s");
//!
//! let report = error.to_report(ReportOptions::new()).unwrap();
//! assert_eq!(report.name, "ConnectionTimeoutError");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod handling;
pub mod variant;

pub use context::Context;
pub use error::{
    error_chain_length, format_error_chain, root_cause, Append, BetterError, Cause,
    Details, ErrorBuilder, ErrorReport, ReportOptions,
};
pub use handling::{HandlingGuard, OrRaise, Raised};
pub use variant::{IdGenerator, PrettyName, Variant, VariantBuilder};

use thiserror::Error;

/// Errors raised by misuse of this crate
///
/// Template failures are not wrapped here; they surface as [`TemplateError`].
#[derive(Debug, Error)]
pub enum UsageError {
    /// Tried to build an instance of an abstract variant
    #[error("{name} is abstract and cannot be instantiated")]
    AbstractVariant { name: String },

    /// `create` was given a base outside the receiver's subtree
    #[error("{base} isn't a subclass of {variant}")]
    UnrelatedBase { base: String, variant: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for this crate's fallible operations
pub type Result<T> = std::result::Result<T, UsageError>;

/// Error produced by the template engine while rendering details
pub type TemplateError = minijinja::Error;

/// Load configuration from `BETTER_ERROR_*` environment variables and install it
pub fn init() -> Result<()> {
    let config = config::ErrorConfig::from_env(config::ENV_PREFIX)?;
    tracing::debug!(backtrace = %config.backtrace, "Initializing better-error");
    config::install(config);
    Ok(())
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
    }

    #[test]
    fn test_init() {
        assert!(init().is_ok());
    }

    #[test]
    fn test_usage_error_messages() {
        let err = UsageError::UnrelatedBase {
            base: "OtherError".into(),
            variant: "ImAnError".into(),
        };
        assert_eq!(err.to_string(), "OtherError isn't a subclass of ImAnError");

        let err = UsageError::AbstractVariant {
            name: "BetterError".into(),
        };
        assert!(err.to_string().contains("abstract"));
    }
}
