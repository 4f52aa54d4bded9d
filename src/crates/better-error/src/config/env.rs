//! Environment variable loading
//!
//! Every helper distinguishes "not set" (`Ok(None)`) from
//! "set but unusable" (`Err(UsageError::Config)`).

use crate::{Result, UsageError};
use std::env;
use std::str::FromStr;

/// Read a variable; `Ok(None)` when it isn't set
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(UsageError::Config(format!(
            "{} contains invalid UTF-8",
            key
        ))),
    }
}

/// Read and parse a variable
///
/// ```rust,ignore
/// let mode: Option<BacktraceMode> = get_env_parse("BETTER_ERROR_BACKTRACE")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key)?
        .map(|val| {
            val.parse::<T>()
                .map_err(|e| UsageError::Config(format!("Failed to parse {}: {}", key, e)))
        })
        .transpose()
}

/// Build a prefixed, uppercased variable name: `("BETTER_ERROR_", "backtrace")` gives `BETTER_ERROR_BACKTRACE`
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}
