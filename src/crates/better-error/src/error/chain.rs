//! Cause-chain walking
//!
//! Chains may mix enriched errors with plain `std::error::Error` values. The
//! walk only needs one step at a time: an enriched error's cause, or a plain
//! error's `source()`.

use super::BetterError;
use crate::handling::Raised;
use std::error::Error as StdError;
use std::fmt;

/// One link of a cause chain
///
/// Holds the nearest shared error and how many `source()` steps below it the
/// link sits, so it can be cloned and cached without borrowing the chain.
#[derive(Clone)]
pub struct Cause {
    head: Raised,
    depth: usize,
}

impl Cause {
    fn new(head: Raised, depth: usize) -> Self {
        Self { head, depth }
    }

    pub fn error(&self) -> &(dyn StdError + 'static) {
        let mut current = self.head.error();
        for _ in 0..self.depth {
            match current.source() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Variant name for enriched errors, type name for plain ones
    pub fn name(&self) -> String {
        if self.depth == 0 {
            self.head.name()
        } else {
            debug_name(self.error())
        }
    }

    pub fn as_better_error(&self) -> Option<&BetterError> {
        self.downcast_ref::<BetterError>()
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.error().downcast_ref::<T>()
    }

    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.error().is::<T>()
    }
}

impl PartialEq for Cause {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.head.ptr_eq(&other.head)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.error(), f)
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.error(), f)
    }
}

/// Collect every link below `head`, nearest first
///
/// Enriched links re-anchor on their own cause so plain errors they hold keep
/// their concrete type names. Each `source()` is followed once.
pub(crate) fn walk(head: Option<&Raised>) -> Vec<Cause> {
    let mut causes = Vec::new();
    let mut anchor = head.cloned();

    while let Some(raised) = anchor.take() {
        let mut current = raised.error();
        let mut depth = 0;
        loop {
            causes.push(Cause::new(raised.clone(), depth));
            if let Some(better) = current.downcast_ref::<BetterError>() {
                anchor = better.cause().cloned();
                break;
            }
            match current.source() {
                Some(next) => {
                    current = next;
                    depth += 1;
                }
                None => break,
            }
        }
    }

    causes
}

/// Last path segment of a type name, without generics
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Best-effort name for an error only known as `dyn Error`
///
/// Uses the variant name for enriched errors and the leading identifier of
/// the `Debug` output for everything else.
pub(crate) fn debug_name(error: &(dyn StdError + 'static)) -> String {
    if let Some(better) = error.downcast_ref::<BetterError>() {
        return better.name().to_string();
    }
    // io::Error's Debug output starts with its internal repr, not its type.
    if error.is::<std::io::Error>() {
        return short_type_name::<std::io::Error>().to_string();
    }

    let debug = format!("{:?}", error);
    let name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if name.is_empty() {
        "Error".to_string()
    } else {
        name
    }
}

/// Format an error chain as a multi-line string
///
/// Each level is labelled with its name and indented below its parent.
///
/// # Example
///
/// ```rust
/// use better_error::{format_error_chain, Variant};
///
/// let variant = Variant::root().create("ConfigError").build().unwrap();
/// let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
/// let error = variant.error().detail("config unreadable").caused_by(io).build().unwrap();
///
/// let formatted = format_error_chain(&error);
/// assert!(formatted.starts_with("ConfigError: config unreadable"));
/// assert!(formatted.contains("Caused by"));
/// assert!(formatted.contains("no such file"));
/// ```
pub fn format_error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut result = format!("{}: {}", debug_name(error), error);
    let mut current = error.source();
    let mut level = 1;

    while let Some(source) = current {
        result.push_str(&format!(
            "\n{:indent$}Caused by {}: {}",
            "",
            debug_name(source),
            source,
            indent = level * 2
        ));
        current = source.source();
        level += 1;
    }

    result
}

/// Get the root cause of an error chain
///
/// Returns the error itself when it has no source.
pub fn root_cause<'a>(error: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current
}

/// Count the number of errors in an error chain, including `error` itself
pub fn error_chain_length(error: &(dyn StdError + 'static)) -> usize {
    let mut count = 1;
    let mut current = error.source();

    while let Some(source) = current {
        count += 1;
        current = source.source();
    }

    count
}

impl BetterError {
    /// Format this error and its cached cause chain, one link per line
    pub fn format_chain(&self) -> String {
        let mut result = format!("{}: {}", self.name(), self);
        for (level, cause) in self.children().iter().enumerate() {
            result.push_str(&format!(
                "\n{:indent$}Caused by {}: {}",
                "",
                cause.name(),
                cause,
                indent = (level + 1) * 2
            ));
        }
        result
    }
}
