//! The enriched error instance
//!
//! A [`BetterError`] is one occurrence of a failure. It carries:
//!
//! - an identity produced by its variant's id generator
//! - detail templates, rendered against its context on demand
//! - a key/value [`Context`]
//! - an optional cause, followed lazily into a cached cause chain
//!
//! Instances are built with [`Variant::error`] and may be enriched with `<<`
//! while they propagate.
//!
//! # Example
//!
//! ```rust
//! use better_error::{ReportOptions, Variant};
//! use serde_json::json;
//!
//! let variant = Variant::root().create("CheckoutError").build().unwrap();
//! let inner = std::io::Error::new(std::io::ErrorKind::Other, "card declined");
//!
//! let error = variant
//!     .error()
//!     .detail("Order {{ order }} failed")
//!     .caused_by(inner)
//!     .build()
//!     .unwrap()
//!     << json!({ "order": 1234 });
//!
//! assert_eq!(error.to_string(), "Order 1234 failed");
//! assert_eq!(error.root_cause().unwrap().to_string(), "card declined");
//!
//! let report = error.to_report(ReportOptions::new().with_children(true)).unwrap();
//! assert_eq!(report.child.unwrap().details, vec!["card declined"]);
//! ```

mod append;
pub(crate) mod chain;
mod render;
mod report;

pub use append::Append;
pub use chain::{error_chain_length, format_error_chain, root_cause, Cause};
pub use report::{ErrorReport, ReportOptions};

use crate::config;
use crate::context::Context;
use crate::handling::{self, Raised};
use crate::variant::Variant;
use crate::{Result, UsageError};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::backtrace::Backtrace;
use std::error::Error as StdError;

/// A structured, enrichable error value
pub struct BetterError {
    variant: Variant,
    id: Value,
    details: Vec<String>,
    context: Context,
    cause: Option<Raised>,
    backtrace: Backtrace,
    causes: OnceCell<Vec<Cause>>,
    root_cause: OnceCell<Option<Cause>>,
}

impl BetterError {
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Variant name
    pub fn name(&self) -> &str {
        self.variant.name()
    }

    pub fn pretty_name(&self) -> String {
        self.variant.pretty_name()
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    /// Unrendered detail templates, in order
    pub fn templates(&self) -> &[String] {
        &self.details
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The immediate cause: the explicit `caused_by`, or the error that was
    /// being handled when this one was built
    pub fn cause(&self) -> Option<&Raised> {
        self.cause.as_ref()
    }

    pub fn caused_by(&self) -> Option<&Raised> {
        self.cause()
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Every transitive cause, nearest first, excluding `self`
    ///
    /// Computed on first call and cached for the life of the instance.
    pub fn children(&self) -> &[Cause] {
        self.causes.get_or_init(|| {
            let causes = chain::walk(self.cause.as_ref());
            tracing::trace!(id = %self.id, depth = causes.len(), "Walked cause chain");
            causes
        })
    }

    pub fn causes(&self) -> &[Cause] {
        self.children()
    }

    /// The last cause in the chain, or `None` when there is no cause
    pub fn root_cause(&self) -> Option<&Cause> {
        self.root_cause
            .get_or_init(|| self.children().last().cloned())
            .as_ref()
    }

    /// Merge context or add details, see [`Append`]
    pub fn append(&mut self, data: impl Into<Append>) -> &mut Self {
        data.into().apply(&mut self.details, &mut self.context);
        self
    }
}

impl StdError for BetterError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(Raised::error)
    }
}

/// Detail templates given at construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Details(Vec<String>);

impl Details {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<()> for Details {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<&str> for Details {
    fn from(detail: &str) -> Self {
        Self(vec![detail.to_string()])
    }
}

impl From<String> for Details {
    fn from(detail: String) -> Self {
        Self(vec![detail])
    }
}

impl From<Vec<String>> for Details {
    fn from(details: Vec<String>) -> Self {
        Self(details)
    }
}

impl From<Vec<&str>> for Details {
    fn from(details: Vec<&str>) -> Self {
        details.into_iter().collect()
    }
}

impl From<&[&str]> for Details {
    fn from(details: &[&str]) -> Self {
        details.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for Details {
    fn from(details: [&str; N]) -> Self {
        details.into_iter().collect()
    }
}

impl<T: Into<Details>> From<Option<T>> for Details {
    fn from(details: Option<T>) -> Self {
        details.map(Into::into).unwrap_or_default()
    }
}

impl<S: Into<String>> FromIterator<S> for Details {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Builder returned by [`Variant::error`]
#[derive(Debug)]
pub struct ErrorBuilder {
    variant: Variant,
    id: Option<Value>,
    details: Vec<String>,
    context: Context,
    caused_by: Option<Raised>,
}

impl ErrorBuilder {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            id: None,
            details: Vec::new(),
            context: Context::new(),
            caused_by: None,
        }
    }

    /// Add one detail template
    pub fn detail(mut self, template: impl Into<String>) -> Self {
        self.details.push(template.into());
        self
    }

    /// Add detail templates; accepts one, many or none
    pub fn details(mut self, details: impl Into<Details>) -> Self {
        self.details.extend(details.into().into_vec());
        self
    }

    /// Use this identity instead of generating one
    pub fn id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the cause explicitly, overriding the error being handled
    pub fn caused_by(mut self, cause: impl Into<Raised>) -> Self {
        self.caused_by = Some(cause.into());
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Merge a whole map into the context
    pub fn with_context(mut self, context: impl Into<Context>) -> Self {
        self.context.merge(context);
        self
    }

    pub fn build(self) -> Result<BetterError> {
        if self.variant.is_abstract() {
            return Err(UsageError::AbstractVariant {
                name: self.variant.name().to_string(),
            });
        }

        let id = self.id.unwrap_or_else(|| self.variant.generate_id());
        let cause = self.caused_by.or_else(handling::current);
        let backtrace = config::current().backtrace.capture();

        tracing::trace!(
            variant = %self.variant.name(),
            id = %id,
            has_cause = cause.is_some(),
            "Built error"
        );

        Ok(BetterError {
            variant: self.variant,
            id,
            details: self.details,
            context: self.context,
            cause,
            backtrace,
            causes: OnceCell::new(),
            root_cause: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handling::HandlingGuard;
    use serde_json::json;
    use std::io;

    fn variant(name: &str) -> Variant {
        Variant::root().create(name).build().unwrap()
    }

    #[test]
    fn test_root_cannot_be_built() {
        let err = Variant::root().error().build().unwrap_err();
        assert!(matches!(err, UsageError::AbstractVariant { .. }));
        assert!(Variant::root().new_error("nope").is_err());
    }

    #[test]
    fn test_concrete_variant_builds() {
        let error = variant("ImAnError").new_error(()).unwrap();
        assert!(error.templates().is_empty());
        assert!(error.context().is_empty());
        assert!(error.cause().is_none());
        assert_eq!(error.name(), "ImAnError");
        assert_eq!(error.pretty_name(), "Im An");
    }

    #[test]
    fn test_details_normalization() {
        let v = variant("NormalizeError");
        assert_eq!(v.new_error(None::<&str>).unwrap().templates().len(), 0);
        assert_eq!(v.new_error("one").unwrap().templates(), ["one"]);
        assert_eq!(v.new_error(["a", "b"]).unwrap().templates(), ["a", "b"]);

        let owned = vec!["x".to_string()];
        let error = v.new_error(owned.clone()).unwrap() << "y";
        assert_eq!(error.templates(), ["x", "y"]);
        assert_eq!(owned, vec!["x".to_string()]);
    }

    #[test]
    fn test_explicit_id() {
        let error = variant("ExplicitIdError").error().id(42).build().unwrap();
        assert_eq!(error.id(), &json!(42));
    }

    #[test]
    fn test_generated_ids_differ() {
        let v = variant("DistinctIdError");
        let a = v.new_error(()).unwrap();
        let b = v.new_error(()).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_context_at_construction() {
        let error = variant("ContextError")
            .error()
            .context("cake", "cheesecake")
            .with_context([("president", "Donald")])
            .build()
            .unwrap();

        assert_eq!(error.context().get("cake"), Some(&json!("cheesecake")));
        assert_eq!(error.context().get("president"), Some(&json!("Donald")));
    }

    #[test]
    fn test_cause_from_handling_slot() {
        let v = variant("HandledError");
        let _guard = HandlingGuard::enter(io::Error::new(io::ErrorKind::Other, "handled"));

        let error = v.new_error(()).unwrap();
        assert_eq!(error.cause().unwrap().to_string(), "handled");
        assert_eq!(error.source().unwrap().to_string(), "handled");
    }

    #[test]
    fn test_explicit_cause_wins() {
        let v = variant("OverrideError");
        let _guard = HandlingGuard::enter(io::Error::new(io::ErrorKind::Other, "ambient"));

        let error = v
            .error()
            .caused_by(io::Error::new(io::ErrorKind::Other, "explicit"))
            .build()
            .unwrap();
        assert_eq!(error.caused_by().unwrap().to_string(), "explicit");
    }

    #[test]
    fn test_no_cause_memoizes_none() {
        let error = variant("LonelyError").new_error(()).unwrap();
        assert!(error.children().is_empty());
        assert!(error.root_cause().is_none());
        assert!(error.root_cause().is_none());
    }
}
