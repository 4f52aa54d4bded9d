//! Serializing an error into a report tree
//!
//! A report is a singly linked chain of nodes from the error down to its root
//! cause. Each node points at its immediate cause through `child`.

use super::{BetterError, Cause};
use crate::context::Context;
use crate::TemplateError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;

/// What [`BetterError::to_report`] should include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Nest a node for every cause under `child`
    pub include_children: bool,
    /// Add a `backtrace` entry to every node
    pub include_backtrace: bool,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, include_children: bool) -> Self {
        self.include_children = include_children;
        self
    }

    pub fn with_backtrace(mut self, include_backtrace: bool) -> Self {
        self.include_backtrace = include_backtrace;
        self
    }
}

/// One node of a serialized error chain
///
/// Plain causes only fill `name` and `details` (plus `backtrace` when asked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_name: Option<String>,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// Captured frames; empty when none were captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backtrace: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<ErrorReport>>,
}

impl ErrorReport {
    /// Iterate from this node down to the root cause
    pub fn iter(&self) -> impl Iterator<Item = &ErrorReport> {
        std::iter::successors(Some(self), |node| node.child.as_deref())
    }

    /// Number of nodes in the chain, this one included
    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    pub fn to_value(&self) -> crate::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// JSON with object keys sorted at every level
    ///
    /// # Example
    ///
    /// ```rust
    /// use better_error::{ReportOptions, Variant};
    ///
    /// let error = Variant::root()
    ///     .create("StableError")
    ///     .build()
    ///     .unwrap()
    ///     .error()
    ///     .id(1)
    ///     .context("b", 2)
    ///     .context("a", 1)
    ///     .build()
    ///     .unwrap();
    ///
    /// let json = error.to_report(ReportOptions::new()).unwrap().to_stable_json().unwrap();
    /// assert!(json.starts_with(r#"{"context":{"a":1,"b":2},"details":[],"id":1"#));
    /// ```
    pub fn to_stable_json(&self) -> crate::Result<String> {
        let sorted = sort_keys(self.to_value()?);
        Ok(serde_json::to_string(&sorted)?)
    }

    pub fn to_pretty_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// Rebuilds every object through a BTreeMap so keys come out sorted.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

impl BetterError {
    /// Serialize this error, optionally with its whole cause chain
    ///
    /// Without `include_children` the single node's `details` also carry the
    /// details of every cause, so nothing is lost by flattening.
    ///
    /// # Errors
    ///
    /// Returns the template engine's error when any rendered template is
    /// malformed.
    pub fn to_report(&self, options: ReportOptions) -> Result<ErrorReport, TemplateError> {
        if !options.include_children {
            return Ok(self.report_node(
                self.details_with_children()?,
                options.include_backtrace,
            ));
        }

        let mut child: Option<Box<ErrorReport>> = None;
        for cause in self.children().iter().rev() {
            let mut node = cause_node(cause, options.include_backtrace)?;
            node.child = child.take();
            child = Some(Box::new(node));
        }

        let mut report = self.report_node(self.details()?, options.include_backtrace);
        report.child = child;
        Ok(report)
    }

    fn report_node(&self, details: Vec<String>, include_backtrace: bool) -> ErrorReport {
        ErrorReport {
            id: Some(self.id.clone()),
            name: self.variant.name().to_string(),
            pretty_name: Some(self.variant.pretty_name()),
            details,
            context: Some(self.context.clone()),
            backtrace: include_backtrace.then(|| backtrace_frames(&self.backtrace)),
            child: None,
        }
    }
}

fn cause_node(cause: &Cause, include_backtrace: bool) -> Result<ErrorReport, TemplateError> {
    if let Some(better) = cause.as_better_error() {
        return Ok(better.report_node(better.details()?, include_backtrace));
    }

    Ok(ErrorReport {
        id: None,
        name: cause.name(),
        pretty_name: None,
        details: vec![cause.to_string()],
        context: None,
        backtrace: include_backtrace.then(Vec::new),
        child: None,
    })
}

fn backtrace_frames(backtrace: &Backtrace) -> Vec<String> {
    match backtrace.status() {
        BacktraceStatus::Captured => backtrace.to_string().lines().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
