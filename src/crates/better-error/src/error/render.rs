//! Rendering detail templates
//!
//! Templates use MiniJinja syntax (`{{ key }}`) and render against the
//! error's context. Undefined keys render as empty text.

use super::BetterError;
use crate::context::Context;
use crate::TemplateError;
use minijinja::Environment;
use once_cell::sync::Lazy;
use std::fmt;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(Environment::new);

/// Render one template against a context
pub(crate) fn render(template: &str, context: &Context) -> Result<String, TemplateError> {
    TEMPLATES.render_str(template, context)
}

impl BetterError {
    /// Rendered details, in the order they were added
    ///
    /// # Errors
    ///
    /// Returns the template engine's error unchanged when a template is
    /// malformed.
    pub fn details(&self) -> Result<Vec<String>, TemplateError> {
        self.details_in(&self.context)
    }

    /// Render this error's own templates against someone else's context
    pub(crate) fn details_in(&self, context: &Context) -> Result<Vec<String>, TemplateError> {
        self.details
            .iter()
            .map(|template| render(template, context))
            .collect()
    }

    /// Rendered details joined with `join_with`
    pub fn detail(&self, join_with: &str) -> Result<String, TemplateError> {
        Ok(self.details()?.join(join_with))
    }

    /// Own details followed by the details of every cause, nearest first
    ///
    /// Enriched causes have their templates rendered against this error's
    /// context, plain causes contribute their display text.
    pub fn details_with_children(&self) -> Result<Vec<String>, TemplateError> {
        let mut result = self.details()?;
        for cause in self.children() {
            match cause.as_better_error() {
                Some(better) => result.extend(better.details_in(&self.context)?),
                None => result.push(cause.to_string()),
            }
        }
        Ok(result)
    }

    pub fn detail_with_children(&self, join_with: &str) -> Result<String, TemplateError> {
        Ok(self.details_with_children()?.join(join_with))
    }

    /// Single-line diagnostic form, also used by `Debug`
    pub fn inspect(&self) -> String {
        let details = self.details().unwrap_or_else(|_| self.details.clone());
        let cause = match &self.cause {
            Some(cause) => format!("{:?}", cause),
            None => "None".to_string(),
        };

        format!(
            "#<{}:{:p} id: {}, details: {:?}, context: {}, cause: {}>",
            self.variant.name(),
            self,
            self.id,
            details,
            self.context,
            cause
        )
    }
}

impl fmt::Display for BetterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .detail("\n")
            .unwrap_or_else(|_| self.details.join("\n"));

        if text.is_empty() {
            f.write_str(self.variant.name())
        } else {
            f.write_str(&text)
        }
    }
}

impl fmt::Debug for BetterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
