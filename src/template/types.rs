//! Template types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse templates: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid template document: {0}")]
    InvalidDocument(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A message template: subject and body patterns with `{placeholder}` fields.
///
/// Templates are loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Subject line pattern
    #[serde(default)]
    pub subject: String,

    /// Body pattern (plain text or HTML)
    #[serde(default)]
    pub body: String,
}

impl Template {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// A template entry as written in the source document, before defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TemplateSpec {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl TemplateSpec {
    /// Fill any missing field from the default template.
    pub(crate) fn resolve_against(self, default: &Template) -> Template {
        Template {
            subject: self.subject.unwrap_or_else(|| default.subject.clone()),
            body: self.body.unwrap_or_else(|| default.body.clone()),
        }
    }
}

/// A rendered message ready for preview or delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body: String,
}
