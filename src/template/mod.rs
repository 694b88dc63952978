//! Campaign template system.
//!
//! This module provides:
//! - Key normalization for case/format-insensitive sector matching
//! - Record to placeholder context expansion
//! - Safe `{placeholder}` substitution that never fails on unknown keys
//! - Template set loading (YAML) and per-sector resolution
//!
//! # Example
//!
//! ```ignore
//! let set = TemplateSet::load("config/templates.yaml")?;
//!
//! let record = Record::from_pairs([("Email", "ann@acme.test"), ("Name", "Ann"), ("Sector", "Retail")]);
//! let context = build_context(&record);
//!
//! let template = set.resolve(record.get("Sector"));
//! let subject = render(&template.subject, &context);
//! ```

mod context;
mod normalize;
mod store;
mod substitution;
mod types;

pub use context::{build_context, Context, Record};
pub use normalize::normalize_key;
pub use store::TemplateSet;
pub use substitution::render;
pub use types::{RenderedTemplate, Template, TemplateError, TemplateResult};

/// Render both halves of a template against a context
pub fn render_template(template: &Template, context: &Context) -> RenderedTemplate {
    RenderedTemplate {
        subject: render(&template.subject, context),
        body: render(&template.body, context),
    }
}
