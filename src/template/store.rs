//! Template set loading and sector resolution

use std::collections::HashMap;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::normalize::normalize_key;
use super::types::{Template, TemplateError, TemplateResult, TemplateSpec};

const DEFAULT_KEY: &str = "default";
const SECTORS_KEY: &str = "sectors";

/// All templates for a run: one per normalized sector key plus a default.
///
/// Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSet {
    default: Template,
    sectors: HashMap<String, Template>,
}

impl TemplateSet {
    /// Create a set holding only the default template
    pub fn new(default: Template) -> Self {
        Self {
            default,
            sectors: HashMap::new(),
        }
    }

    /// Add a sector template, keyed by the normalized sector name
    pub fn with_sector(mut self, sector: &str, template: Template) -> Self {
        self.sectors.insert(normalize_key(sector), template);
        self
    }

    /// Load templates from a YAML (or JSON) file
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let set = Self::from_yaml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            sectors = set.sectors.len(),
            "Templates loaded"
        );
        Ok(set)
    }

    /// Parse a template document.
    ///
    /// Accepts a `default` block, a `sectors` block mapping sector name to
    /// `{subject, body}`, and root-level sector entries that carry both
    /// `subject` and `body`. Both shapes may appear in the same document;
    /// root-level entries replace `sectors` entries of the same name.
    pub fn from_yaml_str(source: &str) -> TemplateResult<Self> {
        let document: Value = serde_yaml::from_str(source)?;

        let root = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(map) => map,
            other => {
                return Err(TemplateError::InvalidDocument(format!(
                    "expected a mapping at the document root, found {}",
                    value_kind(&other)
                )))
            }
        };

        let default = match root.get(DEFAULT_KEY) {
            None | Some(Value::Null) => Template::default(),
            Some(value) => parse_spec(DEFAULT_KEY, value)?.resolve_against(&Template::default()),
        };

        // Raw sector entries in document order; a repeated raw name replaces
        // the earlier entry in place.
        let mut entries: Vec<(String, TemplateSpec)> = Vec::new();

        match root.get(SECTORS_KEY) {
            None | Some(Value::Null) => {}
            Some(Value::Mapping(sectors)) => {
                for (key, value) in sectors {
                    let name = key_to_string(key)?;
                    let spec = match value {
                        Value::Null => TemplateSpec::default(),
                        other => parse_spec(&name, other)?,
                    };
                    upsert(&mut entries, name, spec);
                }
            }
            Some(other) => {
                return Err(TemplateError::InvalidDocument(format!(
                    "`sectors` must be a mapping, found {}",
                    value_kind(other)
                )))
            }
        }

        for (key, value) in &root {
            let Value::String(name) = key else { continue };
            if name == DEFAULT_KEY || name == SECTORS_KEY {
                continue;
            }
            if let Value::Mapping(fields) = value {
                if fields.contains_key("subject") && fields.contains_key("body") {
                    upsert(&mut entries, name.clone(), parse_spec(name, value)?);
                }
            }
        }

        let mut set = TemplateSet::new(default);
        for (name, spec) in entries {
            let template = spec.resolve_against(&set.default);
            set.sectors.insert(normalize_key(&name), template);
        }

        Ok(set)
    }

    /// Pick the template for a row's category.
    ///
    /// A non-empty category whose normalized form equals a stored sector key
    /// selects that sector; anything else selects the default.
    pub fn resolve(&self, category: Option<&str>) -> &Template {
        category
            .filter(|value| !value.is_empty())
            .and_then(|value| self.sectors.get(&normalize_key(value)))
            .unwrap_or(&self.default)
    }

    pub fn default_template(&self) -> &Template {
        &self.default
    }

    /// Look up a sector template by any spelling of its name
    pub fn sector(&self, sector: &str) -> Option<&Template> {
        self.sectors.get(&normalize_key(sector))
    }

    /// Normalized sector keys, sorted
    pub fn sector_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.sectors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }
}

fn upsert(entries: &mut Vec<(String, TemplateSpec)>, name: String, spec: TemplateSpec) {
    match entries.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = spec,
        None => entries.push((name, spec)),
    }
}

fn parse_spec(name: &str, value: &Value) -> TemplateResult<TemplateSpec> {
    if !value.is_mapping() {
        return Err(TemplateError::InvalidDocument(format!(
            "template `{}` must be a mapping with `subject` and `body`, found {}",
            name,
            value_kind(value)
        )));
    }
    serde_yaml::from_value(value.clone())
        .map_err(|e| TemplateError::InvalidDocument(format!("template `{}`: {}", name, e)))
}

fn key_to_string(key: &Value) -> TemplateResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(TemplateError::InvalidDocument(format!(
            "sector names must be scalars, found {}",
            value_kind(other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
