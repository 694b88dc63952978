//! Record and placeholder context types.
//!
//! A [`Record`] is one input row as read from the source. A [`Context`] is the
//! flat placeholder map rendered against templates: every field is reachable
//! under its trimmed name, a title-cased variant, a lowercase variant and the
//! normalized key, so `{Name}`, `{name}` and `{first name}` style placeholders
//! all work against a `First Name` column.

use std::collections::HashMap;

use super::normalize::normalize_key;

/// One input row: field name to value, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs. Repeated names keep the
    /// position of the first occurrence and the value of the last.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// First non-empty value among `names`, tried in order.
    ///
    /// An empty cell counts as absent so the next candidate is consulted.
    pub fn first_present(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .find(|value| !value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Placeholder name to value mapping derived from exactly one [`Record`].
///
/// Lookups never fail: [`Context::get_or_empty`] yields `""` for unknown keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

/// Upper-case the first character, leave the rest untouched.
fn title_variant(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Expand a record into its placeholder context.
///
/// Fields whose trimmed name is empty are ignored. When two fields produce the
/// same key under any variant, the later field in column order wins. That is
/// the established behavior for overlapping headers such as `Name` and `name`
/// and is kept as is.
pub fn build_context(record: &Record) -> Context {
    let mut context = Context::new();

    for (raw_name, value) in record.iter() {
        let name = raw_name.trim();
        if name.is_empty() {
            continue;
        }

        context.insert(name, value);
        context.insert(title_variant(name), value);
        context.insert(name.to_lowercase(), value);
        context.insert(normalize_key(name), value);
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_last_duplicate_wins_in_first_position() {
        let record = Record::from_pairs([("Email", "a@x.com"), ("Name", "Ann"), ("Email", "b@x.com")]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("Email"), Some("b@x.com"));
        let names: Vec<_> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Email", "Name"]);
    }

    #[test]
    fn test_first_present_skips_empty_values() {
        let record = Record::from_pairs([("Email", ""), ("email", "low@x.com"), ("EMAIL", "up@x.com")]);
        assert_eq!(record.first_present(&["Email", "email", "EMAIL"]), Some("low@x.com"));
        assert_eq!(record.first_present(&["Missing"]), None);
    }

    #[test]
    fn test_context_contains_all_variants() {
        let record = Record::from_pairs([(" first Name ", "Ann")]);
        let context = build_context(&record);

        assert_eq!(context.get("first Name"), Some("Ann"));
        assert_eq!(context.get("First Name"), Some("Ann"));
        assert_eq!(context.get("first name"), Some("Ann"));
        assert_eq!(context.get("firstname"), Some("Ann"));
        assert_eq!(context.len(), 4);
    }

    #[test]
    fn test_context_empty_value_is_present() {
        let record = Record::from_pairs([("Company", "")]);
        let context = build_context(&record);
        assert!(context.contains_key("company"));
        assert_eq!(context.get_or_empty("Company"), "");
    }

    #[test]
    fn test_context_skips_blank_field_names() {
        let record = Record::from_pairs([("   ", "ignored"), ("", "also ignored")]);
        assert!(build_context(&record).is_empty());
    }

    #[test]
    fn test_context_later_field_overwrites_collisions() {
        let record = Record::from_pairs([("Name", "first"), ("name", "second")]);
        let context = build_context(&record);
        // "name" lowercases to the same key as the first field's variants
        assert_eq!(context.get("name"), Some("second"));
        assert_eq!(context.get("Name"), Some("second"));
    }

    #[test]
    fn test_title_variant_keeps_remainder() {
        assert_eq!(title_variant("mIXed"), "MIXed");
        assert_eq!(title_variant(""), "");
    }

    #[test]
    fn test_get_or_empty_unknown_key() {
        let context = Context::new();
        assert_eq!(context.get_or_empty("nope"), "");
    }
}
