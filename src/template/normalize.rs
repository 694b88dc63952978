//! Lookup key normalization

/// Canonicalize a lookup key: trim, drop interior spaces and hyphens, lowercase.
///
/// `" Retail-Sales "`, `"retailsales"` and `"RETAIL SALES"` all map to
/// `"retailsales"`.
pub fn normalize_key(key: &str) -> String {
    let stripped: String = key.chars().filter(|c| *c != ' ' && *c != '-').collect();
    stripped.trim().to_lowercase()
}
