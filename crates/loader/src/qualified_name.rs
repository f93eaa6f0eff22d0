//! Turning arbitrary keys (CSV headers, JSON property names) into element names.

use fluentree_dom::name::{is_name_char, is_name_start_char, is_ncname, split_qname};

/// Name used when a key has no usable characters left.
pub const DEFAULT_NAME: &str = "_";

/// Drops every character that may not appear in an NCName (the colon
/// included), then any leading characters that may not start one. Falls back
/// to [`DEFAULT_NAME`].
pub fn normalize(key: &str) -> String {
    let kept: String = key.chars().filter(|&c| is_name_char(c)).collect();
    let name = kept.trim_start_matches(|c: char| !is_name_start_char(c));
    if name.is_empty() { DEFAULT_NAME.to_string() } else { name.to_string() }
}

/// `prefix:local` split; `None` for anything that is not a valid qualified name.
pub fn split(name: &str) -> Option<(Option<&str>, &str)> {
    split_qname(name).ok()
}

/// Whether `name` is a valid (optionally prefixed) qualified name.
pub fn is_valid(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(name),
    }
}
