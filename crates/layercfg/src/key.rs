//! key path helpers
//!
//! Keys are `.` delimited. `/` is accepted as an alias and normalized before any lookup.
//! The first segment is the "base", the unit of lazy loading.

pub(crate) const DELIMITER: char = '.';
const ALIAS: char = '/';

pub(crate) fn normalize(key: &str) -> String {
    key.replace(ALIAS, ".")
}

pub(crate) fn segments(key: &str) -> impl Iterator<Item = &str> {
    key.split(DELIMITER)
}

pub(crate) fn base(key: &str) -> &str {
    key.split(DELIMITER).next().unwrap_or(key)
}

pub(crate) fn join(parent: &str, child: impl std::fmt::Display) -> String {
    if parent.is_empty() {
        return child.to_string();
    }

    format!("{parent}{DELIMITER}{child}")
}

/// `candidate` is `key` or lies beneath it
pub(crate) fn is_within(candidate: &str, key: &str) -> bool {
    candidate
        .strip_prefix(key)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(DELIMITER))
}

/// `candidate` and `key` share a branch: one is an ancestor of (or equal to) the other
pub(crate) fn overlaps(candidate: &str, key: &str) -> bool {
    is_within(candidate, key) || is_within(key, candidate)
}
