//! First-match-wins evaluation over ordered rule tables.
//!
//! Every stage of the header cascade is a static table whose order is its
//! precedence. Stages never combine hits: the first rule that fires decides.

/// Runs `probe` over `rules` in table order and returns the first hit.
pub fn first_match<'a, T, R>(
    rules: &'a [T],
    probe: impl FnMut(&'a T) -> Option<R>,
) -> Option<R> {
    rules.iter().find_map(probe)
}

/// Returns the value of the first `(needle, value)` entry whose needle occurs
/// anywhere in `haystack`.
///
/// Plain substring containment, no word boundaries: `" a"` hits inside
/// `"solar array"`.
pub fn first_substring<V: Copy>(table: &[(&str, V)], haystack: &str) -> Option<V> {
    first_match(table, |&(needle, value)| haystack.contains(needle).then_some(value))
}
