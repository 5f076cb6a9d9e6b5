//! Shared proptest generators.

use proptest::prelude::*;

/// A single path segment: no separators, never empty.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,15}"
}

/// An ordered list of 0 to 4 segments.
pub fn segments_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment_strategy(), 0..5)
}

/// A well-formed full path: segments joined by `/`, optionally with one
/// leading and/or one trailing separator.
pub fn full_path_strategy() -> impl Strategy<Value = (Vec<String>, String, bool, bool)> {
    (segments_strategy(), segment_strategy(), any::<bool>(), any::<bool>())
}

/// Render the pieces produced by [`full_path_strategy`].
#[must_use]
pub fn render_full_path(parents: &[String], name: &str, leading: bool, trailing: bool) -> String {
    let mut out = String::new();
    if leading {
        out.push('/');
    }
    for parent in parents {
        out.push_str(parent);
        out.push('/');
    }
    out.push_str(name);
    if trailing {
        out.push('/');
    }
    out
}

/// Service token ids in the `hvs.` format.
pub fn token_id_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{24}".prop_map(|s| format!("hvs.{s}"))
}

/// Token accessors.
pub fn accessor_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{24}"
}

/// A small set of policy names.
pub fn policies_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9-]{2,12}", 0..4)
}

/// HTTP status codes outside the 2xx range.
pub fn error_status_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![300u16..400, 400u16..500, 500u16..600]
}
