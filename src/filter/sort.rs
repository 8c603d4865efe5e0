/// Resolve the caller's `sort_by` against an entity's allowlist.
///
/// Listings always sort descending on a single column; an unrecognized or
/// absent sort field falls back to `created_at`.
pub fn descending(sort_by: Option<&str>, allowed: &[&'static str]) -> &'static str {
    match sort_by {
        Some(requested) => allowed
            .iter()
            .find(|column| **column == requested)
            .copied()
            .unwrap_or_else(|| {
                tracing::debug!(requested, "ignoring unknown sort field");
                "created_at"
            }),
        None => "created_at",
    }
}
