use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

const MAX_TITLE_SLUG_LEN: usize = 50;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercases and collapses everything outside `[a-z0-9]` into single
/// hyphens. The result is always a safe bare filename stem (possibly empty).
pub(crate) fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Id for free-form articles: the title slug capped at 50 characters plus the
/// last six digits of the creation time in milliseconds.
pub(crate) fn post_id(title: &str, now: DateTime<Utc>) -> String {
    let mut slug = slugify(title);
    if slug.len() > MAX_TITLE_SLUG_LEN {
        // slug is ascii, any byte index is a char boundary
        slug.truncate(MAX_TITLE_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        slug.push_str("post");
    }
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    format!("{slug}-{millis:06}")
}

/// Joins the slugs of `parts` with `-`, skipping parts that slugify to nothing.
pub(crate) fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| slugify(p))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
