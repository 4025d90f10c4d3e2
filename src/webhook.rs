//! Conversion of automation payloads into markdown articles.
//!
//! Each submodule owns one payload shape and turns it into a [`NewArticle`];
//! none of them touch the filesystem.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::post::Priority;

pub(crate) mod article;
pub(crate) mod matches;
pub(crate) mod transfers;
pub(crate) mod viral;

pub(crate) use crate::store::NewArticle;

/// A payload that is well-formed JSON but cannot become an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejected(pub String);

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a webhook conversion that may decline to publish.
#[derive(Debug)]
pub(crate) enum Outcome {
    Publish(Prepared),
    Skip(Skipped),
}

#[derive(Debug)]
pub(crate) struct Prepared {
    pub article: NewArticle,
    pub title: String,
    pub priority: Option<Priority>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct Skipped {
    pub message: String,
    pub engagement_score: f64,
    pub threshold: f64,
}

pub(crate) fn iso_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub(crate) fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `2500000` -> `2,500,000`
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Drops blank optional lines and squeezes runs of empty lines so the
/// generated markdown reads like it was typed.
pub(crate) fn tidy_markdown(lines: &[String]) -> String {
    let mut out = String::new();
    let mut blank = true;
    for line in lines.iter().flat_map(|l| l.split('\n')) {
        let line = line.trim_end();
        if line.is_empty() {
            if !blank {
                out.push('\n');
            }
            blank = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
        blank = false;
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(2_500_000), "2,500,000");
    }

    #[test]
    fn tidy_collapses_blank_runs() {
        let lines = vec![
            "# Title".to_string(),
            String::new(),
            String::new(),
            "a\n\n\nb".to_string(),
            String::new(),
        ];
        assert_eq!(tidy_markdown(&lines), "# Title\n\na\n\nb");
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("twitter"), "Twitter");
        assert_eq!(capitalize(""), "");
    }
}
