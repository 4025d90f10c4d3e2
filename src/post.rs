use std::{borrow::Borrow, cmp::Ordering, sync::LazyLock};

use chrono::{DateTime, FixedOffset, NaiveDate};
use pulldown_cmark::{html, Options, Parser};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};

pub(crate) const DEFAULT_TITLE: &str = "Untitled";
pub(crate) const DEFAULT_CATEGORY: &str = "General";
pub(crate) const DEFAULT_AUTHOR: &str = "Football Feed Bot";

// leading `---` block, closed by the first `---` line after it
static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"\A---[ \t]*\r?\n(.*?)^---[ \t]*(?:\r?\n|\z)(.*)\z")
        .dot_matches_new_line(true)
        .multi_line(true)
        .build()
        .unwrap()
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchSummary {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransferSummary {
    pub player: String,
    pub from_club: String,
    pub to_club: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<String>,
    pub reliability: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ViralMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct ViralSummary {
    pub platform: String,
    pub engagement_score: f64,
    pub content_type: String,
    pub source_url: String,
    pub detected_at: String,
    #[serde(default)]
    pub metrics: ViralMetrics,
}

/// YAML header of a post file. Every key is optional on read; unknown keys
/// are ignored so hand-written posts can carry extra data.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_data: Option<MatchSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_data: Option<TransferSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viral_data: Option<ViralSummary>,
}

// `tags: [a, b]` and the older `tags: a, b` both appear in content dirs
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::List(tags)) => tags,
        Some(Tags::Csv(tags)) => tags
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => vec![],
    })
}

#[derive(Serialize, Debug, Clone)]
pub(crate) struct Post {
    pub id: String,
    pub filename: String,
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub author: String,
    pub featured: bool,
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_data: Option<MatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_data: Option<TransferSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viral_data: Option<ViralSummary>,

    #[serde(skip_serializing)]
    pub body: String,
}

impl Post {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category.eq_ignore_ascii_case(category)
    }

    pub fn title_contains(&self, word: &str) -> bool {
        self.title.to_lowercase().contains(&word.to_lowercase())
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
pub(crate) fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

pub(crate) fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    match HEADER_PATTERN.captures(content) {
        Some(caps) => {
            let header = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            (Some(header), body)
        }
        None => (None, content),
    }
}

pub(crate) fn parse_post(filename: &str, content: &str) -> Result<Post, serde_yaml::Error> {
    let (header, body) = split_front_matter(content);
    let front_matter: FrontMatter = match header {
        Some(header) if !header.trim().is_empty() => serde_yaml::from_str(header)?,
        _ => FrontMatter::default(),
    };

    let id = filename.strip_suffix(".md").unwrap_or(filename).to_string();
    Ok(Post {
        id,
        filename: filename.to_string(),
        title: non_empty(front_matter.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        date: front_matter.date.as_deref().and_then(parse_date),
        excerpt: front_matter.excerpt.unwrap_or_default(),
        category: non_empty(front_matter.category)
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: front_matter.tags,
        featured_image: non_empty(front_matter.featured_image),
        author: non_empty(front_matter.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        featured: front_matter.featured,
        priority: front_matter.priority,
        match_data: front_matter.match_data,
        transfer_data: front_matter.transfer_data,
        viral_data: front_matter.viral_data,
        body: body.trim_start_matches(['\r', '\n']).to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn render_post_file(
    front_matter: &FrontMatter,
    body: &str,
) -> Result<String, serde_yaml::Error> {
    let header = serde_yaml::to_string(front_matter)?;
    Ok(format!("---\n{header}---\n\n{}\n", body.trim()))
}

pub(crate) fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(body, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Newest first. Dated posts come before undated ones, which fall back to
/// title order.
pub(crate) fn sort_posts<T: Borrow<Post>>(a: &T, b: &T) -> Ordering {
    let (a, b) = (a.borrow(), b.borrow());
    match (a.date, b.date) {
        (Some(ref a_date), Some(ref b_date)) => b_date.cmp(a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.title.cmp(&a.title),
    }
}
