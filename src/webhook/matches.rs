use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    post::{parse_date, FrontMatter, MatchSummary, DEFAULT_AUTHOR},
    slug,
};

use super::{iso_timestamp, tidy_markdown, NewArticle, Prepared, Rejected};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EventKind {
    Goal,
    Card,
    Substitution,
}

impl EventKind {
    fn label(self) -> &'static str {
        match self {
            Self::Goal => "GOAL",
            Self::Card => "CARD",
            Self::Substitution => "SUBSTITUTION",
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub(crate) struct Score {
    pub home: u32,
    pub away: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct MatchEvent {
    pub minute: u32,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub player: String,
    pub team: String,
}

/// Fixture or result pushed by a match-data feed.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct MatchPayload {
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub venue: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub score: Option<Score>,
    #[serde(default)]
    pub events: Vec<MatchEvent>,
}

impl MatchPayload {
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<Prepared, Rejected> {
        let match_date = parse_date(&self.date)
            .ok_or_else(|| Rejected(format!("Invalid match date: {}", self.date)))?;
        let day = match_date.format("%Y-%m-%d").to_string();
        let display_day = match_date.format("%-d %B %Y").to_string();
        let (home, away, league) = (&self.home_team, &self.away_team, &self.league);

        let (title, kind, lines) = match (self.status, self.score) {
            (MatchStatus::Scheduled, _) => {
                let title = format!("Preview: {home} vs {away} - {league}");
                let lines = vec![
                    format!("# {title}"),
                    String::new(),
                    format!("**Match Date:** {display_day}"),
                    format!("**Kick-off Time:** {}", self.time),
                    format!("**League:** {league}"),
                    self.venue
                        .as_ref()
                        .map(|v| format!("**Venue:** {v}"))
                        .unwrap_or_default(),
                    String::new(),
                    "## Match Preview".to_string(),
                    String::new(),
                    format!(
                        "{home} will face {away} in what promises to be an exciting {league} encounter."
                    ),
                    String::new(),
                    "### Key Points:".to_string(),
                    format!("- **Home Team:** {home}"),
                    format!("- **Away Team:** {away}"),
                    format!("- **Competition:** {league}"),
                    String::new(),
                    "Stay tuned for live updates during the match!".to_string(),
                ];
                (title, "preview", lines)
            }
            (MatchStatus::Finished, Some(score)) => {
                let result = format!("{}-{}", score.home, score.away);
                let title = format!("{home} {result} {away} - Match Report");
                let verb = match score.home.cmp(&score.away) {
                    std::cmp::Ordering::Greater => "defeated",
                    std::cmp::Ordering::Less => "lost to",
                    std::cmp::Ordering::Equal => "drew with",
                };
                let mut lines = vec![
                    format!("# {title}"),
                    String::new(),
                    format!("**Final Score:** {home} {result} {away}"),
                    format!("**League:** {league}"),
                    format!("**Date:** {display_day}"),
                    String::new(),
                    "## Match Report".to_string(),
                    String::new(),
                    format!("{home} {verb} {away} {result} in a thrilling {league} encounter."),
                    String::new(),
                    "### Match Statistics:".to_string(),
                    format!("- **Final Score:** {result}"),
                    format!("- **Competition:** {league}"),
                ];
                if !self.events.is_empty() {
                    lines.push(String::new());
                    lines.push("### Key Events:".to_string());
                    lines.extend(self.events.iter().map(|e| {
                        format!("- {}' {}: {} ({})", e.minute, e.kind.label(), e.player, e.team)
                    }));
                }
                (title, "report", lines)
            }
            (MatchStatus::Finished, None) => {
                return Err(Rejected("Finished matches require a score".to_string()))
            }
            (MatchStatus::Live, _) => {
                return Err(Rejected(
                    "Live matches are not published; send scheduled or finished".to_string(),
                ))
            }
        };

        let status = self.status.as_str();
        let front_matter = FrontMatter {
            title: Some(title.clone()),
            date: Some(iso_timestamp(now)),
            excerpt: Some(
                if self.status == MatchStatus::Scheduled {
                    "Match preview and key information"
                } else {
                    "Full match report with final score and highlights"
                }
                .to_string(),
            ),
            category: Some("match".to_string()),
            tags: vec![
                home.clone(),
                away.clone(),
                league.clone(),
                format!("match-{status}"),
                "match".to_string(),
                kind.to_string(),
            ],
            featured: self.status == MatchStatus::Finished,
            author: Some(DEFAULT_AUTHOR.to_string()),
            match_data: Some(MatchSummary {
                home_team: home.clone(),
                away_team: away.clone(),
                league: league.clone(),
                status: status.to_string(),
                score: self.score.map(|s| format!("{}-{}", s.home, s.away)),
            }),
            ..Default::default()
        };

        Ok(Prepared {
            article: NewArticle {
                slug: format!("{}-vs-{}-{day}", slug::slugify(home), slug::slugify(away)),
                front_matter,
                body: tidy_markdown(&lines),
            },
            title,
            priority: None,
        })
    }
}
