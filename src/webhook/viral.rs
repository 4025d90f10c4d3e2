use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    post::{parse_date, FrontMatter, Priority, ViralMetrics, ViralSummary},
    slug,
};

use super::{
    capitalize, group_thousands, iso_timestamp, tidy_markdown, NewArticle, Outcome, Prepared,
    Rejected, Skipped,
};

pub(crate) const ENGAGEMENT_THRESHOLD: f64 = 70.0;
pub(crate) const URGENT_ENGAGEMENT: f64 = 90.0;
pub(crate) const VIRAL_AUTHOR: &str = "Viral Content Bot";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Platform {
    Twitter,
    Instagram,
    Tiktok,
    Youtube,
    Reddit,
    Facebook,
}

impl Platform {
    fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::Reddit => "reddit",
            Self::Facebook => "facebook",
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ContentType {
    Video,
    Image,
    Text,
    Meme,
}

impl ContentType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Text => "text",
            Self::Meme => "meme",
        }
    }
}

/// Trending social-media item pushed by a scraper.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct ViralPayload {
    pub title: String,
    pub description: String,
    pub source_url: String,
    pub engagement_score: f64,
    pub platform: Platform,
    pub content_type: ContentType,
    #[serde(default)]
    pub trending_keywords: Vec<String>,
    #[serde(default)]
    pub related_teams: Vec<String>,
    #[serde(default)]
    pub related_players: Vec<String>,
    #[serde(default)]
    pub viral_metrics: ViralMetrics,
    pub detected_at: String,
}

impl ViralPayload {
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<Outcome, Rejected> {
        if !(0.0..=100.0).contains(&self.engagement_score) {
            return Err(Rejected(format!(
                "engagement_score must be between 0 and 100, got {}",
                self.engagement_score
            )));
        }
        if self.title.trim().is_empty() {
            return Err(Rejected("Missing required field: title".to_string()));
        }
        if self.engagement_score < ENGAGEMENT_THRESHOLD {
            return Ok(Outcome::Skip(Skipped {
                message: "Content engagement score too low for publication".to_string(),
                engagement_score: self.engagement_score,
                threshold: ENGAGEMENT_THRESHOLD,
            }));
        }

        let title = format!("🔥 VIRAL: {}", self.title);
        let urgent = self.engagement_score >= URGENT_ENGAGEMENT;
        let priority = if urgent { Priority::Urgent } else { Priority::High };
        let platform = self.platform.as_str();
        let content_type = self.content_type.as_str();

        let metric = |label: &str, value: Option<u64>, icon: &str| {
            value
                .map(|v| format!("- **{label}:** {} {icon}", group_thousands(v)))
                .unwrap_or_default()
        };
        let detected = parse_date(&self.detected_at)
            .map(|d| d.format("%-d %B %Y %H:%M %Z").to_string())
            .unwrap_or_else(|| self.detected_at.clone());

        let mut lines = vec![
            format!("# {title}"),
            String::new(),
            format!("**🔥 Viral Alert!** This is trending across {platform}!"),
            String::new(),
            format!("**Engagement Score:** {}/100 📊", self.engagement_score),
            format!("**Platform:** {} 📱", capitalize(platform)),
            format!("**Content Type:** {} 🎯", capitalize(content_type)),
            String::new(),
            "## What's Going Viral?".to_string(),
            String::new(),
            self.description.clone(),
            String::new(),
            "### 📈 Viral Metrics:".to_string(),
            metric("Views", self.viral_metrics.views, "👀"),
            metric("Likes", self.viral_metrics.likes, "❤️"),
            metric("Shares", self.viral_metrics.shares, "🔄"),
            metric("Comments", self.viral_metrics.comments, "💬"),
        ];
        for (heading, names) in [
            ("### 🏆 Teams Involved:", &self.related_teams),
            ("### ⚽ Players Mentioned:", &self.related_players),
        ] {
            if names.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(heading.to_string());
            lines.extend(names.iter().map(|n| format!("- {n}")));
        }
        if !self.trending_keywords.is_empty() {
            lines.push(String::new());
            lines.push("### 🔥 Trending Keywords:".to_string());
            lines.push(
                self.trending_keywords
                    .iter()
                    .map(|k| format!("#{k}"))
                    .collect::<Vec<_>>()
                    .join(" • "),
            );
        }
        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            format!("**Source:** [View Original Content]({})", self.source_url),
            String::new(),
            "*This content is trending NOW! Join the conversation and share your thoughts!*"
                .to_string(),
            String::new(),
            format!("**Detected:** {detected}"),
        ]);

        let mut tags = self.trending_keywords.clone();
        tags.extend([
            "viral".to_string(),
            platform.to_string(),
            content_type.to_string(),
        ]);

        let front_matter = FrontMatter {
            title: Some(title.clone()),
            date: Some(iso_timestamp(now)),
            excerpt: Some(format!(
                "🔥 Viral football content trending on {platform} with {}/100 engagement score",
                self.engagement_score
            )),
            category: Some("viral".to_string()),
            tags,
            featured: urgent,
            priority: Some(priority),
            author: Some(VIRAL_AUTHOR.to_string()),
            viral_data: Some(ViralSummary {
                platform: platform.to_string(),
                engagement_score: self.engagement_score,
                content_type: content_type.to_string(),
                source_url: self.source_url.clone(),
                detected_at: self.detected_at.clone(),
                metrics: self.viral_metrics.clone(),
            }),
            ..Default::default()
        };

        Ok(Outcome::Publish(Prepared {
            article: NewArticle {
                slug: format!(
                    "viral-{}-{}",
                    slug::slugify(&self.title),
                    now.timestamp_millis()
                ),
                front_matter,
                body: tidy_markdown(&lines),
            },
            title,
            priority: Some(priority),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload(score: f64) -> ViralPayload {
        ViralPayload {
            title: "Messi Incredible Free Kick Goal".to_string(),
            description: "Fans are going crazy!".to_string(),
            source_url: "https://twitter.com/example/status/123".to_string(),
            engagement_score: score,
            platform: Platform::Twitter,
            content_type: ContentType::Video,
            trending_keywords: vec!["Messi".to_string(), "GOAT".to_string()],
            related_teams: vec!["Inter Miami".to_string()],
            related_players: vec![],
            viral_metrics: ViralMetrics {
                views: Some(2_500_000),
                likes: Some(180_000),
                ..Default::default()
            },
            detected_at: "2025-01-15T10:00:00Z".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_736_935_200_000).unwrap()
    }

    #[test]
    fn low_engagement_is_skipped() {
        match payload(69.0).prepare(now()).unwrap() {
            Outcome::Skip(skipped) => {
                assert_eq!(skipped.engagement_score, 69.0);
                assert_eq!(skipped.threshold, ENGAGEMENT_THRESHOLD);
            }
            Outcome::Publish(_) => panic!("score below threshold was published"),
        }
    }

    #[test]
    fn high_engagement_is_published() {
        let Outcome::Publish(prepared) = payload(75.0).prepare(now()).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(prepared.title, "🔥 VIRAL: Messi Incredible Free Kick Goal");
        assert_eq!(prepared.priority, Some(Priority::High));
        assert_eq!(
            prepared.article.slug,
            "viral-messi-incredible-free-kick-goal-1736935200000"
        );
        let body = &prepared.article.body;
        assert!(body.contains("- **Views:** 2,500,000 👀"));
        assert!(!body.contains("Shares"));
        assert!(body.contains("- Inter Miami"));
        assert!(!body.contains("Players Mentioned"));
        assert!(body.contains("#Messi • #GOAT"));
        let fm = &prepared.article.front_matter;
        assert!(!fm.featured);
        assert_eq!(fm.tags, vec!["Messi", "GOAT", "viral", "twitter", "video"]);
    }

    #[test]
    fn very_high_engagement_is_urgent_and_featured() {
        let Outcome::Publish(prepared) = payload(95.0).prepare(now()).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(prepared.priority, Some(Priority::Urgent));
        assert!(prepared.article.front_matter.featured);
    }

    #[test]
    fn scores_outside_0_to_100_are_rejected() {
        assert!(payload(100.5).prepare(now()).is_err());
        assert!(payload(-1.0).prepare(now()).is_err());
    }

    #[test]
    fn fractional_scores_use_the_same_thresholds() {
        let Outcome::Publish(prepared) = payload(85.5).prepare(now()).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(prepared.priority, Some(Priority::High));
        assert!(prepared.article.body.contains("**Engagement Score:** 85.5/100"));
        assert_eq!(
            prepared.article.front_matter.viral_data.as_ref().unwrap().engagement_score,
            85.5
        );
        assert!(matches!(
            payload(69.9).prepare(now()).unwrap(),
            Outcome::Skip(_)
        ));
        let Outcome::Publish(urgent) = payload(90.0).prepare(now()).unwrap() else {
            panic!("expected publish");
        };
        assert_eq!(urgent.priority, Some(Priority::Urgent));
        assert!(urgent.article.body.contains("**Engagement Score:** 90/100"));
    }
}
