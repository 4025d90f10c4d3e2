use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    post::{FrontMatter, DEFAULT_AUTHOR},
    slug,
};

use super::{iso_date, NewArticle, Prepared, Rejected};

pub(crate) const DEFAULT_FEATURED_IMAGE: &str = "/images/default-football.jpg";

/// Free-form article pushed by RSS monitors or typed into the admin form.
#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct ArticlePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ArticlePayload {
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<Prepared, Rejected> {
        let (Some(title), Some(content), Some(category)) = (
            required(&self.title),
            required(&self.content),
            required(&self.category),
        ) else {
            return Err(Rejected(
                "Missing required fields: title, content, category".to_string(),
            ));
        };

        let front_matter = FrontMatter {
            title: Some(title.to_string()),
            date: Some(iso_date(now)),
            excerpt: Some(self.excerpt.clone().unwrap_or_default()),
            category: Some(category.to_string()),
            tags: self
                .tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            featured_image: Some(
                required(&self.featured_image)
                    .unwrap_or(DEFAULT_FEATURED_IMAGE)
                    .to_string(),
            ),
            author: Some(required(&self.author).unwrap_or(DEFAULT_AUTHOR).to_string()),
            ..Default::default()
        };

        Ok(Prepared {
            article: NewArticle {
                slug: slug::post_id(title, now),
                front_matter,
                body: content.to_string(),
            },
            title: title.to_string(),
            priority: None,
        })
    }
}
