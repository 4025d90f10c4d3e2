use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    post::{parse_date, FrontMatter, Priority, TransferSummary},
    slug,
};

use super::{iso_timestamp, tidy_markdown, NewArticle, Prepared, Rejected};

pub(crate) const TRANSFER_AUTHOR: &str = "Transfer News Bot";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TransferStatus {
    Rumor,
    Confirmed,
    Completed,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rumor => "rumor",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
        }
    }

    fn priority(self) -> Priority {
        match self {
            Self::Rumor => Priority::Low,
            Self::Confirmed => Priority::High,
            Self::Completed => Priority::Urgent,
        }
    }

    fn excerpt(self) -> &'static str {
        match self {
            Self::Rumor => "Latest transfer rumors and speculation",
            Self::Confirmed => "Official transfer confirmation",
            Self::Completed => "Transfer completed - all details confirmed",
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Transfer story pushed by a transfer-news monitor.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct TransferPayload {
    pub player: String,
    pub from_club: String,
    pub to_club: String,
    pub status: TransferStatus,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub contract_length: Option<String>,
    #[serde(default)]
    pub source_reliability: Option<Reliability>,
    #[serde(default)]
    pub announcement_date: Option<String>,
}

fn line_if<T: AsRef<str>>(value: &Option<T>, f: impl FnOnce(&str) -> String) -> String {
    value.as_ref().map(|v| f(v.as_ref())).unwrap_or_default()
}

impl TransferPayload {
    fn rumor(&self) -> (String, Vec<String>) {
        let (player, from, to) = (&self.player, &self.from_club, &self.to_club);
        let title = format!("RUMOR: {player} Linked with Move from {from} to {to}");
        let reliability = self.source_reliability.unwrap_or(Reliability::Medium);
        let lines = vec![
            format!("# {title}"),
            String::new(),
            "**Status:** Transfer Rumor ⏳".to_string(),
            format!("**Player:** {player}"),
            format!("**Current Club:** {from}"),
            format!("**Target Club:** {to}"),
            line_if(&self.fee, |fee| format!("**Reported Fee:** {fee}")),
            line_if(&self.position, |pos| format!("**Position:** {pos}")),
            String::new(),
            "## Transfer Rumor Details".to_string(),
            String::new(),
            format!("Reports suggest that {to} are interested in signing {player} from {from}."),
            String::new(),
            match &self.fee {
                Some(fee) => format!("The potential transfer fee is reported to be around {fee}."),
                None => "The financial details of the potential deal remain unclear.".to_string(),
            },
            String::new(),
            match &self.position {
                Some(pos) => format!(
                    "{player} plays as a {pos} and could be a valuable addition to {to}'s squad."
                ),
                None => format!("The player could be a valuable addition to {to}'s squad."),
            },
            String::new(),
            "### Key Information:".to_string(),
            format!(
                "- **Reliability:** {} 📊",
                reliability.as_str().to_uppercase()
            ),
            "- **Status:** Rumor stage".to_string(),
            "- **Timeline:** No official timeline confirmed".to_string(),
            String::new(),
            "*This is a developing story. We'll keep you updated with the latest developments.*"
                .to_string(),
        ];
        (title, lines)
    }

    fn confirmed(&self) -> (String, Vec<String>) {
        let (player, from, to) = (&self.player, &self.from_club, &self.to_club);
        let title = format!("CONFIRMED: {player} Signs for {to} from {from}");
        let lines = vec![
            format!("# {title}"),
            String::new(),
            "**Status:** Transfer Confirmed ✅".to_string(),
            format!("**Player:** {player}"),
            format!("**From:** {from}"),
            format!("**To:** {to}"),
            line_if(&self.fee, |fee| format!("**Transfer Fee:** {fee}")),
            line_if(&self.contract_length, |c| format!("**Contract Length:** {c}")),
            String::new(),
            "## Official Confirmation".to_string(),
            String::new(),
            format!("{to} have officially confirmed the signing of {player} from {from}!"),
            String::new(),
            line_if(&self.fee, |fee| format!("The transfer fee is reported to be {fee}.")),
            String::new(),
            line_if(&self.contract_length, |c| {
                format!("{player} has signed a {c} contract with {to}.")
            }),
            String::new(),
            "### Transfer Details:".to_string(),
            "- ✅ **Deal Confirmed**".to_string(),
            "- 📝 **Medical:** Completed".to_string(),
            format!(
                "- 🤝 **Contract:** {}",
                self.contract_length.as_deref().unwrap_or("Terms agreed")
            ),
            format!("- 💰 **Fee:** {}", self.fee.as_deref().unwrap_or("Undisclosed")),
            String::new(),
            format!("Welcome to {to}, {player}! 🎉"),
        ];
        (title, lines)
    }

    fn completed(&self) -> (String, Vec<String>) {
        let (player, from, to) = (&self.player, &self.from_club, &self.to_club);
        let title = format!("DONE DEAL: {player} Completes Move to {to}");
        let announced = self
            .announcement_date
            .as_deref()
            .and_then(parse_date)
            .map(|d| d.format("%-d %B %Y").to_string())
            .unwrap_or_else(|| "Today".to_string());
        let lines = vec![
            format!("# {title}"),
            String::new(),
            "**Status:** Transfer Completed ✅🔥".to_string(),
            format!("**Player:** {player}"),
            format!("**From:** {from}"),
            format!("**To:** {to}"),
            line_if(&self.fee, |fee| format!("**Final Fee:** {fee}")),
            line_if(&self.contract_length, |c| format!("**Contract:** {c}")),
            String::new(),
            "## Transfer Complete!".to_string(),
            String::new(),
            "🚨 **DONE DEAL!** 🚨".to_string(),
            String::new(),
            format!("{player} has officially completed the move from {from} to {to}!"),
            String::new(),
            line_if(&self.fee, |fee| format!("The final transfer fee is {fee}.")),
            String::new(),
            "### What This Means:".to_string(),
            format!("- 🎯 {to} have secured their target"),
            format!(
                "- 📈 Squad strengthened in {}",
                self.position.as_deref().unwrap_or("key position")
            ),
            format!(
                "- 🔴 {from} will receive {}",
                self.fee.as_deref().unwrap_or("compensation")
            ),
            String::new(),
            format!(
                "{}{player} brings experience and quality to {to}.",
                self.age
                    .map(|age| format!("At {age} years old, "))
                    .unwrap_or_default()
            ),
            String::new(),
            format!("**Official announcement:** {announced}"),
            String::new(),
            format!("Welcome to your new home, {player}! 🏠⚽"),
        ];
        (title, lines)
    }

    pub fn prepare(&self, now: DateTime<Utc>) -> Result<Prepared, Rejected> {
        if [&self.player, &self.from_club, &self.to_club]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(Rejected(
                "Missing required fields: player, from_club, to_club".to_string(),
            ));
        }

        let (title, lines) = match self.status {
            TransferStatus::Rumor => self.rumor(),
            TransferStatus::Confirmed => self.confirmed(),
            TransferStatus::Completed => self.completed(),
        };
        let status = self.status.as_str();
        let priority = self.status.priority();

        let tags = vec![
            self.player.clone(),
            self.from_club.clone(),
            self.to_club.clone(),
            format!("transfer-{status}"),
            self.position.clone().unwrap_or_else(|| "football".to_string()),
            "transfer".to_string(),
            status.to_string(),
        ];

        let front_matter = FrontMatter {
            title: Some(title.clone()),
            date: Some(iso_timestamp(now)),
            excerpt: Some(self.status.excerpt().to_string()),
            category: Some("transfer".to_string()),
            tags,
            featured: self.status != TransferStatus::Rumor,
            priority: Some(priority),
            author: Some(TRANSFER_AUTHOR.to_string()),
            transfer_data: Some(TransferSummary {
                player: self.player.clone(),
                from_club: self.from_club.clone(),
                to_club: self.to_club.clone(),
                status: status.to_string(),
                fee: self.fee.clone(),
                position: self.position.clone(),
                league: self.league.clone(),
                reliability: self
                    .source_reliability
                    .unwrap_or(Reliability::Medium)
                    .as_str()
                    .to_string(),
            }),
            ..Default::default()
        };

        Ok(Prepared {
            article: NewArticle {
                slug: slug::join(&[
                    self.player.as_str(),
                    self.from_club.as_str(),
                    "to",
                    self.to_club.as_str(),
                    status,
                ]),
                front_matter,
                body: tidy_markdown(&lines),
            },
            title,
            priority: Some(priority),
        })
    }
}
