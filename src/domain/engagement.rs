//! Per-user engagement rows and the clap cap.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Maximum claps one user may give one article
pub const MAX_CLAPS: u32 = 50;

/// Kinds of recorded reader interaction.
///
/// All types except `Clap` are non-repeatable: at most one row exists per
/// (article, user, type), and re-engaging only refreshes its timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EngagementType {
    /// User viewed the article
    View,

    /// User liked the article
    Like,

    /// User bookmarked the article
    Bookmark,

    /// User shared the article
    Share,

    /// User clapped (repeatable, capped at [`MAX_CLAPS`] per user)
    Clap,
}

impl EngagementType {
    /// All engagement types, for stat aggregation
    pub const ALL: [EngagementType; 5] = [
        EngagementType::View,
        EngagementType::Like,
        EngagementType::Bookmark,
        EngagementType::Share,
        EngagementType::Clap,
    ];

    /// Whether repeated engagement accumulates a count
    pub fn is_repeatable(self) -> bool {
        matches!(self, EngagementType::Clap)
    }

    /// Lowercase label used in stat maps and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            EngagementType::View => "view",
            EngagementType::Like => "like",
            EngagementType::Bookmark => "bookmark",
            EngagementType::Share => "share",
            EngagementType::Clap => "clap",
        }
    }
}

impl std::fmt::Display for EngagementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EngagementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(EngagementType::View),
            "like" => Ok(EngagementType::Like),
            "bookmark" => Ok(EngagementType::Bookmark),
            "share" => Ok(EngagementType::Share),
            "clap" => Ok(EngagementType::Clap),
            other => Err(Error::invalid_argument(format!(
                "Invalid engagement type: {}",
                other
            ))),
        }
    }
}

/// One recorded interaction between a user and an article.
///
/// For `Clap` rows `count` carries the accumulated claps (1..=50); for
/// every other type it is always 1 and the row itself is the signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEngagement {
    pub article_id: Uuid,
    pub user_id: Uuid,
    pub kind: EngagementType,

    /// Clap count for clap rows, 1 otherwise
    pub count: u32,

    /// Refreshed on idempotent re-engagement
    pub created_at: DateTime<Utc>,
}

impl ArticleEngagement {
    /// Record a first interaction of the given kind
    pub fn new(article_id: Uuid, user_id: Uuid, kind: EngagementType) -> Self {
        Self {
            article_id,
            user_id,
            kind,
            count: 1,
            created_at: Utc::now(),
        }
    }
}
