//! User profiles exposed by the identity collaborator.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How often a user wants digest notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    /// Per-event notifications, no digest
    Immediate,

    /// One digest per day
    Daily,

    /// One digest per week
    Weekly,
}

impl Default for DigestFrequency {
    fn default() -> Self {
        Self::Immediate
    }
}

/// Read model of a platform user.
///
/// Authentication and session handling live with the identity
/// collaborator; the engine only consumes the resolved profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,

    /// Unique handle
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Ids of users this user follows
    #[serde(default)]
    pub following: BTreeSet<Uuid>,

    /// Whether the account is active
    pub active: bool,

    /// Digest delivery preference
    #[serde(default)]
    pub digest_frequency: DigestFrequency,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create an active profile
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            following: BTreeSet::new(),
            active: true,
            digest_frequency: DigestFrequency::default(),
            created_at: Utc::now(),
        }
    }

    /// Set the digest preference
    pub fn with_digest_frequency(mut self, frequency: DigestFrequency) -> Self {
        self.digest_frequency = frequency;
        self
    }

    /// Whether this user follows the given author
    pub fn follows(&self, author_id: Uuid) -> bool {
        self.following.contains(&author_id)
    }
}
