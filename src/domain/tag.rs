//! Tag usage counters driving autocomplete and trending tag lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag with its usage counter.
///
/// Created lazily on first use; `usage_count` is monotonic and is bumped
/// on every article save that includes the tag. Names are stored
/// case-folded so lookups are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Case-folded unique name
    pub name: String,

    /// How many article saves have included this tag
    pub usage_count: u64,

    /// When the tag last appeared in a save
    pub last_used_at: DateTime<Utc>,
}

impl Tag {
    /// Create a tag on first use
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage_count: 1,
            last_used_at: Utc::now(),
        }
    }

    /// Record another use
    pub fn touch(&mut self) {
        self.usage_count += 1;
        self.last_used_at = Utc::now();
    }
}
