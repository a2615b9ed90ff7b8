//! Tag usage tracking for autocomplete and trending tag lists.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::Tag;
use crate::error::Result;
use crate::store::TagStore;

/// Autocomplete returns at most this many tags
const AUTOCOMPLETE_LIMIT: usize = 10;

/// Usage counters over the tag collaborator
pub struct TagService {
    tags: Arc<dyn TagStore>,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagStore>) -> Self {
        Self { tags }
    }

    /// Record one save's tag set: create-if-absent at usage 1, otherwise
    /// increment and refresh the recency marker.
    ///
    /// Usage is counted on every save that includes the tag, not diffed
    /// against the article's previous tag set — re-saving unchanged tags
    /// bumps the counters again, treating repeat saves as a popularity
    /// signal. Callers wanting delta semantics must diff before calling.
    pub async fn record_usage(&self, tags: &BTreeSet<String>) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }
        debug!(count = tags.len(), "Recording tag usage");
        self.tags.record_usage(tags).await
    }

    /// Top tags matching a prefix, by usage count
    pub async fn autocomplete(&self, prefix: &str) -> Result<Vec<Tag>> {
        self.tags.autocomplete(prefix, AUTOCOMPLETE_LIMIT).await
    }

    /// Most used tags, most recently used breaking ties
    pub async fn trending(&self, limit: usize) -> Result<Vec<Tag>> {
        self.tags.trending(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tag_set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_repeat_saves_keep_counting() {
        let store = Arc::new(MemoryStore::new());
        let service = TagService::new(store);

        for _ in 0..3 {
            service.record_usage(&tag_set(&["rust"])).await.unwrap();
        }

        let trending = service.trending(10).await.unwrap();
        assert_eq!(trending[0].name, "rust");
        assert_eq!(trending[0].usage_count, 3);
    }

    #[tokio::test]
    async fn test_autocomplete_caps_at_ten() {
        let store = Arc::new(MemoryStore::new());
        let service = TagService::new(store);

        for i in 0..15 {
            service
                .record_usage(&tag_set(&[&format!("tag{:02}", i)]))
                .await
                .unwrap();
        }

        let matches = service.autocomplete("tag").await.unwrap();
        assert_eq!(matches.len(), 10);
    }

    #[tokio::test]
    async fn test_trending_orders_by_usage() {
        let store = Arc::new(MemoryStore::new());
        let service = TagService::new(store);

        service.record_usage(&tag_set(&["rare"])).await.unwrap();
        for _ in 0..5 {
            service.record_usage(&tag_set(&["popular"])).await.unwrap();
        }

        let trending = service.trending(2).await.unwrap();
        let names: Vec<&str> = trending.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["popular", "rare"]);
    }
}
