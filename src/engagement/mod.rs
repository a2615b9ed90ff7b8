//! Engagement ledger: per-user interaction rows with the clap cap.
//!
//! Claps accumulate per (article, user) up to [`MAX_CLAPS`]; every other
//! engagement type is idempotent and only refreshes its timestamp on
//! repeat. Views additionally bump the article's view counter as part of
//! the same logical operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{EngagementType, UserProfile, MAX_CLAPS};
use crate::error::{Error, Result};
use crate::store::{ArticleStore, EngagementStore, IdentityStore};

/// Weighted engagement-to-views percentage: likes ×1, comments ×2,
/// shares ×3, over views. Defined as 0 when there are no views.
pub fn engagement_rate(views: u64, likes: u64, comments: u64, shares: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }

    let engagement = likes as f64 + comments as f64 * 2.0 + shares as f64 * 3.0;
    engagement / views as f64 * 100.0
}

/// Engagement recording and aggregation
pub struct EngagementService {
    identity: Arc<dyn IdentityStore>,
    articles: Arc<dyn ArticleStore>,
    engagements: Arc<dyn EngagementStore>,
}

impl EngagementService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        articles: Arc<dyn ArticleStore>,
        engagements: Arc<dyn EngagementStore>,
    ) -> Self {
        Self {
            identity,
            articles,
            engagements,
        }
    }

    async fn resolve_user(&self, identity: &str) -> Result<UserProfile> {
        self.identity
            .resolve(identity)
            .await?
            .ok_or_else(|| Error::not_found("user", identity))
    }

    async fn require_article(&self, article_id: Uuid) -> Result<()> {
        if self.articles.get(article_id).await?.is_none() {
            return Err(Error::not_found("article", article_id));
        }
        Ok(())
    }

    /// Record one engagement. Claps increment up to the cap and then
    /// silently hold; other types upsert their single row. A view also
    /// increments the article's view counter.
    #[instrument(skip(self), fields(article_id = %article_id, kind = %kind))]
    pub async fn record(
        &self,
        user_identity: &str,
        article_id: Uuid,
        kind: EngagementType,
    ) -> Result<()> {
        let user = self.resolve_user(user_identity).await?;
        self.require_article(article_id).await?;

        match kind {
            EngagementType::Clap => {
                let count = self
                    .engagements
                    .record_clap(article_id, user.id, MAX_CLAPS)
                    .await?;
                debug!(user = %user.username, count, "Clap recorded");
            }
            other => {
                self.engagements.touch(article_id, user.id, other).await?;
                if other == EngagementType::View {
                    self.articles.increment_view_count(article_id).await?;
                }
            }
        }

        Ok(())
    }

    /// Record an engagement from its string label, for callers working
    /// with raw request values. Unknown labels are an `InvalidArgument`.
    pub async fn record_label(
        &self,
        user_identity: &str,
        article_id: Uuid,
        label: &str,
    ) -> Result<()> {
        let kind: EngagementType = label.parse()?;
        self.record(user_identity, article_id, kind).await
    }

    /// Distinct engaging rows per type. For claps this counts users who
    /// clapped, not the clap total; see [`Self::total_claps`] for that.
    pub async fn stats_for(&self, article_id: Uuid) -> Result<BTreeMap<EngagementType, u64>> {
        self.require_article(article_id).await?;

        let mut stats = BTreeMap::new();
        for kind in EngagementType::ALL {
            let count = self.engagements.count_by_type(article_id, kind).await?;
            stats.insert(kind, count);
        }
        Ok(stats)
    }

    /// Sum of clap counts across all users for one article
    pub async fn total_claps(&self, article_id: Uuid) -> Result<u64> {
        self.require_article(article_id).await?;
        self.engagements.sum_claps(article_id).await
    }
}
