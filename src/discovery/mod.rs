//! Ranking and feed composition.
//!
//! Stateless over each call: candidate sets are pulled from the
//! persistence collaborator, merged, deduplicated, and ordered. The
//! personalized feed merges its complete candidate sources before
//! pagination, so page windows are stable and `total` reflects the
//! merged set.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::content::analysis::{self, ReadingLevel};
use crate::domain::{Article, EngagementType, Page, UserProfile};
use crate::engagement::engagement_rate;
use crate::error::{Error, Result};
use crate::store::{
    sort_articles, ArticleStore, EngagementStore, IdentityStore, SearchFilter, SortField,
    SortOrder,
};

/// Caller-facing advanced search query. Absent fields are wildcards; all
/// present filters are AND-combined.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against title OR content
    pub keywords: Option<String>,

    /// Exact author username
    pub author_username: Option<String>,

    /// Publish-date lower bound (inclusive)
    pub from_date: Option<DateTime<Utc>>,

    /// Publish-date upper bound (inclusive)
    pub to_date: Option<DateTime<Utc>>,

    /// Restrict to published articles
    pub published_only: bool,

    pub sort: SortField,
    pub order: SortOrder,
}

/// Which candidate sources feed the personalized merge
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Articles by authors the user follows
    pub include_followed_authors: bool,

    /// Tag-follow relationships are not modeled; this source stands in
    /// with generally-published articles
    pub include_followed_tags: bool,

    /// Trending candidates
    pub include_trending: bool,

    /// Ordering applied to the merged set
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            include_followed_authors: true,
            include_followed_tags: true,
            include_trending: true,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

/// Derived display metrics for one published article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleStats {
    pub article_id: Uuid,
    pub view_count: u64,
    pub formatted_view_count: String,
    pub read_time_minutes: u32,

    /// Distinct engaging rows per type
    pub engagement: BTreeMap<EngagementType, u64>,

    /// Weighted engagement percentage over views. Comment threads live
    /// with an external collaborator, so they contribute 0 here.
    pub engagement_rate: f64,

    pub total_claps: u64,
    pub quality_score: f64,
    pub reading_level: ReadingLevel,
}

/// Read-side composition over the persistence and identity collaborators
pub struct DiscoveryService {
    identity: Arc<dyn IdentityStore>,
    articles: Arc<dyn ArticleStore>,
    engagements: Arc<dyn EngagementStore>,
}

impl DiscoveryService {
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

    /// Published articles by view count, publish date breaking ties
    pub async fn trending(&self, page: usize, size: usize) -> Result<Page<Article>> {
        self.articles.trending(page, size).await
    }

    /// Published articles by publish date
    pub async fn recent(&self, page: usize, size: usize) -> Result<Page<Article>> {
        self.articles.recent(page, size).await
    }

    /// Conjunctive filtered search. An author username that resolves to
    /// no user matches nothing.
    pub async fn advanced_search(
        &self,
        query: &SearchQuery,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let author_id = match &query.author_username {
            Some(username) => match self.identity.find_by_username(username).await? {
                Some(user) => Some(user.id),
                None => return Ok(Page::empty(page, size)),
            },
            None => None,
        };

        let filter = SearchFilter {
            keywords: query.keywords.clone(),
            author_id,
            from_date: query.from_date,
            to_date: query.to_date,
            published_only: query.published_only,
            sort: query.sort,
            order: query.order,
        };

        self.articles.advanced_search(&filter, page, size).await
    }

    /// Published articles carrying every queried tag
    pub async fn search_by_tags(
        &self,
        tags: &BTreeSet<String>,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let folded: BTreeSet<String> = tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        self.articles.by_tags(&folded, page, size).await
    }

    /// Compose a personalized feed from up to three candidate sources,
    /// deduplicated by article identity and ordered as requested
    /// (publish date descending by default).
    ///
    /// Each source contributes its complete candidate set before the
    /// merge; pagination happens once, over the merged ordering.
    #[instrument(skip(self, options), fields(user = %user_identity))]
    pub async fn personalized_feed(
        &self,
        user_identity: &str,
        options: &FeedOptions,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let user = self.resolve_user(user_identity).await?;

        let mut candidates: Vec<Article> = Vec::new();

        if options.include_followed_authors && !user.following.is_empty() {
            let followed: Vec<Uuid> = user.following.iter().copied().collect();
            candidates.extend(self.articles.published_by_authors(&followed).await?);
        }

        if options.include_followed_tags {
            candidates.extend(self.articles.all_published().await?);
        }

        if options.include_trending {
            candidates.extend(self.articles.all_published().await?);
        }

        let mut seen = BTreeSet::new();
        candidates.retain(|article| seen.insert(article.id));

        debug!(candidates = candidates.len(), "Feed candidates merged");

        sort_articles(&mut candidates, options.sort, options.order);
        Ok(Page::from_complete(candidates, page, size))
    }

    /// Derived display metrics for one published article. Reading the
    /// stats is not a qualifying read and does not bump the view counter.
    pub async fn article_stats(&self, slug: &str) -> Result<ArticleStats> {
        let article = self
            .articles
            .find_by_slug(slug)
            .await?
            .filter(|a| a.published)
            .ok_or_else(|| Error::not_found("article", slug))?;

        let mut engagement = BTreeMap::new();
        for kind in EngagementType::ALL {
            let count = self.engagements.count_by_type(article.id, kind).await?;
            engagement.insert(kind, count);
        }

        let likes = engagement[&EngagementType::Like];
        let shares = engagement[&EngagementType::Share];

        Ok(ArticleStats {
            article_id: article.id,
            view_count: article.view_count,
            formatted_view_count: analysis::format_view_count(article.view_count),
            read_time_minutes: article.read_time_minutes,
            engagement_rate: engagement_rate(article.view_count, likes, 0, shares),
            engagement,
            total_claps: self.engagements.sum_claps(article.id).await?,
            quality_score: analysis::quality_score(&article.content),
            reading_level: analysis::reading_level(&article.content),
        })
    }
}
