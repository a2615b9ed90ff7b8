//! Collaborator seams for identity lookup and persistence.
//!
//! The engine never owns entity state across calls; it consumes these
//! traits and leaves durability, isolation, and the follow graph to the
//! implementations. [`MemoryStore`] is the in-crate reference
//! implementation backing the CLI and the test suite.

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Article, ArticleVersion, EngagementType, Page, Tag, UserProfile};
use crate::error::Result;

pub use memory::MemoryStore;

/// Field the store orders filtered results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    PublishedAt,
    CreatedAt,
    ViewCount,
}

/// Direction of an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Conjunctive filter for the advanced search query.
///
/// Absent fields are wildcards; present fields are AND-combined.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive substring matched against title OR content
    pub keywords: Option<String>,

    /// Exact author (already resolved from a username)
    pub author_id: Option<Uuid>,

    /// Lower publish-date bound (inclusive)
    pub from_date: Option<DateTime<Utc>>,

    /// Upper publish-date bound (inclusive)
    pub to_date: Option<DateTime<Utc>>,

    /// Restrict to published articles
    pub published_only: bool,

    pub sort: SortField,
    pub order: SortOrder,
}

pub(crate) fn published_key(article: &Article) -> DateTime<Utc> {
    article.published_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Order a complete article set by one field. Unpublished articles sort
/// as oldest when ordering by publish date.
pub fn sort_articles(articles: &mut [Article], sort: SortField, order: SortOrder) {
    articles.sort_by(|a, b| {
        let ordering = match sort {
            SortField::PublishedAt => published_key(a).cmp(&published_key(b)),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::ViewCount => a.view_count.cmp(&b.view_count),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Resolves caller identities to user profiles and exposes the follow
/// graph. Authentication itself happens upstream; the engine only ever
/// sees already-authenticated identities.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Add a profile; usernames and emails are unique
    async fn register(&self, profile: UserProfile) -> Result<()>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>>;

    /// Resolve an opaque identity (email or username) to a profile
    async fn resolve(&self, identity: &str) -> Result<Option<UserProfile>>;

    /// All registered profiles, for batch callers
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// Record that `follower` follows `followee`
    async fn follow(&self, follower: Uuid, followee: Uuid) -> Result<()>;
}

/// Article persistence: CRUD plus the candidate-set queries the ranking
/// and feed composer pulls from.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert(&self, article: Article) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Article>>;

    /// Replace a stored article; NotFound when the id is unknown
    async fn update(&self, article: Article) -> Result<()>;

    async fn remove(&self, id: Uuid) -> Result<()>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Atomically bump the view counter, returning the new value
    async fn increment_view_count(&self, id: Uuid) -> Result<u64>;

    /// All of one author's articles, newest first
    async fn by_author(&self, author_id: Uuid, page: usize, size: usize) -> Result<Page<Article>>;

    /// One author's unpublished drafts, most recently updated first
    async fn drafts_by_author(&self, author_id: Uuid) -> Result<Vec<Article>>;

    /// Published articles, most recently published first
    async fn published(&self, page: usize, size: usize) -> Result<Page<Article>>;

    /// The complete published set, for merge-based feed composition
    async fn all_published(&self) -> Result<Vec<Article>>;

    /// The complete published set restricted to the given authors
    async fn published_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Article>>;

    /// Published articles whose title or content contains the query
    async fn search(&self, query: &str, page: usize, size: usize) -> Result<Page<Article>>;

    async fn advanced_search(
        &self,
        filter: &SearchFilter,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>>;

    /// Published articles carrying every tag in the set
    async fn by_tags(
        &self,
        tags: &BTreeSet<String>,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>>;

    /// Published articles by view count, publish date as tiebreak
    async fn trending(&self, page: usize, size: usize) -> Result<Page<Article>>;

    /// Published articles by publish date
    async fn recent(&self, page: usize, size: usize) -> Result<Page<Article>>;
}

/// Version snapshot persistence.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Snapshot the article's current content fields. The version number
    /// is reserved and assigned in the same atomic step as the insert,
    /// so concurrent snapshots of one article cannot collide.
    async fn append_snapshot(
        &self,
        article: &Article,
        editor_email: &str,
        change_description: &str,
    ) -> Result<ArticleVersion>;

    /// All snapshots for an article, newest first
    async fn list_for_article(&self, article_id: Uuid) -> Result<Vec<ArticleVersion>>;

    async fn get(&self, article_id: Uuid, version_number: u32) -> Result<Option<ArticleVersion>>;

    /// Remove one snapshot without renumbering the rest; false when the
    /// version does not exist
    async fn remove(&self, article_id: Uuid, version_number: u32) -> Result<bool>;

    /// Cascade delete with the parent article
    async fn remove_for_article(&self, article_id: Uuid) -> Result<()>;
}

/// Engagement row persistence.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Atomic increment-if-below-cap for one user's claps on one
    /// article; creates the row at count 1, and silently holds at `max`.
    /// Returns the resulting count.
    async fn record_clap(&self, article_id: Uuid, user_id: Uuid, max: u32) -> Result<u32>;

    /// Upsert a non-repeatable engagement row, refreshing its timestamp
    /// when it already exists. Returns true when a new row was created.
    async fn touch(&self, article_id: Uuid, user_id: Uuid, kind: EngagementType) -> Result<bool>;

    /// Distinct engaging rows of one type for an article
    async fn count_by_type(&self, article_id: Uuid, kind: EngagementType) -> Result<u64>;

    /// Total claps across all users for an article
    async fn sum_claps(&self, article_id: Uuid) -> Result<u64>;
}

/// Tag usage persistence.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Create-or-increment each tag in one atomic step per tag
    async fn record_usage(&self, names: &BTreeSet<String>) -> Result<()>;

    async fn get(&self, name: &str) -> Result<Option<Tag>>;

    /// Prefix-matched tags by usage count
    async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<Tag>>;

    /// Most used tags, recency as tiebreak
    async fn trending(&self, limit: usize) -> Result<Vec<Tag>>;
}
