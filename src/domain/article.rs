//! Articles and their immutable version snapshots.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A piece of content owned by exactly one author.
///
/// Invariants: the slug is unique across all articles, and `published`
/// articles always carry a `published_at` timestamp (cleared again on
/// unpublish).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: Uuid,

    /// Article title
    pub title: String,

    /// Markup body (Markdown)
    pub content: String,

    /// Short excerpt shown in listings
    pub summary: String,

    /// Case-folded, deduplicated tag set
    pub tags: BTreeSet<String>,

    /// URL of the cover image, if any
    pub cover_image_url: Option<String>,

    /// URL-safe unique identifier derived from the title
    pub slug: String,

    /// Whether the article is visible to readers
    pub published: bool,

    /// Owning author (user id from the identity collaborator)
    pub author_id: Uuid,

    /// Set when published, cleared when unpublished
    pub published_at: Option<DateTime<Utc>>,

    /// Estimated reading time in minutes (derived from content)
    pub read_time_minutes: u32,

    /// Monotonic counter, incremented on each qualifying read
    pub view_count: u64,

    /// When the article was created
    pub created_at: DateTime<Utc>,

    /// When the article was last modified
    pub updated_at: DateTime<Utc>,

    /// Draft autosave marker
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Create a new unpublished article shell for an author
    pub fn new(author_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            content: String::new(),
            summary: String::new(),
            tags: BTreeSet::new(),
            cover_image_url: None,
            slug: String::new(),
            published: false,
            author_id,
            published_at: None,
            read_time_minutes: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
            last_saved_at: None,
        }
    }

    /// Whether the given user owns this article
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Caller-supplied article fields for create/update/autosave operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl ArticleInput {
    /// Create an input payload with just title and content
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Add tags (case-folded on save)
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Set the cover image URL
    pub fn with_cover_image(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }

    /// Mark the article for immediate publication
    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// Tag set normalized the way articles store it: trimmed,
    /// case-folded, empties dropped.
    pub fn normalized_tags(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Immutable snapshot of an article's content fields.
///
/// Version numbers are 1-based and strictly increasing per article;
/// deleting a snapshot leaves a gap rather than renumbering survivors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleVersion {
    /// Article this snapshot belongs to
    pub article_id: Uuid,

    /// 1-based, unique per article
    pub version_number: u32,

    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: BTreeSet<String>,
    pub cover_image_url: Option<String>,
    pub slug: String,

    /// Why this snapshot was taken
    pub change_description: String,

    /// Email of the editor who triggered the snapshot
    pub editor_email: String,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

impl ArticleVersion {
    /// Snapshot the article's current content fields under a version number
    pub fn from_article(
        article: &Article,
        version_number: u32,
        editor_email: impl Into<String>,
        change_description: impl Into<String>,
    ) -> Self {
        Self {
            article_id: article.id,
            version_number,
            title: article.title.clone(),
            content: article.content.clone(),
            summary: article.summary.clone(),
            tags: article.tags.clone(),
            cover_image_url: article.cover_image_url.clone(),
            slug: article.slug.clone(),
            change_description: change_description.into(),
            editor_email: editor_email.into(),
            created_at: Utc::now(),
        }
    }
}
