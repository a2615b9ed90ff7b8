//! In-memory reference implementation of the collaborator stores.
//!
//! All state lives under one lock and can be persisted as a single
//! pretty-JSON snapshot, so read-modify-write sequences (version
//! numbering, clap increments) happen atomically under one write-lock
//! acquisition. Stores opened without a snapshot path are ephemeral.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::domain::{
    Article, ArticleEngagement, ArticleVersion, EngagementType, Page, Tag, UserProfile,
};
use crate::error::{Error, Result};

use super::{
    published_key, sort_articles, ArticleStore, EngagementStore, IdentityStore, SearchFilter,
    SortField, SortOrder, TagStore, VersionStore,
};

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreState {
    version: u32,
    #[serde(default)]
    users: BTreeMap<Uuid, UserProfile>,
    #[serde(default)]
    articles: BTreeMap<Uuid, Article>,
    #[serde(default)]
    versions: BTreeMap<Uuid, Vec<ArticleVersion>>,
    #[serde(default)]
    engagements: Vec<ArticleEngagement>,
    #[serde(default)]
    tags: BTreeMap<String, Tag>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            users: BTreeMap::new(),
            articles: BTreeMap::new(),
            versions: BTreeMap::new(),
            engagements: Vec::new(),
            tags: BTreeMap::new(),
        }
    }
}

/// Reference store backing the CLI and the test suite
pub struct MemoryStore {
    state: RwLock<StoreState>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an ephemeral store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a JSON snapshot file; a missing file yields
    /// an empty store
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = if path.exists() {
            let raw = fs::read_to_string(&path).await?;
            serde_json::from_str(&raw)?
        } else {
            StoreState::default()
        };

        Ok(Self {
            state: RwLock::new(state),
            snapshot_path: Some(path),
        })
    }

    /// Write the current state back to the snapshot file. Ephemeral
    /// stores skip this silently.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&*self.read())?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, json).await?;

        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn newest_published_first(articles: &mut [Article]) {
    sort_articles(articles, SortField::PublishedAt, SortOrder::Desc);
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn register(&self, profile: UserProfile) -> Result<()> {
        let mut state = self.write();

        if state
            .users
            .values()
            .any(|u| u.email == profile.email || u.username == profile.username)
        {
            return Err(Error::invalid_argument(format!(
                "username or email already registered: {}",
                profile.username
            )));
        }

        state.users.insert(profile.id, profile);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn resolve(&self, identity: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.email == identity || u.username == identity)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.read().users.values().cloned().collect())
    }

    async fn follow(&self, follower: Uuid, followee: Uuid) -> Result<()> {
        let mut state = self.write();

        if !state.users.contains_key(&followee) {
            return Err(Error::not_found("user", followee));
        }
        let user = state
            .users
            .get_mut(&follower)
            .ok_or_else(|| Error::not_found("user", follower))?;

        user.following.insert(followee);
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn insert(&self, article: Article) -> Result<()> {
        self.write().articles.insert(article.id, article);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.read().articles.get(&id).cloned())
    }

    async fn update(&self, article: Article) -> Result<()> {
        let mut state = self.write();
        match state.articles.get_mut(&article.id) {
            Some(slot) => {
                *slot = article;
                Ok(())
            }
            None => Err(Error::not_found("article", article.id)),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        self.write()
            .articles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("article", id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        Ok(self
            .read()
            .articles
            .values()
            .find(|a| a.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.read().articles.values().any(|a| a.slug == slug))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<u64> {
        let mut state = self.write();
        let article = state
            .articles
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("article", id))?;

        article.view_count += 1;
        Ok(article.view_count)
    }

    async fn by_author(&self, author_id: Uuid, page: usize, size: usize) -> Result<Page<Article>> {
        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| a.author_id == author_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::from_complete(list, page, size))
    }

    async fn drafts_by_author(&self, author_id: Uuid) -> Result<Vec<Article>> {
        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| a.author_id == author_id && !a.published)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn published(&self, page: usize, size: usize) -> Result<Page<Article>> {
        let mut list = self.all_published().await?;
        newest_published_first(&mut list);
        Ok(Page::from_complete(list, page, size))
    }

    async fn all_published(&self) -> Result<Vec<Article>> {
        Ok(self
            .read()
            .articles
            .values()
            .filter(|a| a.published)
            .cloned()
            .collect())
    }

    async fn published_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Article>> {
        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| a.published && author_ids.contains(&a.author_id))
            .cloned()
            .collect();
        newest_published_first(&mut list);
        Ok(list)
    }

    async fn search(&self, query: &str, page: usize, size: usize) -> Result<Page<Article>> {
        let needle = query.to_lowercase();
        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| {
                a.published
                    && (a.title.to_lowercase().contains(&needle)
                        || a.content.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        newest_published_first(&mut list);
        Ok(Page::from_complete(list, page, size))
    }

    async fn advanced_search(
        &self,
        filter: &SearchFilter,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let needle = filter.keywords.as_ref().map(|k| k.to_lowercase());

        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| {
                if let Some(needle) = &needle {
                    if !a.title.to_lowercase().contains(needle)
                        && !a.content.to_lowercase().contains(needle)
                    {
                        return false;
                    }
                }
                if let Some(author_id) = filter.author_id {
                    if a.author_id != author_id {
                        return false;
                    }
                }
                if let Some(from) = filter.from_date {
                    if a.published_at.map_or(true, |p| p < from) {
                        return false;
                    }
                }
                if let Some(to) = filter.to_date {
                    if a.published_at.map_or(true, |p| p > to) {
                        return false;
                    }
                }
                if filter.published_only && !a.published {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        sort_articles(&mut list, filter.sort, filter.order);
        Ok(Page::from_complete(list, page, size))
    }

    async fn by_tags(
        &self,
        tags: &BTreeSet<String>,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let mut list: Vec<Article> = self
            .read()
            .articles
            .values()
            .filter(|a| a.published && tags.iter().all(|t| a.tags.contains(t)))
            .cloned()
            .collect();
        newest_published_first(&mut list);
        Ok(Page::from_complete(list, page, size))
    }

    async fn trending(&self, page: usize, size: usize) -> Result<Page<Article>> {
        let mut list = self.all_published().await?;
        list.sort_by(|a, b| {
            b.view_count
                .cmp(&a.view_count)
                .then_with(|| published_key(b).cmp(&published_key(a)))
        });
        Ok(Page::from_complete(list, page, size))
    }

    async fn recent(&self, page: usize, size: usize) -> Result<Page<Article>> {
        self.published(page, size).await
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn append_snapshot(
        &self,
        article: &Article,
        editor_email: &str,
        change_description: &str,
    ) -> Result<ArticleVersion> {
        let mut state = self.write();
        let versions = state.versions.entry(article.id).or_default();

        // number reservation and insert under the same lock; max+1 keeps
        // numbers unique even after deletions leave gaps
        let next = versions.iter().map(|v| v.version_number).max().unwrap_or(0) + 1;
        let version = ArticleVersion::from_article(article, next, editor_email, change_description);
        versions.push(version.clone());

        Ok(version)
    }

    async fn list_for_article(&self, article_id: Uuid) -> Result<Vec<ArticleVersion>> {
        let mut list = self
            .read()
            .versions
            .get(&article_id)
            .cloned()
            .unwrap_or_default();
        list.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(list)
    }

    async fn get(&self, article_id: Uuid, version_number: u32) -> Result<Option<ArticleVersion>> {
        Ok(self
            .read()
            .versions
            .get(&article_id)
            .and_then(|versions| {
                versions
                    .iter()
                    .find(|v| v.version_number == version_number)
                    .cloned()
            }))
    }

    async fn remove(&self, article_id: Uuid, version_number: u32) -> Result<bool> {
        let mut state = self.write();
        let Some(versions) = state.versions.get_mut(&article_id) else {
            return Ok(false);
        };

        let before = versions.len();
        versions.retain(|v| v.version_number != version_number);
        Ok(versions.len() < before)
    }

    async fn remove_for_article(&self, article_id: Uuid) -> Result<()> {
        self.write().versions.remove(&article_id);
        Ok(())
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn record_clap(&self, article_id: Uuid, user_id: Uuid, max: u32) -> Result<u32> {
        let mut state = self.write();

        if let Some(row) = state.engagements.iter_mut().find(|e| {
            e.article_id == article_id && e.user_id == user_id && e.kind == EngagementType::Clap
        }) {
            // increment-if-below-cap; at the cap this is a silent no-op
            if row.count < max {
                row.count += 1;
                row.created_at = Utc::now();
            }
            Ok(row.count)
        } else {
            state
                .engagements
                .push(ArticleEngagement::new(article_id, user_id, EngagementType::Clap));
            Ok(1)
        }
    }

    async fn touch(&self, article_id: Uuid, user_id: Uuid, kind: EngagementType) -> Result<bool> {
        let mut state = self.write();

        if let Some(row) = state
            .engagements
            .iter_mut()
            .find(|e| e.article_id == article_id && e.user_id == user_id && e.kind == kind)
        {
            row.created_at = Utc::now();
            Ok(false)
        } else {
            state
                .engagements
                .push(ArticleEngagement::new(article_id, user_id, kind));
            Ok(true)
        }
    }

    async fn count_by_type(&self, article_id: Uuid, kind: EngagementType) -> Result<u64> {
        Ok(self
            .read()
            .engagements
            .iter()
            .filter(|e| e.article_id == article_id && e.kind == kind)
            .count() as u64)
    }

    async fn sum_claps(&self, article_id: Uuid) -> Result<u64> {
        Ok(self
            .read()
            .engagements
            .iter()
            .filter(|e| e.article_id == article_id && e.kind == EngagementType::Clap)
            .map(|e| e.count as u64)
            .sum())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn record_usage(&self, names: &BTreeSet<String>) -> Result<()> {
        let mut state = self.write();

        for name in names {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            match state.tags.get_mut(&name) {
                Some(tag) => tag.touch(),
                None => {
                    state.tags.insert(name.clone(), Tag::new(name));
                }
            }
        }

        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.read().tags.get(&name.to_lowercase()).cloned())
    }

    async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<Tag>> {
        let prefix = prefix.to_lowercase();
        let mut list: Vec<Tag> = self
            .read()
            .tags
            .values()
            .filter(|t| t.name.starts_with(&prefix))
            .cloned()
            .collect();

        list.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        list.truncate(limit);
        Ok(list)
    }

    async fn trending(&self, limit: usize) -> Result<Vec<Tag>> {
        let mut list: Vec<Tag> = self.read().tags.values().cloned().collect();
        list.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| b.last_used_at.cmp(&a.last_used_at))
        });
        list.truncate(limit);
        Ok(list)
    }
}
