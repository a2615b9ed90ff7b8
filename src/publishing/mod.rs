//! Authoring lifecycle: create, update, publish, drafts, and version
//! history.
//!
//! Every content-changing operation snapshots the article into the
//! version store before the live row is overwritten, so history is never
//! lost. Author-only operations check ownership and fail with a
//! `Forbidden` that is distinct from `NotFound`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::content::{analysis, slug};
use crate::domain::{Article, ArticleInput, ArticleVersion, Page, UserProfile};
use crate::error::{Error, Result};
use crate::store::{ArticleStore, IdentityStore, TagStore, VersionStore};

/// Authoring service over the identity and persistence collaborators
pub struct ArticleService {
    identity: Arc<dyn IdentityStore>,
    articles: Arc<dyn ArticleStore>,
    versions: Arc<dyn VersionStore>,
    tags: Arc<dyn TagStore>,
}

impl ArticleService {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        articles: Arc<dyn ArticleStore>,
        versions: Arc<dyn VersionStore>,
        tags: Arc<dyn TagStore>,
    ) -> Self {
        Self {
            identity,
            articles,
            versions,
            tags,
        }
    }

    async fn resolve_user(&self, identity: &str) -> Result<UserProfile> {
        self.identity
            .resolve(identity)
            .await?
            .ok_or_else(|| Error::not_found("user", identity))
    }

    async fn require_article(&self, id: Uuid) -> Result<Article> {
        self.articles
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("article", id))
    }

    fn ensure_owner(article: &Article, user: &UserProfile, action: &str) -> Result<()> {
        if !article.is_owned_by(user.id) {
            return Err(Error::forbidden(format!(
                "you can only {} your own articles",
                action
            )));
        }
        Ok(())
    }

    /// Derive a collision-free slug from a title
    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = slug::generate_slug(title);
        if base.is_empty() {
            return Err(Error::invalid_argument(
                "article title produces an empty slug",
            ));
        }

        let articles = Arc::clone(&self.articles);
        slug::resolve_unique(&base, move |candidate| {
            let articles = Arc::clone(&articles);
            async move { articles.slug_exists(&candidate).await }
        })
        .await
    }

    /// Create an article, snapshot it as "Initial version", and record
    /// tag usage.
    #[instrument(skip(self, input), fields(author = %author_identity, title = %input.title))]
    pub async fn create_article(
        &self,
        author_identity: &str,
        input: ArticleInput,
    ) -> Result<Article> {
        let author = self.resolve_user(author_identity).await?;
        let slug = self.unique_slug(&input.title).await?;

        let mut article = Article::new(author.id);
        article.title = input.title.clone();
        article.content = input.content.clone();
        article.summary = input.summary.clone();
        article.tags = input.normalized_tags();
        article.cover_image_url = input.cover_image_url.clone();
        article.slug = slug;
        article.read_time_minutes = analysis::read_time(&input.content);
        if input.published {
            article.published = true;
            article.published_at = Some(Utc::now());
        }

        self.articles.insert(article.clone()).await?;
        self.versions
            .append_snapshot(&article, &author.email, "Initial version")
            .await?;
        self.tags.record_usage(&article.tags).await?;

        info!(article_id = %article.id, slug = %article.slug, "Article created");
        Ok(article)
    }

    /// Update an article's content fields, snapshotting the previous
    /// state first. The slug is re-derived only when the title-derived
    /// slug actually changed.
    #[instrument(skip(self, input, change_description), fields(article_id = %article_id))]
    pub async fn update_article(
        &self,
        author_identity: &str,
        article_id: Uuid,
        input: ArticleInput,
        change_description: Option<&str>,
    ) -> Result<Article> {
        let author = self.resolve_user(author_identity).await?;
        let mut article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "update")?;

        // version-before-mutate: the snapshot must be recorded before the
        // live fields are overwritten
        let description = change_description.unwrap_or("Article updated");
        self.versions
            .append_snapshot(&article, &author.email, description)
            .await?;

        article.title = input.title.clone();
        article.content = input.content.clone();
        article.summary = input.summary.clone();
        article.tags = input.normalized_tags();
        article.cover_image_url = input.cover_image_url.clone();
        article.read_time_minutes = analysis::read_time(&input.content);

        let new_base = slug::generate_slug(&input.title);
        if !new_base.is_empty() && new_base != article.slug {
            article.slug = self.unique_slug(&input.title).await?;
        }

        if input.published && !article.published {
            article.published = true;
            article.published_at = Some(Utc::now());
        } else if !input.published && article.published {
            article.published = false;
            article.published_at = None;
        }

        article.updated_at = Utc::now();
        self.articles.update(article.clone()).await?;
        self.tags.record_usage(&article.tags).await?;

        info!(article_id = %article.id, "Article updated");
        Ok(article)
    }

    /// Fetch an article by id, draft or published
    pub async fn get_article(&self, id: Uuid) -> Result<Article> {
        self.require_article(id).await
    }

    /// A qualifying read: fetch a published article by slug and bump its
    /// view counter. Unpublished articles are NotFound to readers.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Article> {
        let mut article = self
            .articles
            .find_by_slug(slug)
            .await?
            .filter(|a| a.published)
            .ok_or_else(|| Error::not_found("article", slug))?;

        article.view_count = self.articles.increment_view_count(article.id).await?;
        Ok(article)
    }

    /// All of one author's articles, newest first
    pub async fn articles_by_author(
        &self,
        username: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let author = self
            .identity
            .find_by_username(username)
            .await?
            .ok_or_else(|| Error::not_found("user", username))?;
        self.articles.by_author(author.id, page, size).await
    }

    /// Published articles, most recently published first
    pub async fn published_articles(&self, page: usize, size: usize) -> Result<Page<Article>> {
        self.articles.published(page, size).await
    }

    /// Published articles carrying the given tag
    pub async fn articles_by_tag(
        &self,
        tag: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        let tags = std::iter::once(tag.trim().to_lowercase()).collect();
        self.articles.by_tags(&tags, page, size).await
    }

    /// Keyword search over published titles and bodies
    pub async fn search_articles(
        &self,
        query: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<Article>> {
        self.articles.search(query, page, size).await
    }

    /// Delete an article and cascade its version history
    #[instrument(skip(self), fields(article_id = %article_id))]
    pub async fn delete_article(&self, author_identity: &str, article_id: Uuid) -> Result<()> {
        let author = self.resolve_user(author_identity).await?;
        let article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "delete")?;

        self.versions.remove_for_article(article_id).await?;
        self.articles.remove(article_id).await?;

        info!(article_id = %article_id, "Article deleted");
        Ok(())
    }

    /// Make an article visible to readers
    pub async fn publish_article(&self, author_identity: &str, article_id: Uuid) -> Result<Article> {
        let author = self.resolve_user(author_identity).await?;
        let mut article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "publish")?;

        article.published = true;
        article.published_at = Some(Utc::now());
        article.updated_at = Utc::now();
        self.articles.update(article.clone()).await?;

        Ok(article)
    }

    /// Hide an article from readers, clearing its publish timestamp
    pub async fn unpublish_article(
        &self,
        author_identity: &str,
        article_id: Uuid,
    ) -> Result<Article> {
        let author = self.resolve_user(author_identity).await?;
        let mut article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "unpublish")?;

        article.published = false;
        article.published_at = None;
        article.updated_at = Utc::now();
        self.articles.update(article.clone()).await?;

        Ok(article)
    }

    /// Version history for an article, newest first
    pub async fn list_versions(&self, article_id: Uuid) -> Result<Vec<ArticleVersion>> {
        self.versions.list_for_article(article_id).await
    }

    /// One numbered snapshot
    pub async fn get_version(
        &self,
        article_id: Uuid,
        version_number: u32,
    ) -> Result<ArticleVersion> {
        self.versions
            .get(article_id, version_number)
            .await?
            .ok_or_else(|| Error::not_found("version", version_number))
    }

    /// Restore an article to a previous version. The current state is
    /// snapshotted first, so forward history survives the restore.
    #[instrument(skip(self), fields(article_id = %article_id, version = version_number))]
    pub async fn restore_version(
        &self,
        author_identity: &str,
        article_id: Uuid,
        version_number: u32,
    ) -> Result<Article> {
        let author = self.resolve_user(author_identity).await?;
        let mut article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "restore versions of")?;

        let target = self
            .versions
            .get(article_id, version_number)
            .await?
            .ok_or_else(|| Error::not_found("version", version_number))?;

        self.versions
            .append_snapshot(
                &article,
                &author.email,
                &format!("Restored from version {}", version_number),
            )
            .await?;

        article.title = target.title;
        article.content = target.content;
        article.summary = target.summary;
        article.tags = target.tags;
        article.cover_image_url = target.cover_image_url;
        article.slug = target.slug;
        article.read_time_minutes = analysis::read_time(&article.content);
        article.updated_at = Utc::now();

        self.articles.update(article.clone()).await?;

        info!(article_id = %article_id, version = version_number, "Article restored");
        Ok(article)
    }

    /// Delete one snapshot. Remaining versions keep their numbers; gaps
    /// are permitted.
    pub async fn delete_version(
        &self,
        author_identity: &str,
        article_id: Uuid,
        version_number: u32,
    ) -> Result<()> {
        let author = self.resolve_user(author_identity).await?;
        let article = self.require_article(article_id).await?;
        Self::ensure_owner(&article, &author, "delete versions of")?;

        if !self.versions.remove(article_id, version_number).await? {
            return Err(Error::not_found("version", version_number));
        }
        Ok(())
    }

    /// Autosave a draft, creating it on first save. Autosave refreshes
    /// `last_saved_at` without taking a version snapshot or deriving a
    /// slug; both happen when the draft is published or updated properly.
    pub async fn autosave_draft(
        &self,
        author_identity: &str,
        input: ArticleInput,
        draft_id: Option<Uuid>,
    ) -> Result<Article> {
        let user = self.resolve_user(author_identity).await?;

        let mut draft = match draft_id {
            Some(id) => {
                let draft = self.require_article(id).await?;
                if !draft.is_owned_by(user.id) || draft.published {
                    return Err(Error::forbidden("you can only auto-save your own drafts"));
                }
                draft
            }
            None => Article::new(user.id),
        };

        draft.title = input.title.clone();
        draft.content = input.content.clone();
        draft.summary = input.summary.clone();
        draft.tags = input.normalized_tags();
        draft.cover_image_url = input.cover_image_url.clone();
        // the autosave hot path skips read-time derivation; it is
        // recomputed when the draft is published
        draft.read_time_minutes = 0;

        let now = Utc::now();
        draft.last_saved_at = Some(now);
        draft.updated_at = now;

        if draft_id.is_some() {
            self.articles.update(draft.clone()).await?;
        } else {
            self.articles.insert(draft.clone()).await?;
        }
        Ok(draft)
    }

    /// One author's unpublished drafts
    pub async fn list_drafts(&self, author_identity: &str) -> Result<Vec<Article>> {
        let user = self.resolve_user(author_identity).await?;
        self.articles.drafts_by_author(user.id).await
    }

    /// Fetch one of the author's own drafts
    pub async fn get_draft(&self, author_identity: &str, draft_id: Uuid) -> Result<Article> {
        let user = self.resolve_user(author_identity).await?;
        let draft = self.require_article(draft_id).await?;
        if !draft.is_owned_by(user.id) || draft.published {
            return Err(Error::forbidden("you can only view your own drafts"));
        }
        Ok(draft)
    }

    /// Delete one of the author's own drafts
    pub async fn delete_draft(&self, author_identity: &str, draft_id: Uuid) -> Result<()> {
        let user = self.resolve_user(author_identity).await?;
        let draft = self.require_article(draft_id).await?;
        if !draft.is_owned_by(user.id) || draft.published {
            return Err(Error::forbidden("you can only delete your own drafts"));
        }

        self.versions.remove_for_article(draft_id).await?;
        self.articles.remove(draft_id).await?;
        Ok(())
    }

    /// Publish a draft, assigning its slug and read time on the way out
    pub async fn publish_draft(&self, author_identity: &str, draft_id: Uuid) -> Result<Article> {
        let user = self.resolve_user(author_identity).await?;
        let mut draft = self.require_article(draft_id).await?;
        if !draft.is_owned_by(user.id) || draft.published {
            return Err(Error::forbidden("you can only publish your own drafts"));
        }

        if draft.slug.is_empty() {
            draft.slug = self.unique_slug(&draft.title).await?;
        }
        draft.read_time_minutes = analysis::read_time(&draft.content);
        draft.published = true;
        draft.published_at = Some(Utc::now());
        draft.updated_at = Utc::now();

        self.articles.update(draft.clone()).await?;

        info!(article_id = %draft.id, slug = %draft.slug, "Draft published");
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfile;
    use crate::store::MemoryStore;

    async fn service_with_author(username: &str, email: &str) -> ArticleService {
        let store = Arc::new(MemoryStore::new());
        store
            .register(UserProfile::new(username, email))
            .await
            .unwrap();
        ArticleService::new(store.clone(), store.clone(), store.clone(), store)
    }

    fn input(title: &str, content: &str) -> ArticleInput {
        ArticleInput::new(title, content)
    }

    #[tokio::test]
    async fn test_create_derives_slug_and_initial_version() {
        let service = service_with_author("ada", "ada@example.com").await;

        let article = service
            .create_article("ada@example.com", input("Hello World!! 2024", "Body text"))
            .await
            .unwrap();

        assert_eq!(article.slug, "hello-world-2024");
        assert!(article.read_time_minutes >= 1);

        let versions = service.list_versions(article.id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].change_description, "Initial version");
        assert_eq!(versions[0].editor_email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_title_gets_suffixed_slug() {
        let service = service_with_author("ada", "ada@example.com").await;

        let first = service
            .create_article("ada", input("Hello World!! 2024", "Body"))
            .await
            .unwrap();
        let second = service
            .create_article("ada", input("Hello World!! 2024", "Body"))
            .await
            .unwrap();

        assert_eq!(first.slug, "hello-world-2024");
        assert_eq!(second.slug, "hello-world-2024-1");
    }

    #[tokio::test]
    async fn test_empty_title_is_invalid() {
        let service = service_with_author("ada", "ada@example.com").await;
        let err = service
            .create_article("ada", input("!!!", "Body"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let store = Arc::new(MemoryStore::new());
        store
            .register(UserProfile::new("ada", "ada@example.com"))
            .await
            .unwrap();
        store
            .register(UserProfile::new("bob", "bob@example.com"))
            .await
            .unwrap();
        let service = ArticleService::new(store.clone(), store.clone(), store.clone(), store);

        let article = service
            .create_article("ada", input("My Post", "Body"))
            .await
            .unwrap();

        let err = service
            .update_article("bob", article.id, input("Hijack", "Other"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_sequential_updates_number_versions_contiguously() {
        let service = service_with_author("ada", "ada@example.com").await;
        let article = service
            .create_article("ada", input("Post", "v1"))
            .await
            .unwrap();

        for i in 2..=5 {
            service
                .update_article("ada", article.id, input("Post", &format!("v{}", i)), None)
                .await
                .unwrap();
        }

        let versions = service.list_versions(article.id).await.unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_restore_preserves_forward_history() {
        let service = service_with_author("ada", "ada@example.com").await;
        let article = service
            .create_article("ada", input("Post", "first body"))
            .await
            .unwrap();
        service
            .update_article("ada", article.id, input("Post", "second body"), None)
            .await
            .unwrap();

        let restored = service.restore_version("ada", article.id, 1).await.unwrap();
        assert_eq!(restored.content, "first body");

        // the pre-restore live state became the newest version
        let versions = service.list_versions(article.id).await.unwrap();
        assert_eq!(versions[0].change_description, "Restored from version 1");
        assert_eq!(versions[0].content, "second body");
    }

    #[tokio::test]
    async fn test_publish_toggle_maintains_published_at() {
        let service = service_with_author("ada", "ada@example.com").await;
        let article = service
            .create_article("ada", input("Post", "Body"))
            .await
            .unwrap();
        assert!(article.published_at.is_none());

        let published = service.publish_article("ada", article.id).await.unwrap();
        assert!(published.published && published.published_at.is_some());

        let unpublished = service.unpublish_article("ada", article.id).await.unwrap();
        assert!(!unpublished.published && unpublished.published_at.is_none());
    }

    #[tokio::test]
    async fn test_read_by_slug_counts_views() {
        let service = service_with_author("ada", "ada@example.com").await;
        let article = service
            .create_article("ada", input("Post", "Body").published(true))
            .await
            .unwrap();

        let read = service.get_by_slug(&article.slug).await.unwrap();
        assert_eq!(read.view_count, 1);
        let read_again = service.get_by_slug(&article.slug).await.unwrap();
        assert_eq!(read_again.view_count, 2);
    }

    #[tokio::test]
    async fn test_unpublished_article_is_not_readable() {
        let service = service_with_author("ada", "ada@example.com").await;
        let article = service
            .create_article("ada", input("Post", "Body"))
            .await
            .unwrap();

        let err = service.get_by_slug(&article.slug).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_autosave_marks_last_saved_without_versions() {
        let service = service_with_author("ada", "ada@example.com").await;

        let draft = service
            .autosave_draft("ada", input("WIP", "draft body"), None)
            .await
            .unwrap();
        assert!(draft.last_saved_at.is_some());
        assert!(!draft.published);
        assert!(service.list_versions(draft.id).await.unwrap().is_empty());

        let saved = service
            .autosave_draft("ada", input("WIP", "longer draft body"), Some(draft.id))
            .await
            .unwrap();
        assert_eq!(saved.content, "longer draft body");
    }

    #[tokio::test]
    async fn test_publish_draft_assigns_slug_and_read_time() {
        let service = service_with_author("ada", "ada@example.com").await;
        let draft = service
            .autosave_draft("ada", input("Draft Title", "some words here"), None)
            .await
            .unwrap();
        assert!(draft.slug.is_empty());

        let published = service.publish_draft("ada", draft.id).await.unwrap();
        assert_eq!(published.slug, "draft-title");
        assert!(published.published_at.is_some());
        assert!(published.read_time_minutes >= 1);
    }
}
