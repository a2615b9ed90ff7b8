//! Periodic batch operations: recommendation generation and digest
//! building.
//!
//! These are the loops an external scheduler drives once per user. A
//! failure for one user is caught, logged, and never aborts the batch;
//! delivery itself stays with the caller-supplied sink, keeping
//! email/push transports external.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Article, DigestFrequency, UserProfile};
use crate::error::{Error, Result};
use crate::store::{ArticleStore, IdentityStore, SortField, SortOrder};

/// Articles selected for one user's periodic digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub frequency: DigestFrequency,
    pub generated_at: DateTime<Utc>,
    pub articles: Vec<Article>,
}

/// Delivery seam for batch output. Implementations own the transport
/// (email, push, a log line); the engine only hands them the payload.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a user's recommended article ids
    async fn recommendations(&self, user: &UserProfile, article_ids: &[Uuid]) -> Result<()>;

    /// Deliver a non-empty digest
    async fn digest(&self, digest: &Digest) -> Result<()>;
}

/// Outcome counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Users the batch attempted
    pub processed: usize,

    /// Users whose payload reached the sink
    pub succeeded: usize,

    /// Users with nothing to deliver
    pub skipped: usize,

    /// Users whose operation failed (logged, batch continued)
    pub failed: usize,
}

/// Batch operations over the identity and article collaborators
pub struct BatchService {
    identity: Arc<dyn IdentityStore>,
    articles: Arc<dyn ArticleStore>,
}

impl BatchService {
    pub fn new(identity: Arc<dyn IdentityStore>, articles: Arc<dyn ArticleStore>) -> Self {
        Self { identity, articles }
    }

    async fn resolve_user(&self, identity: &str) -> Result<UserProfile> {
        self.identity
            .resolve(identity)
            .await?
            .ok_or_else(|| Error::not_found("user", identity))
    }

    /// Recommend up to `limit` article ids for one user: published
    /// articles by followed authors first, padded with trending articles
    /// the list does not already contain.
    pub async fn recommended_articles(&self, identity: &str, limit: usize) -> Result<Vec<Uuid>> {
        let user = self.resolve_user(identity).await?;

        let followed: Vec<Uuid> = user.following.iter().copied().collect();
        let mut recommended = self.articles.published_by_authors(&followed).await?;

        if recommended.len() < limit {
            let mut trending = self.articles.all_published().await?;
            crate::store::sort_articles(&mut trending, SortField::ViewCount, SortOrder::Desc);

            for article in trending {
                if recommended.len() >= limit {
                    break;
                }
                if recommended.iter().all(|a| a.id != article.id) {
                    recommended.push(article);
                }
            }
        }

        recommended.truncate(limit);
        Ok(recommended.into_iter().map(|a| a.id).collect())
    }

    /// Generate recommendations for every active user, delivering each
    /// list through the sink. Per-user failures are logged and skipped.
    #[instrument(skip(self, sink))]
    pub async fn run_recommendations_for_all(
        &self,
        sink: &dyn NotificationSink,
        limit: usize,
    ) -> Result<BatchReport> {
        let users = self.identity.list_users().await?;
        let mut report = BatchReport::default();

        for user in users.into_iter().filter(|u| u.active) {
            report.processed += 1;

            let outcome: Result<bool> = async {
                let ids = self.recommended_articles(&user.email, limit).await?;
                if ids.is_empty() {
                    return Ok(false);
                }
                sink.recommendations(&user, &ids).await?;
                Ok(true)
            }
            .await;

            match outcome {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.skipped += 1,
                Err(error) => {
                    warn!(user = %user.username, %error, "Recommendation generation failed, continuing batch");
                    report.failed += 1;
                }
            }
        }

        info!(?report, "Recommendation batch finished");
        Ok(report)
    }

    /// Build one user's digest: published articles from followed authors
    /// within the frequency window (one day or one week).
    pub async fn build_digest(
        &self,
        identity: &str,
        frequency: DigestFrequency,
    ) -> Result<Digest> {
        let window = match frequency {
            DigestFrequency::Daily => Duration::days(1),
            DigestFrequency::Weekly => Duration::weeks(1),
            DigestFrequency::Immediate => {
                return Err(Error::invalid_argument(
                    "digests are built for daily or weekly frequencies only",
                ))
            }
        };

        let user = self.resolve_user(identity).await?;
        let since = Utc::now() - window;

        let followed: Vec<Uuid> = user.following.iter().copied().collect();
        let articles = self
            .articles
            .published_by_authors(&followed)
            .await?
            .into_iter()
            .filter(|a| a.published_at.map_or(false, |p| p >= since))
            .collect();

        Ok(Digest {
            user_id: user.id,
            username: user.username,
            email: user.email,
            frequency,
            generated_at: Utc::now(),
            articles,
        })
    }

    /// Build and deliver digests for every active user whose preference
    /// is daily or weekly. Empty digests are skipped; per-user failures
    /// are logged and never abort the batch.
    #[instrument(skip(self, sink))]
    pub async fn run_digests_for_all(&self, sink: &dyn NotificationSink) -> Result<BatchReport> {
        let users = self.identity.list_users().await?;
        let mut report = BatchReport::default();

        for user in users.into_iter().filter(|u| u.active) {
            let frequency = match user.digest_frequency {
                DigestFrequency::Immediate => continue,
                frequency => frequency,
            };
            report.processed += 1;

            let outcome: Result<bool> = async {
                let digest = self.build_digest(&user.email, frequency).await?;
                if digest.articles.is_empty() {
                    return Ok(false);
                }
                sink.digest(&digest).await?;
                Ok(true)
            }
            .await;

            match outcome {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.skipped += 1,
                Err(error) => {
                    warn!(user = %user.username, %error, "Digest delivery failed, continuing batch");
                    report.failed += 1;
                }
            }
        }

        info!(?report, "Digest batch finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    /// Sink that records deliveries and can fail for one username
    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<String>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn recommendations(&self, user: &UserProfile, _ids: &[Uuid]) -> Result<()> {
            if self.fail_for.as_deref() == Some(user.username.as_str()) {
                return Err(Error::invalid_argument("sink rejected delivery"));
            }
            self.delivered.lock().unwrap().push(user.username.clone());
            Ok(())
        }

        async fn digest(&self, digest: &Digest) -> Result<()> {
            if self.fail_for.as_deref() == Some(digest.username.as_str()) {
                return Err(Error::invalid_argument("sink rejected delivery"));
            }
            self.delivered.lock().unwrap().push(digest.username.clone());
            Ok(())
        }
    }

    fn published_article(author_id: Uuid, slug: &str, views: u64) -> Article {
        let mut article = Article::new(author_id);
        article.title = slug.to_string();
        article.slug = slug.to_string();
        article.published = true;
        article.published_at = Some(Utc::now());
        article.view_count = views;
        article
    }

    async fn setup() -> (Arc<MemoryStore>, UserProfile, UserProfile) {
        let store = Arc::new(MemoryStore::new());
        let ada = UserProfile::new("ada", "ada@example.com")
            .with_digest_frequency(DigestFrequency::Daily);
        let bob = UserProfile::new("bob", "bob@example.com")
            .with_digest_frequency(DigestFrequency::Daily);
        store.register(ada.clone()).await.unwrap();
        store.register(bob.clone()).await.unwrap();
        (store, ada, bob)
    }

    #[tokio::test]
    async fn test_recommendations_pad_with_trending() {
        let (store, ada, bob) = setup().await;
        store.follow(ada.id, bob.id).await.unwrap();

        store.insert(published_article(bob.id, "followed", 1)).await.unwrap();
        store.insert(published_article(ada.id, "hot", 1000)).await.unwrap();
        store.insert(published_article(ada.id, "warm", 100)).await.unwrap();

        let service = BatchService::new(store.clone(), store.clone());
        let ids = service.recommended_articles("ada", 3).await.unwrap();

        assert_eq!(ids.len(), 3);
        let followed = store.find_by_slug("followed").await.unwrap().unwrap();
        assert_eq!(ids[0], followed.id);
        let hot = store.find_by_slug("hot").await.unwrap().unwrap();
        assert_eq!(ids[1], hot.id);
    }

    #[tokio::test]
    async fn test_recommendation_batch_survives_sink_failures() {
        let (store, ada, bob) = setup().await;
        store.follow(ada.id, bob.id).await.unwrap();
        store.follow(bob.id, ada.id).await.unwrap();
        store.insert(published_article(ada.id, "a-post", 10)).await.unwrap();
        store.insert(published_article(bob.id, "b-post", 20)).await.unwrap();

        let sink = RecordingSink {
            fail_for: Some("ada".to_string()),
            ..RecordingSink::default()
        };
        let service = BatchService::new(store.clone(), store.clone());

        let report = service.run_recommendations_for_all(&sink, 3).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(*sink.delivered.lock().unwrap(), vec!["bob".to_string()]);
    }

    #[tokio::test]
    async fn test_digest_windows_by_frequency() {
        let (store, ada, bob) = setup().await;
        store.follow(ada.id, bob.id).await.unwrap();

        let mut fresh = published_article(bob.id, "fresh", 1);
        fresh.published_at = Some(Utc::now() - Duration::hours(2));
        let mut stale = published_article(bob.id, "stale", 1);
        stale.published_at = Some(Utc::now() - Duration::days(3));
        store.insert(fresh).await.unwrap();
        store.insert(stale).await.unwrap();

        let service = BatchService::new(store.clone(), store.clone());

        let daily = service.build_digest("ada", DigestFrequency::Daily).await.unwrap();
        assert_eq!(daily.articles.len(), 1);
        assert_eq!(daily.articles[0].slug, "fresh");

        let weekly = service.build_digest("ada", DigestFrequency::Weekly).await.unwrap();
        assert_eq!(weekly.articles.len(), 2);
    }

    #[tokio::test]
    async fn test_immediate_digest_is_invalid() {
        let (store, _, _) = setup().await;
        let service = BatchService::new(store.clone(), store.clone());
        let err = service
            .build_digest("ada", DigestFrequency::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_digest_run_skips_empty_digests() {
        let (store, ada, bob) = setup().await;
        // only ada follows anyone; bob has an empty digest
        store.follow(ada.id, bob.id).await.unwrap();
        store.insert(published_article(bob.id, "posted", 1)).await.unwrap();

        let sink = RecordingSink::default();
        let service = BatchService::new(store.clone(), store.clone());

        let report = service.run_digests_for_all(&sink).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(*sink.delivered.lock().unwrap(), vec!["ada".to_string()]);
    }
}
