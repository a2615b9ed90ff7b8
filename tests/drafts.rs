//! Integration tests for draft autosave and publication.

use std::sync::Arc;

use inkpress::{
    ArticleInput, ArticleService, Error, IdentityStore, MemoryStore, UserProfile,
};

async fn service_with_users() -> ArticleService {
    let store = Arc::new(MemoryStore::new());
    store
        .register(UserProfile::new("ada", "ada@example.com"))
        .await
        .unwrap();
    store
        .register(UserProfile::new("bob", "bob@example.com"))
        .await
        .unwrap();
    ArticleService::new(store.clone(), store.clone(), store.clone(), store)
}

#[tokio::test]
async fn autosave_creates_then_updates_a_draft() {
    let service = service_with_users().await;

    let draft = service
        .autosave_draft("ada", ArticleInput::new("WIP", "first pass"), None)
        .await
        .unwrap();
    assert!(!draft.published);
    assert!(draft.slug.is_empty(), "drafts get no slug until publication");
    let first_save = draft.last_saved_at.unwrap();

    let saved = service
        .autosave_draft(
            "ada",
            ArticleInput::new("WIP", "second pass"),
            Some(draft.id),
        )
        .await
        .unwrap();
    assert_eq!(saved.id, draft.id);
    assert_eq!(saved.content, "second pass");
    assert!(saved.last_saved_at.unwrap() >= first_save);
}

#[tokio::test]
async fn autosave_takes_no_version_snapshots() {
    let service = service_with_users().await;

    let draft = service
        .autosave_draft("ada", ArticleInput::new("WIP", "body"), None)
        .await
        .unwrap();
    for i in 0..5 {
        service
            .autosave_draft(
                "ada",
                ArticleInput::new("WIP", &format!("body {}", i)),
                Some(draft.id),
            )
            .await
            .unwrap();
    }

    assert!(service.list_versions(draft.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn drafts_list_only_unpublished_own_articles() {
    let service = service_with_users().await;

    service
        .autosave_draft("ada", ArticleInput::new("Draft A", "a"), None)
        .await
        .unwrap();
    service
        .autosave_draft("bob", ArticleInput::new("Bob Draft", "b"), None)
        .await
        .unwrap();
    service
        .create_article(
            "ada",
            ArticleInput::new("Published Piece", "c").published(true),
        )
        .await
        .unwrap();

    let drafts = service.list_drafts("ada").await.unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].title, "Draft A");
}

#[tokio::test]
async fn publishing_a_draft_assigns_slug_and_read_time() {
    let service = service_with_users().await;
    let body = vec!["word"; 400].join(" ");

    let draft = service
        .autosave_draft("ada", ArticleInput::new("From Draft to Post", &body), None)
        .await
        .unwrap();
    assert_eq!(draft.read_time_minutes, 0, "autosave skips derivation");

    let published = service.publish_draft("ada", draft.id).await.unwrap();
    assert_eq!(published.slug, "from-draft-to-post");
    assert_eq!(published.read_time_minutes, 2);
    assert!(published.published_at.is_some());

    // the published draft is now a qualifying read
    let read = service.get_by_slug("from-draft-to-post").await.unwrap();
    assert_eq!(read.view_count, 1);
}

#[tokio::test]
async fn draft_operations_are_owner_only() {
    let service = service_with_users().await;
    let draft = service
        .autosave_draft("ada", ArticleInput::new("Private", "body"), None)
        .await
        .unwrap();

    let get = service.get_draft("bob", draft.id).await.unwrap_err();
    assert!(matches!(get, Error::Forbidden(_)));

    let save = service
        .autosave_draft("bob", ArticleInput::new("Hijack", "x"), Some(draft.id))
        .await
        .unwrap_err();
    assert!(matches!(save, Error::Forbidden(_)));

    let publish = service.publish_draft("bob", draft.id).await.unwrap_err();
    assert!(matches!(publish, Error::Forbidden(_)));
}

#[tokio::test]
async fn published_articles_cannot_be_autosaved() {
    let service = service_with_users().await;
    let article = service
        .create_article("ada", ArticleInput::new("Live Post", "body").published(true))
        .await
        .unwrap();

    let err = service
        .autosave_draft(
            "ada",
            ArticleInput::new("Live Post", "sneaky edit"),
            Some(article.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn deleting_a_draft_removes_it() {
    let service = service_with_users().await;
    let draft = service
        .autosave_draft("ada", ArticleInput::new("Scrapped", "body"), None)
        .await
        .unwrap();

    service.delete_draft("ada", draft.id).await.unwrap();
    assert!(service
        .get_article(draft.id)
        .await
        .unwrap_err()
        .is_not_found());
}
