use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::ServiceError;
use crate::model::{Bookmark, CreateBookmark, CreatedBookmark, SerializedBookmark, bookmark_path};
use crate::sanitize::{sanitize, sanitize_opt};
use crate::store::BookmarkStore;
use crate::validation;

/// Bookmark business rules: validation on the way in, sanitization on the way out.
#[derive(Clone)]
pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
}

pub fn serialize_bookmark(bookmark: &Bookmark) -> SerializedBookmark {
    SerializedBookmark {
        id: bookmark.id.clone(),
        title: sanitize(&bookmark.title),
        url: bookmark.url.clone(),
        description: sanitize_opt(bookmark.description.as_deref()),
        rating: bookmark.rating,
    }
}

impl BookmarkService {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SerializedBookmark>, ServiceError> {
        let bookmarks = self.store.list().await?;
        Ok(bookmarks.iter().map(serialize_bookmark).collect())
    }

    pub async fn get(&self, id: &str) -> Result<SerializedBookmark, ServiceError> {
        match self.store.get(id).await? {
            Some(bookmark) => Ok(serialize_bookmark(&bookmark)),
            None => {
                tracing::error!(id = %id, "bookmark not found");
                Err(ServiceError::NotFound(id.to_string()))
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn create(&self, input: CreateBookmark) -> Result<CreatedBookmark, ServiceError> {
        let new_bookmark = validation::validate(input)?;
        let bookmark = self.store.insert(new_bookmark).await?;
        info!(id = %bookmark.id, "bookmark created");

        Ok(CreatedBookmark {
            location: bookmark_path(&bookmark.id),
            bookmark: serialize_bookmark(&bookmark),
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.store.delete(id).await? {
            info!(id = %id, "bookmark deleted");
            Ok(())
        } else {
            tracing::error!(id = %id, "bookmark not found");
            Err(ServiceError::NotFound(id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;

    fn service() -> BookmarkService {
        BookmarkService::new(Arc::new(MemoryStore::new()))
    }

    fn input(value: serde_json::Value) -> CreateBookmark {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> CreateBookmark {
        input(json!({
            "title": "test",
            "url": "http://www.something.com",
            "description": "example description",
            "rating": 4
        }))
    }

    #[tokio::test]
    async fn create_then_get_returns_same_fields() {
        let svc = service();
        let created = svc.create(valid()).await.unwrap();
        assert_eq!(created.location, format!("/bookmarks/{}", created.bookmark.id));

        let fetched = svc.get(&created.bookmark.id).await.unwrap();
        assert_eq!(fetched, created.bookmark);
        assert_eq!(fetched.title, "test");
        assert_eq!(fetched.url, "http://www.something.com");
        assert_eq!(fetched.description, "example description");
        assert_eq!(fetched.rating, 4);
    }

    #[tokio::test]
    async fn ids_are_never_repeated() {
        let svc = service();
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let created = svc.create(valid()).await.unwrap();
            svc.delete(&created.bookmark.id).await.unwrap();
            assert!(seen.insert(created.bookmark.id));
        }
    }

    #[tokio::test]
    async fn list_contains_created_bookmark_exactly_once() {
        let svc = service();
        svc.create(valid()).await.unwrap();
        let created = svc.create(valid()).await.unwrap();

        let list = svc.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().filter(|b| b.id == created.bookmark.id).count(), 1);
    }

    #[tokio::test]
    async fn delete_makes_bookmark_absent() {
        let svc = service();
        let id = svc.create(valid()).await.unwrap().bookmark.id;

        svc.delete(&id).await.unwrap();
        assert!(matches!(svc.get(&id).await, Err(ServiceError::NotFound(_))));
        assert!(svc.list().await.unwrap().is_empty());
        assert!(matches!(svc.delete(&id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn invalid_input_is_not_persisted() {
        let svc = service();
        let err = svc
            .create(input(json!({"title": "t", "url": "invalid", "rating": 4})))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(e) => assert_eq!(e.message, "URL must be valid."),
            other => panic!("unexpected error: {other}"),
        }
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn output_is_sanitized_but_storage_keeps_raw_text() {
        let store = Arc::new(MemoryStore::new());
        let svc = BookmarkService::new(store.clone());
        let created = svc
            .create(input(json!({
                "title": "Naughty <script>alert(\"xss\");</script>",
                "url": "https://www.hackers.com",
                "rating": 1
            })))
            .await
            .unwrap();

        assert_eq!(created.bookmark.title, "Naughty &lt;script&gt;alert(\"xss\");&lt;/script&gt;");
        assert_eq!(created.bookmark.description, "");
        let raw = store.get(&created.bookmark.id).await.unwrap().unwrap();
        assert_eq!(raw.title, "Naughty <script>alert(\"xss\");</script>");
    }

    struct FailingStore;

    #[async_trait]
    impl BookmarkStore for FailingStore {
        async fn list(&self) -> anyhow::Result<Vec<Bookmark>> {
            anyhow::bail!("connection reset")
        }
        async fn get(&self, _id: &str) -> anyhow::Result<Option<Bookmark>> {
            anyhow::bail!("connection reset")
        }
        async fn insert(&self, _bookmark: crate::model::NewBookmark) -> anyhow::Result<Bookmark> {
            anyhow::bail!("connection reset")
        }
        async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
            anyhow::bail!("connection reset")
        }
    }

    #[tokio::test]
    async fn storage_failures_surface_as_storage_errors() {
        let svc = BookmarkService::new(Arc::new(FailingStore));
        assert!(matches!(svc.list().await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.get("x").await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.create(valid()).await, Err(ServiceError::Storage(_))));
        assert!(matches!(svc.delete("x").await, Err(ServiceError::Storage(_))));
    }
}
