mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Bookmark, NewBookmark};

pub use memory::MemoryStore;

/// Backing store for bookmarks. Implementations assign ids on insert.
#[async_trait]
pub trait BookmarkStore: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Bookmark>>;

    async fn get(&self, id: &str) -> Result<Option<Bookmark>>;

    /// Persists the bookmark under a freshly generated id and returns the stored row.
    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark>;

    /// Returns `true` if a bookmark with this id existed and was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The two bookmarks a fresh demo store starts with.
pub fn demo_bookmarks() -> Vec<NewBookmark> {
    vec![
        NewBookmark {
            title: "Google".to_string(),
            url: "https://www.google.com".to_string(),
            description: Some("my favorite search engine".to_string()),
            rating: 4,
        },
        NewBookmark {
            title: "Thinkful".to_string(),
            url: "https://www.thinkful.com".to_string(),
            description: Some("Think outside the classroom".to_string()),
            rating: 5,
        },
    ]
}
