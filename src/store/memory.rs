use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookmarkStore, new_id};
use crate::model::{Bookmark, NewBookmark};

/// Process-local store. Keeps insertion order; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    bookmarks: RwLock<Vec<Bookmark>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookmarks(seed: Vec<NewBookmark>) -> Self {
        let bookmarks = seed.into_iter().map(|b| b.with_id(new_id())).collect();
        Self {
            bookmarks: RwLock::new(bookmarks),
        }
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Bookmark>> {
        Ok(self.bookmarks.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Bookmark>> {
        let bookmarks = self.bookmarks.read().await;
        Ok(bookmarks.iter().find(|b| b.id == id).cloned())
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark> {
        let bookmark = bookmark.with_id(new_id());
        self.bookmarks.write().await.push(bookmark.clone());
        Ok(bookmark)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut bookmarks = self.bookmarks.write().await;
        match bookmarks.iter().position(|b| b.id == id) {
            Some(index) => {
                bookmarks.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
