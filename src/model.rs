use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: i64,
}

/// A bookmark that passed validation and is waiting for the store to assign an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub rating: i64,
}

impl NewBookmark {
    pub fn with_id(self, id: String) -> Bookmark {
        Bookmark {
            id,
            title: self.title,
            url: self.url,
            description: self.description,
            rating: self.rating,
        }
    }
}

/// Inbound create payload. `rating` stays untyped so a malformed value can be
/// reported as a validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookmark {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<JsonValue>,
}

/// What callers see: title and description already run through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedBookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBookmark {
    pub bookmark: SerializedBookmark,
    pub location: String,
}

pub fn bookmark_path(id: &str) -> String {
    format!("/bookmarks/{}", id)
}
