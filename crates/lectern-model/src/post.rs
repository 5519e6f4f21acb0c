//! Social feed posts with reactions, comments and bookmarks.

use crate::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Reaction a user can leave on a post. One reaction per user; setting a
/// new kind replaces the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Wow,
}

/// An append-only comment under a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Comment {
            id: generate_id("comment"),
            author_id: author_id.into(),
            author_name: author_name.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A feed entry. The tag list is derived from `#hashtags` in the text and
/// re-derived whenever the text is edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// One reaction per user, keyed by user ID.
    #[serde(default)]
    pub reactions: HashMap<String, ReactionKind>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// User IDs that bookmarked this post.
    #[serde(default)]
    pub bookmarks: BTreeSet<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Post {
    /// Create a post with a fresh ID, stamping the current time and deriving
    /// the tag list from the text.
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let tags = extract_tags(&text);
        Post {
            id: generate_id("post"),
            author_id: author_id.into(),
            author_name: author_name.into(),
            text,
            created_at: Utc::now(),
            reactions: HashMap::new(),
            comments: Vec::new(),
            bookmarks: BTreeSet::new(),
            tags,
        }
    }

    /// Replace the text and re-derive the tag list.
    pub fn edit(&mut self, new_text: impl Into<String>) {
        self.text = new_text.into();
        self.tags = extract_tags(&self.text);
    }
}

/// Extract the lowercase `#hashtags` from a post body, first occurrence
/// order, deduplicated.
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for token in text.split_whitespace() {
        if let Some(rest) = token.strip_prefix('#') {
            let tag: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}
