use std::collections::BTreeSet;

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::comment::model::Comment;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub content: String,
    pub category_id: ObjectId,
    pub author_id: ObjectId,
    #[serde(default)]
    pub upvoters: BTreeSet<ObjectId>,
    #[serde(default)]
    pub downvoters: BTreeSet<ObjectId>,
    #[serde(default)]
    pub likers: BTreeSet<ObjectId>,
    /// Denormalized `|upvoters| - |downvoters|`, kept for sorting in the store.
    #[serde(default)]
    pub score: i64,
    /// Newest first.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Bumped on every successful write; writes against a stale version are rejected.
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Post {
    pub fn new(author_id: ObjectId, category_id: ObjectId, title: String, content: String) -> Self {
        let now = crate::utils::helpers::now();
        Post {
            id: ObjectId::new(),
            title,
            content,
            category_id,
            author_id,
            upvoters: BTreeSet::new(),
            downvoters: BTreeSet::new(),
            likers: BTreeSet::new(),
            score: 0,
            comments: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

pub const TITLE_MAX_LEN: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category_id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: String,
}

#[derive(Deserialize, Default)]
pub struct PostListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}
