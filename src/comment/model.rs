use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Embedded in [`crate::post::post_model::Post`]; it has no collection of its own.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub author_id: ObjectId,
    pub content: String,
    pub created_at: DateTime,
}

impl Comment {
    pub fn new(author_id: ObjectId, content: String) -> Self {
        Comment {
            id: ObjectId::new(),
            author_id,
            content,
            created_at: crate::utils::helpers::now(),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}
