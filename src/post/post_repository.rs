use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::{Collection, Database, IndexModel};
use regex::RegexBuilder;
use tokio::sync::RwLock;

use crate::post::post_model::Post;
use crate::utils::error::CustomError;

/// Filter for listing posts. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub category_id: Option<ObjectId>,
    pub author_id: Option<ObjectId>,
    /// Posts carrying at least one comment by this user.
    pub commented_by: Option<ObjectId>,
    /// Case-insensitive literal match on title or content.
    pub search: Option<String>,
    pub created_after: Option<DateTime>,
}

impl PostQuery {
    pub fn matches(&self, post: &Post) -> bool {
        if self.category_id.is_some_and(|id| post.category_id != id) {
            return false;
        }
        if self.author_id.is_some_and(|id| post.author_id != id) {
            return false;
        }
        if let Some(user) = self.commented_by {
            if !post.comments.iter().any(|c| c.author_id == user) {
                return false;
            }
        }
        if self.created_after.is_some_and(|after| post.created_at < after) {
            return false;
        }
        if let Some(term) = self.search.as_deref() {
            let Ok(pattern) = RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
            else {
                return false;
            };
            if !pattern.is_match(&post.title) && !pattern.is_match(&post.content) {
                return false;
            }
        }
        true
    }

    fn to_filter(&self) -> Document {
        let mut filter = Document::new();
        if let Some(id) = self.category_id {
            filter.insert("category_id", id);
        }
        if let Some(id) = self.author_id {
            filter.insert("author_id", id);
        }
        if let Some(id) = self.commented_by {
            filter.insert("comments.author_id", id);
        }
        if let Some(after) = self.created_after {
            filter.insert("created_at", doc! { "$gte": after });
        }
        if let Some(term) = self.search.as_deref() {
            let pattern = regex::escape(term);
            filter.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "content": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }
        filter
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> Result<Post, CustomError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, CustomError>;

    /// Newest first.
    async fn find(&self, query: &PostQuery) -> Result<Vec<Post>, CustomError>;

    /// Compare-and-swap save: succeeds only if the stored version still equals
    /// `post.version`. Returns the post with its version bumped.
    async fn replace(&self, post: Post) -> Result<Post, CustomError>;

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError>;
}

fn post_not_found() -> CustomError {
    CustomError::NotFoundError("Post not found".into())
}

fn stale_write() -> CustomError {
    CustomError::ConflictError("Post was modified concurrently, please retry".into())
}

/// The stored form of the next version: bumped counter and a fresh score.
fn next_version(mut post: Post) -> Post {
    post.version += 1;
    post.refresh_score();
    post
}

pub struct MongoPostRepository {
    collection: Collection<Post>,
}

impl MongoPostRepository {
    pub fn new(db: &Database) -> Self {
        MongoPostRepository {
            collection: db.collection::<Post>("posts"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), CustomError> {
        let indexes = [
            doc! { "created_at": -1 },
            doc! { "category_id": 1, "created_at": -1 },
            doc! { "author_id": 1, "created_at": -1 },
            doc! { "comments.author_id": 1 },
        ];
        for keys in indexes {
            self.collection
                .create_index(IndexModel::builder().keys(keys).build())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, mut post: Post) -> Result<Post, CustomError> {
        post.refresh_score();
        self.collection.insert_one(&post).await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to create post: {}", e))
        })?;
        Ok(post)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, CustomError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find(&self, query: &PostQuery) -> Result<Vec<Post>, CustomError> {
        let cursor = self
            .collection
            .find(query.to_filter())
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, post: Post) -> Result<Post, CustomError> {
        let expected = post.version;
        let next = next_version(post);

        let result = self
            .collection
            .replace_one(doc! { "_id": next.id, "version": expected }, &next)
            .await?;

        if result.matched_count == 0 {
            return match self.collection.find_one(doc! { "_id": next.id }).await? {
                Some(_) => {
                    log::warn!("Stale write rejected for post {} at version {}", next.id, expected);
                    Err(stale_write())
                }
                None => Err(post_not_found()),
            };
        }
        Ok(next)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<ObjectId, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, mut post: Post) -> Result<Post, CustomError> {
        post.refresh_score();
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(CustomError::ConflictError("Post already exists".into()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Post>, CustomError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn find(&self, query: &PostQuery) -> Result<Vec<Post>, CustomError> {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts.values().filter(|p| query.matches(p)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn replace(&self, post: Post) -> Result<Post, CustomError> {
        let mut posts = self.posts.write().await;
        let slot = posts.get_mut(&post.id).ok_or_else(post_not_found)?;
        if slot.version != post.version {
            return Err(stale_write());
        }
        let next = next_version(post);
        *slot = next.clone();
        Ok(next)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError> {
        Ok(self.posts.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::ledger::VoteDirection;

    fn post(title: &str, content: &str) -> Post {
        Post::new(ObjectId::new(), ObjectId::new(), title.into(), content.into())
    }

    #[actix_web::test]
    async fn stale_version_is_rejected() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post("Hi", "there")).await.unwrap();

        let mut first = stored.clone();
        let mut second = stored.clone();
        first.apply_vote(ObjectId::new(), VoteDirection::Up);
        second.apply_vote(ObjectId::new(), VoteDirection::Down);

        let saved = repo.replace(first).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = repo.replace(second).await.unwrap_err();
        assert!(matches!(err, CustomError::ConflictError(_)));

        let current = repo.find_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(current.score, 1);
    }

    #[actix_web::test]
    async fn replacing_a_deleted_post_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let stored = repo.insert(post("Hi", "there")).await.unwrap();
        assert!(repo.delete(&stored.id).await.unwrap());

        let err = repo.replace(stored).await.unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));
    }

    #[actix_web::test]
    async fn replace_recomputes_a_stale_score() {
        let repo = InMemoryPostRepository::new();
        let mut stored = repo.insert(post("Hi", "there")).await.unwrap();
        stored.upvoters.insert(ObjectId::new());
        stored.score = 42;

        let saved = repo.replace(stored).await.unwrap();
        assert_eq!(saved.score, 1);
    }

    #[test]
    fn search_is_literal_and_case_insensitive() {
        let query = PostQuery {
            search: Some("C++".into()),
            ..Default::default()
        };
        assert!(query.matches(&post("Learning c++ today", "")));
        assert!(!query.matches(&post("Learning C today", "")));

        let query = PostQuery {
            search: Some("RUST".into()),
            ..Default::default()
        };
        assert!(query.matches(&post("Weekly thread", "all about rust")));
    }

    #[test]
    fn commented_by_filters_on_comment_authors() {
        let user = ObjectId::new();
        let mut with = post("a", "b");
        with.add_comment(user, "hello").unwrap();
        let without = post("c", "d");

        let query = PostQuery {
            commented_by: Some(user),
            ..Default::default()
        };
        assert!(query.matches(&with));
        assert!(!query.matches(&without));
    }
}
