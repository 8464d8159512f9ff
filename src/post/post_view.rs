//! Populated, client-facing shapes of a post.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Serialize, Serializer};

use crate::category::model::Category;
use crate::category::repository::CategoryRepository;
use crate::comment::model::Comment;
use crate::post::post_model::Post;
use crate::user::model::User;
use crate::user::repository::UserRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::to_chrono;

/// A reference to another document, either still just an id or expanded into a summary.
/// Serializes as the hex id string or as the summary object respectively.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    Unresolved(ObjectId),
    Resolved(T),
}

impl<T> Ref<T> {
    pub fn lookup(id: ObjectId, found: &HashMap<ObjectId, T>) -> Self
    where
        T: Clone,
    {
        match found.get(&id) {
            Some(summary) => Ref::Resolved(summary.clone()),
            None => Ref::Unresolved(id),
        }
    }
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ref::Unresolved(id) => serializer.serialize_str(&id.to_hex()),
            Ref::Resolved(summary) => summary.serialize(serializer),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.to_hex(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategorySummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub icon: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        CategorySummary {
            id: category.id.to_hex(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            icon: category.icon.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: Ref<UserSummary>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment listed outside its post, as on a user's profile.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserCommentView {
    #[serde(flatten)]
    pub comment: CommentView,
    pub post_id: String,
    pub post_title: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Ref<CategorySummary>,
    pub author: Ref<UserSummary>,
    pub upvoters: Vec<String>,
    pub downvoters: Vec<String>,
    pub likes: Vec<String>,
    /// Computed from the vote sets, never read from storage.
    pub score: i64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn hex_ids<'a>(ids: impl IntoIterator<Item = &'a ObjectId>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_hex()).collect()
}

fn comment_view(comment: &Comment, users: &HashMap<ObjectId, UserSummary>) -> CommentView {
    CommentView {
        id: comment.id.to_hex(),
        author: Ref::lookup(comment.author_id, users),
        content: comment.content.clone(),
        created_at: to_chrono(comment.created_at),
    }
}

fn post_view(
    post: &Post,
    users: &HashMap<ObjectId, UserSummary>,
    categories: &HashMap<ObjectId, CategorySummary>,
) -> PostView {
    PostView {
        id: post.id.to_hex(),
        title: post.title.clone(),
        content: post.content.clone(),
        category: Ref::lookup(post.category_id, categories),
        author: Ref::lookup(post.author_id, users),
        upvoters: hex_ids(&post.upvoters),
        downvoters: hex_ids(&post.downvoters),
        likes: hex_ids(&post.likers),
        score: post.tally(),
        comments: post.comments.iter().map(|c| comment_view(c, users)).collect(),
        created_at: to_chrono(post.created_at),
        updated_at: to_chrono(post.updated_at),
    }
}

/// Expands author, category and comment-author references with one batched lookup per store.
/// References whose document is gone stay [`Ref::Unresolved`].
#[derive(Clone)]
pub struct Populator {
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl Populator {
    pub fn new(users: Arc<dyn UserRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Populator { users, categories }
    }

    async fn user_summaries(
        &self,
        ids: Vec<ObjectId>,
    ) -> Result<HashMap<ObjectId, UserSummary>, CustomError> {
        let mut ids = ids;
        ids.sort();
        ids.dedup();
        let users = self.users.find_many(&ids).await?;
        Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
    }

    async fn category_summaries(
        &self,
        ids: Vec<ObjectId>,
    ) -> Result<HashMap<ObjectId, CategorySummary>, CustomError> {
        let mut ids = ids;
        ids.sort();
        ids.dedup();
        let categories = self.categories.find_many(&ids).await?;
        Ok(categories
            .iter()
            .map(|c| (c.id, CategorySummary::from(c)))
            .collect())
    }

    pub async fn posts(&self, posts: &[Post]) -> Result<Vec<PostView>, CustomError> {
        let user_ids = posts
            .iter()
            .flat_map(|p| std::iter::once(p.author_id).chain(p.comments.iter().map(|c| c.author_id)))
            .collect();
        let category_ids = posts.iter().map(|p| p.category_id).collect();

        let users = self.user_summaries(user_ids).await?;
        let categories = self.category_summaries(category_ids).await?;

        Ok(posts
            .iter()
            .map(|p| post_view(p, &users, &categories))
            .collect())
    }

    pub async fn post(&self, post: &Post) -> Result<PostView, CustomError> {
        let mut views = self.posts(std::slice::from_ref(post)).await?;
        views
            .pop()
            .ok_or_else(|| CustomError::InternalServerError("Failed to populate post".into()))
    }

    /// Every comment by `author` across `posts`, newest first.
    pub async fn user_comments(
        &self,
        author: &ObjectId,
        posts: &[Post],
    ) -> Result<Vec<UserCommentView>, CustomError> {
        let users = self.user_summaries(vec![*author]).await?;

        let mut found: Vec<(&Post, &Comment)> = posts
            .iter()
            .flat_map(|p| p.comments.iter().map(move |c| (p, c)))
            .filter(|(_, c)| c.author_id == *author)
            .collect();
        found.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));

        Ok(found
            .into_iter()
            .map(|(post, comment)| UserCommentView {
                comment: comment_view(comment, &users),
                post_id: post.id.to_hex(),
                post_title: post.title.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unresolved_ref_serializes_as_id() {
        let id = ObjectId::new();
        let r: Ref<UserSummary> = Ref::Unresolved(id);
        assert_eq!(serde_json::to_value(&r).unwrap(), json!(id.to_hex()));
    }

    #[test]
    fn resolved_ref_serializes_as_object() {
        let r = Ref::Resolved(UserSummary {
            id: "abc".into(),
            username: "ada".into(),
            avatar: None,
        });
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({ "_id": "abc", "username": "ada", "avatar": null })
        );
    }

    #[test]
    fn view_score_comes_from_the_sets() {
        let mut post = Post::new(ObjectId::new(), ObjectId::new(), "t".into(), "c".into());
        post.upvoters.insert(ObjectId::new());
        post.upvoters.insert(ObjectId::new());
        post.downvoters.insert(ObjectId::new());
        post.score = -7;

        let view = post_view(&post, &HashMap::new(), &HashMap::new());
        assert_eq!(view.score, 1);
        assert!(matches!(view.author, Ref::Unresolved(id) if id == post.author_id));
    }

    #[test]
    fn lookup_resolves_known_ids_only() {
        let known = ObjectId::new();
        let summary = CategorySummary {
            id: known.to_hex(),
            name: "Programming".into(),
            slug: "programming".into(),
            icon: "folder".into(),
        };
        let found = HashMap::from([(known, summary.clone())]);

        assert_eq!(Ref::lookup(known, &found), Ref::Resolved(summary));
        let missing = ObjectId::new();
        assert_eq!(Ref::lookup(missing, &found), Ref::Unresolved(missing));
    }
}
