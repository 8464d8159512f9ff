use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::post::post_model::Post;
use crate::post::post_repository::{PostQuery, PostRepository};
use crate::post::post_view::{CommentView, Populator, PostView, UserCommentView};
use crate::user::model::AuthUser;
use crate::utils::error::CustomError;

/// Comments live inside their post; every change here is a versioned save of the post.
#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostRepository>,
    populator: Populator,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostRepository>, populator: Populator) -> Self {
        CommentService { posts, populator }
    }

    async fn load(&self, post_id: &ObjectId) -> Result<Post, CustomError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))
    }

    /// Prepend a comment. Returns the updated post and the new comment as rendered in it.
    pub async fn add_comment(
        &self,
        caller: &AuthUser,
        post_id: &ObjectId,
        content: &str,
    ) -> Result<(PostView, CommentView), CustomError> {
        let mut post = self.load(post_id).await?;
        let comment_id = post.add_comment(caller.id, content)?.id;
        let post = self.posts.replace(post).await?;

        log::info!("Comment {} added to post {} by {}", comment_id, post.id, caller.id);

        let view = self.populator.post(&post).await?;
        let comment = view
            .comments
            .iter()
            .find(|c| c.id == comment_id.to_hex())
            .cloned()
            .ok_or_else(|| CustomError::InternalServerError("Saved comment is missing".into()))?;
        Ok((view, comment))
    }

    /// Authors may delete their own comments; admins may delete any.
    pub async fn delete_comment(
        &self,
        caller: &AuthUser,
        post_id: &ObjectId,
        comment_id: &ObjectId,
    ) -> Result<PostView, CustomError> {
        let mut post = self.load(post_id).await?;
        post.remove_comment(comment_id, &caller.id, caller.is_admin())?;
        let post = self.posts.replace(post).await?;

        log::info!("Comment {} deleted from post {} by {}", comment_id, post.id, caller.id);
        self.populator.post(&post).await
    }

    pub async fn comments_by_user(&self, user_id: &ObjectId) -> Result<Vec<UserCommentView>, CustomError> {
        let posts = self
            .posts
            .find(&PostQuery {
                commented_by: Some(*user_id),
                ..Default::default()
            })
            .await?;
        self.populator.user_comments(user_id, &posts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::repository::InMemoryCategoryRepository;
    use crate::post::post_repository::InMemoryPostRepository;
    use crate::user::model::Role;
    use crate::user::repository::InMemoryUserRepository;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: ObjectId::new(),
            username: "someone".into(),
            role,
        }
    }

    async fn setup() -> (CommentService, ObjectId) {
        let posts = Arc::new(InMemoryPostRepository::new());
        let post = posts
            .insert(Post::new(ObjectId::new(), ObjectId::new(), "t".into(), "c".into()))
            .await
            .unwrap();
        let populator = Populator::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryCategoryRepository::new()),
        );
        (CommentService::new(posts, populator), post.id)
    }

    #[actix_web::test]
    async fn newest_comment_comes_first() {
        let (service, post_id) = setup().await;
        let author = caller(Role::User);

        service.add_comment(&author, &post_id, "first").await.unwrap();
        let (view, comment) = service.add_comment(&author, &post_id, "second").await.unwrap();

        assert_eq!(view.comments[0].id, comment.id);
        assert_eq!(view.comments.len(), 2);
    }

    #[actix_web::test]
    async fn empty_comment_is_bad_request() {
        let (service, post_id) = setup().await;
        let err = service
            .add_comment(&caller(Role::User), &post_id, "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::BadRequestError(_)));
    }

    #[actix_web::test]
    async fn stranger_cannot_delete_but_admin_can() {
        let (service, post_id) = setup().await;
        let author = caller(Role::User);
        let (_, comment) = service.add_comment(&author, &post_id, "mine").await.unwrap();
        let comment_id = ObjectId::parse_str(&comment.id).unwrap();

        let err = service
            .delete_comment(&caller(Role::User), &post_id, &comment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::NotOwnerError(_)));

        let view = service
            .delete_comment(&caller(Role::Admin), &post_id, &comment_id)
            .await
            .unwrap();
        assert!(view.comments.is_empty());
    }

    #[actix_web::test]
    async fn user_comments_span_posts() {
        let (service, post_id) = setup().await;
        let author = caller(Role::User);
        service.add_comment(&author, &post_id, "one").await.unwrap();
        service.add_comment(&caller(Role::User), &post_id, "other").await.unwrap();
        service.add_comment(&author, &post_id, "two").await.unwrap();

        let mine = service.comments_by_user(&author.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].comment.content, "two");
        assert_eq!(mine[0].post_title, "t");
    }
}
