use std::sync::Arc;

use mongodb::bson::{DateTime, oid::ObjectId};

use crate::category::repository::CategoryRepository;
use crate::post::ledger::VoteDirection;
use crate::post::post_model::{CreatePostRequest, Post, PostListQuery, TITLE_MAX_LEN, UpdatePostRequest};
use crate::post::post_repository::{PostQuery, PostRepository};
use crate::post::post_view::{Populator, PostView};
use crate::user::model::AuthUser;
use crate::user::repository::UserRepository;
use crate::utils::error::CustomError;
use crate::utils::helpers::{now, parse_object_id};

pub const TRENDING_WINDOW_DAYS: i64 = 7;

/// Start of the trending window relative to `now`.
pub fn trending_cutoff(now: DateTime) -> DateTime {
    DateTime::from_millis(now.timestamp_millis() - TRENDING_WINDOW_DAYS * 24 * 60 * 60 * 1000)
}

/// Order by score, then like count, then recency, all descending.
pub fn rank_trending(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.tally()
            .cmp(&a.tally())
            .then_with(|| b.likers.len().cmp(&a.likers.len()))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn validate_title(title: &str) -> Result<String, CustomError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CustomError::ValidationError("Please add a title".into()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(CustomError::ValidationError(format!(
            "Title can not be more than {} characters",
            TITLE_MAX_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String, CustomError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CustomError::ValidationError("Please add some content".into()));
    }
    Ok(content.to_string())
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    populator: Populator,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        let populator = Populator::new(users.clone(), categories.clone());
        PostService {
            posts,
            users,
            categories,
            populator,
        }
    }

    pub fn populator(&self) -> &Populator {
        &self.populator
    }

    pub async fn load(&self, id: &ObjectId) -> Result<Post, CustomError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Post not found".into()))
    }

    async fn ensure_category(&self, raw: &str) -> Result<ObjectId, CustomError> {
        let id = parse_object_id(raw, "category")?;
        if self.categories.find_by_id(&id).await?.is_none() {
            return Err(CustomError::NotFoundError("Category not found".into()));
        }
        Ok(id)
    }

    pub async fn list(&self, params: PostListQuery) -> Result<Vec<PostView>, CustomError> {
        let mut query = PostQuery::default();

        if let Some(category) = params.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query.category_id = Some(self.ensure_category(category).await?);
        }
        query.search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let trending = params.sort.as_deref() == Some("trending");
        if trending {
            query.created_after = Some(trending_cutoff(now()));
        }

        let mut posts = self.posts.find(&query).await?;
        if trending {
            rank_trending(&mut posts);
        }

        self.populator.posts(&posts).await
    }

    pub async fn get(&self, id: &ObjectId) -> Result<PostView, CustomError> {
        let post = self.load(id).await?;
        self.populator.post(&post).await
    }

    pub async fn user_posts(&self, user_id: &ObjectId) -> Result<Vec<PostView>, CustomError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(CustomError::NotFoundError("User not found".into()));
        }
        let posts = self
            .posts
            .find(&PostQuery {
                author_id: Some(*user_id),
                ..Default::default()
            })
            .await?;
        self.populator.posts(&posts).await
    }

    pub async fn create(&self, caller: &AuthUser, req: CreatePostRequest) -> Result<PostView, CustomError> {
        let title = validate_title(&req.title)?;
        let content = validate_content(&req.content)?;
        let category_id = self.ensure_category(&req.category_id).await?;

        let post = self
            .posts
            .insert(Post::new(caller.id, category_id, title, content))
            .await?;
        log::info!("Post {} created by {}", post.id, caller.id);

        self.populator.post(&post).await
    }

    pub async fn update(
        &self,
        caller: &AuthUser,
        id: &ObjectId,
        req: UpdatePostRequest,
    ) -> Result<PostView, CustomError> {
        let mut post = self.load(id).await?;
        if post.author_id != caller.id {
            return Err(CustomError::ForbiddenError(
                "Not authorized to update this post".into(),
            ));
        }

        if let Some(title) = req.title {
            post.title = validate_title(&title)?;
        }
        if let Some(content) = req.content {
            post.content = validate_content(&content)?;
        }
        if let Some(category) = req.category_id {
            post.category_id = self.ensure_category(&category).await?;
        }
        post.updated_at = now();

        let post = self.posts.replace(post).await?;
        log::info!("Post {} updated by {}", post.id, caller.id);
        self.populator.post(&post).await
    }

    /// The author or an admin may delete.
    pub async fn delete(&self, caller: &AuthUser, id: &ObjectId) -> Result<(), CustomError> {
        let post = self.load(id).await?;
        if post.author_id != caller.id && !caller.is_admin() {
            return Err(CustomError::ForbiddenError(
                "Not authorized to delete this post".into(),
            ));
        }

        if !self.posts.delete(id).await? {
            return Err(CustomError::NotFoundError("Post not found".into()));
        }
        log::info!("Post {} deleted by {}", id, caller.id);
        Ok(())
    }

    /// Toggle the caller's vote. Publishes nothing.
    pub async fn vote(&self, caller: &AuthUser, id: &ObjectId, vote_type: &str) -> Result<PostView, CustomError> {
        let direction: VoteDirection = vote_type.parse()?;

        let mut post = self.load(id).await?;
        let state = post.apply_vote(caller.id, direction);
        let post = self.posts.replace(post).await?;

        log::info!(
            "Vote {} by {} on post {}: now {:?}, score {}",
            direction,
            caller.id,
            post.id,
            state,
            post.score
        );
        self.populator.post(&post).await
    }

    /// Toggle the caller's like. Returns the post and whether it is now liked.
    pub async fn toggle_like(&self, caller: &AuthUser, id: &ObjectId) -> Result<(PostView, bool), CustomError> {
        let mut post = self.load(id).await?;
        let liked = post.toggle_like(caller.id);
        let post = self.posts.replace(post).await?;

        log::info!(
            "Post {} {} by {}",
            post.id,
            if liked { "liked" } else { "unliked" },
            caller.id
        );
        Ok((self.populator.post(&post).await?, liked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::model::Category;
    use crate::category::repository::InMemoryCategoryRepository;
    use crate::post::post_repository::InMemoryPostRepository;
    use crate::post::post_view::Ref;
    use crate::user::model::{Role, User};
    use crate::user::repository::InMemoryUserRepository;

    struct Fixture {
        service: PostService,
        category: Category,
        ada: AuthUser,
        bob: AuthUser,
    }

    async fn user(users: &InMemoryUserRepository, name: &str, role: Role) -> AuthUser {
        let user = users
            .insert(User {
                id: ObjectId::new(),
                username: name.into(),
                email: format!("{}@example.com", name),
                password: "hash".into(),
                avatar: None,
                bio: None,
                role,
                created_at: now(),
                updated_at: now(),
            })
            .await
            .unwrap();
        AuthUser::from(&user)
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let categories = Arc::new(InMemoryCategoryRepository::new());
        let category = categories
            .insert(Category::new("Programming", None, None, None))
            .await
            .unwrap();
        let ada = user(&users, "ada", Role::User).await;
        let bob = user(&users, "bob", Role::User).await;

        Fixture {
            service: PostService::new(Arc::new(InMemoryPostRepository::new()), users, categories),
            category,
            ada,
            bob,
        }
    }

    fn request(title: &str, category: &Category) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            content: "Body".into(),
            category_id: category.id.to_hex(),
        }
    }

    fn post_id(view: &PostView) -> ObjectId {
        ObjectId::parse_str(&view.id).unwrap()
    }

    #[actix_web::test]
    async fn created_post_is_populated() {
        let f = fixture().await;
        let view = f.service.create(&f.ada, request("  Hello  ", &f.category)).await.unwrap();

        assert_eq!(view.title, "Hello");
        assert!(matches!(&view.author, Ref::Resolved(u) if u.username == "ada"));
        assert!(matches!(&view.category, Ref::Resolved(c) if c.slug == "programming"));
        assert_eq!(view.score, 0);
    }

    #[actix_web::test]
    async fn title_over_limit_is_rejected() {
        let f = fixture().await;
        let long = "x".repeat(TITLE_MAX_LEN + 1);
        let err = f.service.create(&f.ada, request(&long, &f.category)).await.unwrap_err();
        assert!(matches!(err, CustomError::ValidationError(_)));

        let exact = "x".repeat(TITLE_MAX_LEN);
        assert!(f.service.create(&f.ada, request(&exact, &f.category)).await.is_ok());
    }

    #[actix_web::test]
    async fn unknown_category_is_not_found() {
        let f = fixture().await;
        let ghost = Category::new("Ghost", None, None, None);
        let err = f.service.create(&f.ada, request("Hi", &ghost)).await.unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));
    }

    #[actix_web::test]
    async fn vote_scenario_through_the_store() {
        let f = fixture().await;
        let id = post_id(&f.service.create(&f.ada, request("Hi", &f.category)).await.unwrap());

        assert_eq!(f.service.vote(&f.ada, &id, "up").await.unwrap().score, 1);
        assert_eq!(f.service.vote(&f.bob, &id, "down").await.unwrap().score, 0);
        let view = f.service.vote(&f.ada, &id, "down").await.unwrap();
        assert_eq!(view.score, -2);
        assert!(view.upvoters.is_empty());
        assert_eq!(view.downvoters.len(), 2);
    }

    #[actix_web::test]
    async fn invalid_vote_type_is_bad_request() {
        let f = fixture().await;
        let id = post_id(&f.service.create(&f.ada, request("Hi", &f.category)).await.unwrap());

        let err = f.service.vote(&f.ada, &id, "sideways").await.unwrap_err();
        assert!(matches!(err, CustomError::BadRequestError(_)));
    }

    #[actix_web::test]
    async fn vote_on_missing_post_is_not_found() {
        let f = fixture().await;
        let err = f.service.vote(&f.ada, &ObjectId::new(), "up").await.unwrap_err();
        assert!(matches!(err, CustomError::NotFoundError(_)));
    }

    #[actix_web::test]
    async fn only_author_updates_and_admin_may_delete() {
        let f = fixture().await;
        let id = post_id(&f.service.create(&f.ada, request("Hi", &f.category)).await.unwrap());

        let err = f
            .service
            .update(
                &f.bob,
                &id,
                UpdatePostRequest {
                    title: Some("Mine now".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::ForbiddenError(_)));

        let err = f.service.delete(&f.bob, &id).await.unwrap_err();
        assert!(matches!(err, CustomError::ForbiddenError(_)));

        let admin = AuthUser {
            role: Role::Admin,
            ..f.bob.clone()
        };
        f.service.delete(&admin, &id).await.unwrap();
        assert!(matches!(
            f.service.get(&id).await.unwrap_err(),
            CustomError::NotFoundError(_)
        ));
    }

    #[actix_web::test]
    async fn like_toggle_leaves_score_alone() {
        let f = fixture().await;
        let id = post_id(&f.service.create(&f.ada, request("Hi", &f.category)).await.unwrap());
        f.service.vote(&f.bob, &id, "down").await.unwrap();

        let (view, liked) = f.service.toggle_like(&f.bob, &id).await.unwrap();
        assert!(liked);
        assert_eq!(view.likes, vec![f.bob.id.to_hex()]);
        assert_eq!(view.score, -1);

        let (view, liked) = f.service.toggle_like(&f.bob, &id).await.unwrap();
        assert!(!liked);
        assert!(view.likes.is_empty());
    }

    #[actix_web::test]
    async fn list_filters_by_category_and_search() {
        let f = fixture().await;
        f.service.create(&f.ada, request("Rust tips", &f.category)).await.unwrap();
        f.service.create(&f.ada, request("Go tips", &f.category)).await.unwrap();

        let found = f
            .service
            .list(PostListQuery {
                category: Some(f.category.id.to_hex()),
                search: Some("rust".into()),
                sort: None,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Rust tips");

        let err = f
            .service
            .list(PostListQuery {
                category: Some("nope".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CustomError::BadRequestError(_)));
    }

    #[test]
    fn trending_orders_by_score_then_likes_then_recency() {
        let author = ObjectId::new();
        let category = ObjectId::new();
        let mk = |title: &str, created: i64| {
            let mut post = Post::new(author, category, title.into(), "c".into());
            post.created_at = DateTime::from_millis(created);
            post
        };

        let mut top = mk("top", 1_000);
        top.apply_vote(ObjectId::new(), VoteDirection::Up);
        top.apply_vote(ObjectId::new(), VoteDirection::Up);

        let mut liked = mk("liked", 1_000);
        liked.apply_vote(ObjectId::new(), VoteDirection::Up);
        liked.toggle_like(ObjectId::new());

        let older = mk("older", 1_000);
        let newer = mk("newer", 2_000);

        let mut posts = vec![older, newer, liked, top];
        rank_trending(&mut posts);
        let order: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(order, vec!["top", "liked", "newer", "older"]);
    }

    #[test]
    fn trending_window_is_seven_days() {
        let now = DateTime::from_millis(10 * 24 * 60 * 60 * 1000);
        assert_eq!(
            trending_cutoff(now).timestamp_millis(),
            3 * 24 * 60 * 60 * 1000
        );
    }
}
