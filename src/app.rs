use std::sync::Arc;
use std::time::Instant;

use actix::Addr;
use actix_web::web;
use mongodb::Client;

use crate::avatar::service::AvatarService;
use crate::category::repository::{CategoryRepository, InMemoryCategoryRepository, MongoCategoryRepository};
use crate::category::service::CategoryService;
use crate::comment::service::CommentService;
use crate::config::AppConfig;
use crate::database::RedisService;
use crate::middleware::error_handler::json_config;
use crate::post::post_repository::{InMemoryPostRepository, MongoPostRepository, PostRepository};
use crate::post::post_service::PostService;
use crate::realtime::BroadcastHub;
use crate::router::index::routes;
use crate::user::repository::{InMemoryUserRepository, MongoUserRepository, UserRepository};
use crate::user::service::UserService;
use crate::utils::error::CustomError;

/// The three document stores behind the services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Stores {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
        }
    }

    /// MongoDB-backed stores, with their indexes created.
    pub async fn mongo(client: &Client, database_name: &str) -> Result<Self, CustomError> {
        let db = client.database(database_name);

        let users = MongoUserRepository::new(&db);
        users.ensure_indexes().await?;
        let posts = MongoPostRepository::new(&db);
        posts.ensure_indexes().await?;
        let categories = MongoCategoryRepository::new(&db);
        categories.ensure_indexes().await?;

        Ok(Stores {
            users: Arc::new(users),
            posts: Arc::new(posts),
            categories: Arc::new(categories),
        })
    }
}

/// Process start, for the uptime reported by `/health`.
pub struct StartedAt(pub Instant);

/// Everything handlers pull from `app_data`, built once and shared by all workers.
#[derive(Clone)]
pub struct AppState {
    config: web::Data<AppConfig>,
    users: web::Data<UserService>,
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    categories: web::Data<CategoryService>,
    avatars: web::Data<AvatarService>,
    redis: Option<web::Data<RedisService>>,
    hub: web::Data<Addr<BroadcastHub>>,
    started_at: web::Data<StartedAt>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        stores: Stores,
        redis: Option<RedisService>,
        hub: Addr<BroadcastHub>,
    ) -> Self {
        let posts = PostService::new(
            stores.posts.clone(),
            stores.users.clone(),
            stores.categories.clone(),
        );
        let comments = CommentService::new(stores.posts.clone(), posts.populator().clone());

        AppState {
            users: web::Data::new(UserService::new(stores.users.clone(), config.clone())),
            avatars: web::Data::new(AvatarService::new(&config.avatar_api_url)),
            categories: web::Data::new(CategoryService::new(stores.categories.clone())),
            posts: web::Data::new(posts),
            comments: web::Data::new(comments),
            config: web::Data::new(config),
            redis: redis.map(web::Data::new),
            hub: web::Data::new(hub),
            started_at: web::Data::new(StartedAt(Instant::now())),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn category_service(&self) -> &CategoryService {
        &self.categories
    }

    pub fn user_service(&self) -> &UserService {
        &self.users
    }

    /// Register shared state and every route on an `App`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(json_config())
            .app_data(self.config.clone())
            .app_data(self.users.clone())
            .app_data(self.posts.clone())
            .app_data(self.comments.clone())
            .app_data(self.categories.clone())
            .app_data(self.avatars.clone())
            .app_data(self.hub.clone())
            .app_data(self.started_at.clone());

        if let Some(redis) = &self.redis {
            cfg.app_data(redis.clone());
        }

        cfg.configure(routes);
    }
}
