use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tokio::sync::RwLock;

use crate::user::model::User;
use crate::utils::error::CustomError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, CustomError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CustomError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CustomError>;

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError>;

    /// Replace the stored user, returning `None` when it no longer exists.
    async fn update(&self, user: User) -> Result<Option<User>, CustomError>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        MongoUserRepository {
            collection: db.collection::<User>("users"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), CustomError> {
        for key in ["email", "username"] {
            let mut keys = Document::new();
            keys.insert(key, 1);
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection.create_index(index).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: User) -> Result<User, CustomError> {
        self.collection.insert_one(&user).await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to create user: {}", e))
        })?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CustomError> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CustomError> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update(&self, user: User) -> Result<Option<User>, CustomError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": user.id }, &user)
            .await
            .map_err(|e| {
                CustomError::InternalServerError(format!("Failed to update user: {}", e))
            })?;

        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(user))
    }
}

/// Process-local user store; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<ObjectId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<User, CustomError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(CustomError::ConflictError("User already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, CustomError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CustomError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CustomError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<User>, CustomError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn update(&self, user: User) -> Result<Option<User>, CustomError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
