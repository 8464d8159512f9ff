use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tokio::sync::RwLock;

use crate::category::model::Category;
use crate::utils::error::CustomError;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: Category) -> Result<Category, CustomError>;

    async fn insert_many(&self, categories: Vec<Category>) -> Result<usize, CustomError>;

    async fn count(&self) -> Result<u64, CustomError>;

    async fn find_all(&self) -> Result<Vec<Category>, CustomError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Category>, CustomError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, CustomError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, CustomError>;

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Category>, CustomError>;

    async fn update(&self, category: Category) -> Result<Option<Category>, CustomError>;

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError>;
}

pub struct MongoCategoryRepository {
    collection: Collection<Category>,
}

impl MongoCategoryRepository {
    pub fn new(db: &Database) -> Self {
        MongoCategoryRepository {
            collection: db.collection::<Category>("categories"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<(), CustomError> {
        for key in ["name", "slug"] {
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
impl CategoryRepository for MongoCategoryRepository {
    async fn insert(&self, category: Category) -> Result<Category, CustomError> {
        self.collection.insert_one(&category).await.map_err(|e| {
            CustomError::InternalServerError(format!("Failed to create category: {}", e))
        })?;
        Ok(category)
    }

    async fn insert_many(&self, categories: Vec<Category>) -> Result<usize, CustomError> {
        if categories.is_empty() {
            return Ok(0);
        }
        let result = self.collection.insert_many(categories).await?;
        Ok(result.inserted_ids.len())
    }

    async fn count(&self) -> Result<u64, CustomError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn find_all(&self) -> Result<Vec<Category>, CustomError> {
        let cursor = self.collection.find(doc! {}).sort(doc! { "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Category>, CustomError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, CustomError> {
        Ok(self.collection.find_one(doc! { "slug": slug }).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, CustomError> {
        Ok(self.collection.find_one(doc! { "name": name }).await?)
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Category>, CustomError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update(&self, category: Category) -> Result<Option<Category>, CustomError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": category.id }, &category)
            .await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(category))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<HashMap<ObjectId, Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn insert(&self, category: Category) -> Result<Category, CustomError> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(CustomError::ConflictError("Category already exists".into()));
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn insert_many(&self, categories: Vec<Category>) -> Result<usize, CustomError> {
        let mut inserted = 0;
        for category in categories {
            self.insert(category).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn count(&self) -> Result<u64, CustomError> {
        Ok(self.categories.read().await.len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<Category>, CustomError> {
        let mut all: Vec<Category> = self.categories.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Category>, CustomError> {
        Ok(self.categories.read().await.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, CustomError> {
        let categories = self.categories.read().await;
        Ok(categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, CustomError> {
        let categories = self.categories.read().await;
        Ok(categories.values().find(|c| c.name == name).cloned())
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Category>, CustomError> {
        let categories = self.categories.read().await;
        Ok(ids.iter().filter_map(|id| categories.get(id).cloned()).collect())
    }

    async fn update(&self, category: Category) -> Result<Option<Category>, CustomError> {
        let mut categories = self.categories.write().await;
        match categories.get_mut(&category.id) {
            Some(slot) => {
                *slot = category.clone();
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, CustomError> {
        Ok(self.categories.write().await.remove(id).is_some())
    }
}
