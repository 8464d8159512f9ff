use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use crate::category::model::{
    Category, CreateCategoryRequest, DEFAULT_CATEGORIES, UpdateCategoryRequest, slugify,
};
use crate::category::repository::CategoryRepository;
use crate::utils::error::CustomError;

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        CategoryService { categories }
    }

    /// Insert the default categories when none exist yet. Returns how many were inserted.
    pub async fn seed_defaults(&self) -> Result<usize, CustomError> {
        if self.categories.count().await? > 0 {
            return Ok(0);
        }

        let defaults = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, slug)| Category::new(name, Some(slug), None, None))
            .collect();
        let inserted = self.categories.insert_many(defaults).await?;
        log::info!("Seeded {} default categories", inserted);
        Ok(inserted)
    }

    pub async fn list(&self) -> Result<Vec<Category>, CustomError> {
        self.categories.find_all().await
    }

    pub async fn get_by_id(&self, id: &ObjectId) -> Result<Category, CustomError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Category not found".into()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, CustomError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Category not found".into()))
    }

    pub async fn create(&self, req: CreateCategoryRequest) -> Result<Category, CustomError> {
        if req.name.trim().is_empty() {
            return Err(CustomError::ValidationError(
                "Please provide a category name".into(),
            ));
        }

        let category = Category::new(&req.name, req.slug.as_deref(), req.description, req.icon);
        self.ensure_unique(&category.name, &category.slug, None).await?;

        let category = self.categories.insert(category).await?;
        log::info!("Category created: {} ({})", category.name, category.slug);
        Ok(category)
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        req: UpdateCategoryRequest,
    ) -> Result<Category, CustomError> {
        let mut category = self.get_by_id(id).await?;

        if let Some(name) = req.name.map(|n| n.trim().to_string()) {
            if name.is_empty() {
                return Err(CustomError::ValidationError(
                    "Please provide a category name".into(),
                ));
            }
            category.name = name;
        }
        match req.slug.map(|s| s.trim().to_string()) {
            Some(slug) if !slug.is_empty() => category.slug = slug,
            Some(_) => category.slug = slugify(&category.name),
            None => {}
        }
        if let Some(description) = req.description {
            category.description = Some(description.trim().to_string());
        }
        if let Some(icon) = req.icon {
            category.icon = icon;
        }

        self.ensure_unique(&category.name, &category.slug, Some(category.id))
            .await?;

        self.categories
            .update(category)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Category not found".into()))
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<(), CustomError> {
        if !self.categories.delete(id).await? {
            return Err(CustomError::NotFoundError("Category not found".into()));
        }
        log::info!("Category deleted: {}", id);
        Ok(())
    }

    async fn ensure_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<ObjectId>,
    ) -> Result<(), CustomError> {
        let taken = |found: Option<Category>| found.is_some_and(|c| Some(c.id) != except);

        if taken(self.categories.find_by_name(name).await?) {
            return Err(CustomError::ConflictError(
                "Category name already exists".into(),
            ));
        }
        if taken(self.categories.find_by_slug(slug).await?) {
            return Err(CustomError::ConflictError(
                "Category slug already exists".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::repository::InMemoryCategoryRepository;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(InMemoryCategoryRepository::new()))
    }

    #[actix_web::test]
    async fn seeding_only_happens_on_empty_collection() {
        let service = service();
        assert_eq!(service.seed_defaults().await.unwrap(), DEFAULT_CATEGORIES.len());
        assert_eq!(service.seed_defaults().await.unwrap(), 0);

        let arts = service.get_by_slug("arts-culture").await.unwrap();
        assert_eq!(arts.name, "Arts & Culture");
    }

    #[actix_web::test]
    async fn duplicate_names_are_rejected() {
        let service = service();
        let req = || CreateCategoryRequest {
            name: "Rust".into(),
            slug: None,
            description: None,
            icon: None,
        };
        service.create(req()).await.unwrap();
        let err = service.create(req()).await.unwrap_err();
        assert!(matches!(err, CustomError::ConflictError(_)));
    }

    #[actix_web::test]
    async fn update_keeps_own_name_without_conflict() {
        let service = service();
        let created = service
            .create(CreateCategoryRequest {
                name: "Rust".into(),
                slug: None,
                description: None,
                icon: None,
            })
            .await
            .unwrap();

        let updated = service
            .update(
                &created.id,
                UpdateCategoryRequest {
                    description: Some("Systems programming".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "rust");
        assert_eq!(updated.description.as_deref(), Some("Systems programming"));
    }
}
