use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::category::model::{CategoryView, CreateCategoryRequest, UpdateCategoryRequest};
use crate::category::service::CategoryService;
use crate::user::model::AuthUser;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;

fn require_admin(caller: &AuthUser) -> Result<(), CustomError> {
    if !caller.is_admin() {
        log::warn!("User {} attempted a category change without admin role", caller.id);
        return Err(CustomError::ForbiddenError(
            "Only admins can manage categories".into(),
        ));
    }
    Ok(())
}

/// GET /api/categories
pub async fn get_categories(
    category_service: web::Data<CategoryService>,
) -> Result<HttpResponse, CustomError> {
    let categories: Vec<CategoryView> = category_service
        .list()
        .await?
        .iter()
        .map(CategoryView::from)
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": categories.len(),
        "data": categories
    })))
}

/// GET /api/categories/id/{id}
pub async fn get_category_by_id(
    category_service: web::Data<CategoryService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let id = parse_object_id(&path.into_inner(), "category")?;
    let category = category_service.get_by_id(&id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": CategoryView::from(&category)
    })))
}

/// GET /api/categories/slug/{slug}
pub async fn get_category_by_slug(
    category_service: web::Data<CategoryService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let category = category_service.get_by_slug(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": CategoryView::from(&category)
    })))
}

/// POST /api/categories (admin)
pub async fn create_category(
    caller: AuthUser,
    category_service: web::Data<CategoryService>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, CustomError> {
    require_admin(&caller)?;
    let category = category_service.create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": CategoryView::from(&category)
    })))
}

/// PUT /api/categories/{id} (admin)
pub async fn update_category(
    caller: AuthUser,
    category_service: web::Data<CategoryService>,
    path: web::Path<String>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, CustomError> {
    require_admin(&caller)?;
    let id = parse_object_id(&path.into_inner(), "category")?;
    let category = category_service.update(&id, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": CategoryView::from(&category)
    })))
}

/// DELETE /api/categories/{id} (admin)
pub async fn delete_category(
    caller: AuthUser,
    category_service: web::Data<CategoryService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    require_admin(&caller)?;
    let id = parse_object_id(&path.into_inner(), "category")?;
    category_service.delete(&id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {}
    })))
}
