use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::comment::service::CommentService;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;

/// Every comment a user has written, newest first
/// GET /api/comments/user/{userId}
pub async fn get_user_comments(
    comment_service: web::Data<CommentService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = parse_object_id(&path.into_inner(), "user")?;
    let comments = comment_service.comments_by_user(&user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": comments.len(),
        "data": comments
    })))
}
