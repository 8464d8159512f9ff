use actix::Addr;
use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::comment::model::CreateCommentRequest;
use crate::comment::service::CommentService;
use crate::post::post_model::{CreatePostRequest, PostListQuery, UpdatePostRequest, VoteRequest};
use crate::post::post_service::PostService;
use crate::realtime::hub::{Broadcast, BroadcastHub};
use crate::realtime::model::ServerEvent;
use crate::user::model::AuthUser;
use crate::utils::error::CustomError;
use crate::utils::helpers::parse_object_id;

fn publish(hub: &Addr<BroadcastHub>, event: ServerEvent) {
    hub.do_send(Broadcast::to_all(event));
}

/// GET /api/posts?category=&search=&sort=
pub async fn get_posts(
    post_service: web::Data<PostService>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse, CustomError> {
    let posts = post_service.list(query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": posts.len(),
        "data": posts
    })))
}

/// GET /api/posts/{id}
pub async fn get_post(
    post_service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    let post = post_service.get(&post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": post
    })))
}

/// GET /api/posts/user/{userId}
pub async fn get_user_posts(
    post_service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = parse_object_id(&path.into_inner(), "user")?;
    let posts = post_service.user_posts(&user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": posts.len(),
        "data": posts
    })))
}

/// POST /api/posts
pub async fn create_post(
    caller: AuthUser,
    post_service: web::Data<PostService>,
    hub: web::Data<Addr<BroadcastHub>>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, CustomError> {
    let post = post_service.create(&caller, body.into_inner()).await?;

    publish(
        &hub,
        ServerEvent::PostCreated {
            post: serde_json::to_value(&post).unwrap_or_default(),
        },
    );

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": post
    })))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    caller: AuthUser,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    let post = post_service.update(&caller, &post_id, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": post
    })))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    caller: AuthUser,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    post_service.delete(&caller, &post_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": {}
    })))
}

/// PUT /api/posts/{id}/vote
///
/// Answers with the bare post. Vote changes are not broadcast.
pub async fn vote_post(
    caller: AuthUser,
    post_service: web::Data<PostService>,
    path: web::Path<String>,
    body: web::Json<VoteRequest>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    let post = post_service.vote(&caller, &post_id, &body.vote_type).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// PUT /api/posts/{id}/like
pub async fn like_post(
    caller: AuthUser,
    post_service: web::Data<PostService>,
    hub: web::Data<Addr<BroadcastHub>>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    let (post, _) = post_service.toggle_like(&caller, &post_id).await?;

    publish(
        &hub,
        ServerEvent::PostLiked {
            post_id: post.id.clone(),
            user_id: caller.id.to_hex(),
        },
    );

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": post
    })))
}

/// POST /api/posts/{id}/comments
///
/// Answers with the bare post, newest comment first.
pub async fn add_comment(
    caller: AuthUser,
    comment_service: web::Data<CommentService>,
    hub: web::Data<Addr<BroadcastHub>>,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let post_id = parse_object_id(&path.into_inner(), "post")?;
    let (post, comment) = comment_service
        .add_comment(&caller, &post_id, &body.content)
        .await?;

    publish(
        &hub,
        ServerEvent::CommentAdded {
            post_id: post.id.clone(),
            comment: serde_json::to_value(&comment).unwrap_or_default(),
        },
    );

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}/comments/{commentId}
pub async fn delete_comment(
    caller: AuthUser,
    comment_service: web::Data<CommentService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, CustomError> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = parse_object_id(&post_id, "post")?;
    let comment_id = parse_object_id(&comment_id, "comment")?;

    let post = comment_service
        .delete_comment(&caller, &post_id, &comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": post
    })))
}
