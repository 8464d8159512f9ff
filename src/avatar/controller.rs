use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::avatar::service::{AvatarService, fallback_svg};

const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

/// GET /api/avatar/{identifier}
///
/// Always answers with an SVG; upstream failures fall back to a letter avatar.
pub async fn get_avatar(avatar_service: web::Data<AvatarService>, path: web::Path<String>) -> HttpResponse {
    let identifier = path.into_inner();

    match avatar_service.fetch_svg(&identifier).await {
        Ok(svg) => HttpResponse::Ok()
            .content_type(SVG_CONTENT_TYPE)
            .insert_header((header::CACHE_CONTROL, "public, max-age=3600"))
            .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
            .body(svg),
        Err(e) => {
            log::warn!("Avatar proxy failed for {}: {}", identifier, e);
            HttpResponse::Ok()
                .content_type(SVG_CONTENT_TYPE)
                .insert_header((header::CACHE_CONTROL, "no-cache"))
                .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                .body(fallback_svg(&identifier))
        }
    }
}
