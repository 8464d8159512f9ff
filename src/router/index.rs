use actix::Addr;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use crate::app::StartedAt;
use crate::avatar::index::avatar_routes;
use crate::category::index::category_routes;
use crate::comment::index::comment_routes;
use crate::post::post_index::post_routes;
use crate::realtime::hub::{BroadcastHub, SessionCount};
use crate::realtime::index::realtime_routes;
use crate::user::index::user_routes;
use crate::utils::error::service_name;

async fn welcome() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the forum API",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": service_name(),
    }))
}

async fn health(started_at: web::Data<StartedAt>, hub: web::Data<Addr<BroadcastHub>>) -> impl Responder {
    let sessions = hub.send(SessionCount).await.unwrap_or(0);

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "uptime": started_at.0.elapsed().as_secs_f64(),
        "sessions": sessions,
    }))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(welcome));
    cfg.route("/health", web::get().to(health));
    cfg.configure(realtime_routes);
    cfg.service(
        web::scope("/api")
            .configure(user_routes)
            .configure(post_routes)
            .configure(comment_routes)
            .configure(category_routes)
            .configure(avatar_routes),
    );
}
