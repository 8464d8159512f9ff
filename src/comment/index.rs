use super::controller::get_user_comments;
use crate::middleware::rate_limit::RateLimit;
use actix_web::web;

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/comments")
            .wrap(RateLimit::api())
            .route("/user/{userId}", web::get().to(get_user_comments)),
    );
}
