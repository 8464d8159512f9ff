use super::post_controller::{
    add_comment, create_post, delete_comment, delete_post, get_post, get_posts, get_user_posts,
    like_post, update_post, vote_post,
};
use crate::middleware::auth::verify_token;
use crate::middleware::rate_limit::RateLimit;
use actix_web::{guard, web};
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn post_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .wrap(RateLimit::api())
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(RateLimit::create_post())
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::post().to(create_post)),
            )
            .route("", web::get().to(get_posts))
            .route("/user/{userId}", web::get().to(get_user_posts))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(update_post))
            .route("/{id}", web::delete().to(delete_post))
            .service(
                web::resource("/{id}/vote")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::put().to(vote_post)),
            )
            .service(
                web::resource("/{id}/like")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::put().to(like_post)),
            )
            .service(
                web::resource("/{id}/comments")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::post().to(add_comment)),
            )
            .service(
                web::resource("/{id}/comments/{commentId}")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::delete().to(delete_comment)),
            ),
    );
}
