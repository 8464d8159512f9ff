use super::controller::{
    get_me, get_user_profile, login_user, logout_user, register_user, update_details, update_user,
};
use crate::middleware::auth::verify_token;
use crate::middleware::rate_limit::RateLimit;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/register")
                    .wrap(RateLimit::auth())
                    .route(web::post().to(register_user)),
            )
            .service(
                web::resource("/login")
                    .wrap(RateLimit::auth())
                    .route(web::post().to(login_user)),
            )
            .service(
                web::resource("/logout")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::post().to(logout_user)),
            )
            .service(
                web::resource("/me")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::get().to(get_me)),
            )
            .service(
                web::resource("/updatedetails")
                    .wrap(HttpAuthentication::bearer(verify_token))
                    .route(web::put().to(update_details)),
            ),
    );

    cfg.service(
        web::scope("/users")
            .wrap(RateLimit::api())
            .route("/{id}", web::get().to(get_user_profile))
            .route("/{id}", web::put().to(update_user)),
    );
}
