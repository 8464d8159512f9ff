use super::controller::{
    create_category, delete_category, get_categories, get_category_by_id, get_category_by_slug,
    update_category,
};
use actix_web::web;

pub fn category_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(get_categories))
            .route("", web::post().to(create_category))
            .route("/id/{id}", web::get().to(get_category_by_id))
            .route("/slug/{slug}", web::get().to(get_category_by_slug))
            .route("/{id}", web::put().to(update_category))
            .route("/{id}", web::delete().to(delete_category)),
    );
}
