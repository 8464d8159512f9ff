use super::controller::get_avatar;
use actix_web::web;

pub fn avatar_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/avatar/{identifier}", web::get().to(get_avatar));
}
