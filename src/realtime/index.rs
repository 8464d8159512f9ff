use super::controller::ws_connect;
use actix_web::web;

pub fn realtime_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_connect));
}
