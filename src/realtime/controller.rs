use actix::Addr;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_web_actors::ws;
use serde::Deserialize;

use crate::middleware::auth::authenticate;
use crate::realtime::hub::BroadcastHub;
use crate::realtime::session::WsSession;

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /ws?token=<jwt>
///
/// The token is optional; without it the session starts anonymous and may send
/// an `authenticate` event later. A token that fails verification is rejected.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    hub: web::Data<Addr<BroadcastHub>>,
    query: web::Query<WsQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = match query.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => Some(authenticate(&req, token).await?.id.to_hex()),
        None => None,
    };

    log::info!("WebSocket upgrade requested (user {:?})", user_id);

    let session = WsSession::new(user_id, hub.get_ref().clone());
    ws::start(session, &req, stream)
}
