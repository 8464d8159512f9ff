use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Running, StreamHandler};
use actix_web_actors::ws;
use uuid::Uuid;

use crate::realtime::hub::{Authenticate, Broadcast, BroadcastHub, Connect, Disconnect, WsMessage};
use crate::realtime::model::{ClientEvent, ServerEvent};

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WsSession {
    pub session_id: String,
    /// Known once a token or an `authenticate` event identified the client.
    pub user_id: Option<String>,
    pub hub: Addr<BroadcastHub>,
    pub last_heartbeat: Instant,
}

impl WsSession {
    pub fn new(user_id: Option<String>, hub: Addr<BroadcastHub>) -> Self {
        WsSession {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            hub,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                log::warn!("Session {} heartbeat timeout, disconnecting", act.session_id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn broadcast(&self, event: ServerEvent, include_self: bool) {
        self.hub.do_send(Broadcast {
            event,
            skip_session: (!include_self).then(|| self.session_id.clone()),
        });
    }

    /// Record the user an `authenticate` event names.
    ///
    /// The claim is trusted as a presence hint only: nothing checks it against a
    /// credential, so anonymous sessions may name any user. A session opened with a
    /// verified `?token=` keeps that identity and rejects claims for anyone else.
    fn claim_identity(&mut self, user_id: &str) -> Result<(), &'static str> {
        match &self.user_id {
            Some(current) if current != user_id => {
                Err("Session is already authenticated as another user")
            }
            _ => {
                self.user_id = Some(user_id.to_string());
                Ok(())
            }
        }
    }

    fn handle_event(&mut self, event: ClientEvent, ctx: &mut ws::WebsocketContext<Self>) {
        match event {
            ClientEvent::Authenticate { user_id } => match self.claim_identity(&user_id) {
                Ok(()) => {
                    self.hub.do_send(Authenticate {
                        session_id: self.session_id.clone(),
                        user_id,
                    });
                }
                Err(message) => {
                    self.send_event(&ServerEvent::Error { message: message.into() }, ctx);
                }
            },
            ClientEvent::NewPost { post } => {
                self.broadcast(ServerEvent::PostCreated { post }, true);
            }
            ClientEvent::NewComment { post_id, comment } => {
                self.broadcast(ServerEvent::CommentAdded { post_id, comment }, true);
            }
            ClientEvent::LikePost { post_id, user_id } => {
                self.broadcast(ServerEvent::PostLiked { post_id, user_id }, true);
            }
            ClientEvent::Typing { post_id, user } => {
                self.broadcast(ServerEvent::UserTyping { post_id, user }, false);
            }
            ClientEvent::Ping => {
                self.send_event(&ServerEvent::Pong, ctx);
            }
        }
    }

    fn send_event(&self, event: &ServerEvent, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.text(event.to_json());
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);

        self.hub.do_send(Connect {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            addr: ctx.address().recipient(),
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.hub.do_send(Disconnect {
            session_id: self.session_id.clone(),
        });
        Running::Stop
    }
}

impl Handler<WsMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: WsMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => self.handle_event(event, ctx),
                    Err(e) => {
                        log::warn!("Unparseable event on session {}: {}", self.session_id, e);
                        self.send_event(
                            &ServerEvent::Error {
                                message: format!("Invalid message format: {}", e),
                            },
                            ctx,
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Binary messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}
