use std::collections::HashMap;

use actix::prelude::*;

use crate::realtime::model::ServerEvent;

/// Serialized event on its way to one session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct WsMessage(pub String);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub session_id: String,
    /// Set when the upgrade request carried a valid token.
    pub user_id: Option<String>,
    pub addr: Recipient<WsMessage>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub session_id: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Authenticate {
    pub session_id: String,
    pub user_id: String,
}

/// Fan an event out to every session except `skip_session`.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Broadcast {
    pub event: ServerEvent,
    pub skip_session: Option<String>,
}

impl Broadcast {
    pub fn to_all(event: ServerEvent) -> Self {
        Broadcast {
            event,
            skip_session: None,
        }
    }
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct SessionCount;

struct SessionEntry {
    user_id: Option<String>,
    addr: Recipient<WsMessage>,
}

/// Registry of live WebSocket sessions. One instance is started per server and
/// handed to handlers as `web::Data<Addr<BroadcastHub>>`.
#[derive(Default)]
pub struct BroadcastHub {
    sessions: HashMap<String, SessionEntry>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(&self, event: &ServerEvent, skip_session: Option<&str>) {
        let payload = event.to_json();
        for (session_id, entry) in &self.sessions {
            if skip_session != Some(session_id.as_str()) {
                entry.addr.do_send(WsMessage(payload.clone()));
            }
        }
    }
}

impl Actor for BroadcastHub {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        log::info!("Broadcast hub started");
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        log::info!("Broadcast hub stopped with {} sessions", self.sessions.len());
    }
}

impl Handler<Connect> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        log::info!("Session {} connected (user {:?})", msg.session_id, msg.user_id);

        self.sessions.insert(
            msg.session_id,
            SessionEntry {
                user_id: msg.user_id.clone(),
                addr: msg.addr,
            },
        );

        if let Some(user_id) = msg.user_id {
            self.send(&ServerEvent::UserOnline { user_id }, None);
        }
    }
}

impl Handler<Authenticate> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Authenticate, _: &mut Context<Self>) {
        let Some(entry) = self.sessions.get_mut(&msg.session_id) else {
            return;
        };
        entry.user_id = Some(msg.user_id.clone());
        self.send(&ServerEvent::UserOnline { user_id: msg.user_id }, None);
    }
}

impl Handler<Disconnect> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        log::info!("Session {} disconnected", msg.session_id);

        if let Some(SessionEntry {
            user_id: Some(user_id),
            ..
        }) = self.sessions.remove(&msg.session_id)
        {
            self.send(&ServerEvent::UserOffline { user_id }, None);
        }
    }
}

impl Handler<Broadcast> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Broadcast, _: &mut Context<Self>) {
        self.send(&msg.event, msg.skip_session.as_deref());
    }
}

impl Handler<SessionCount> for BroadcastHub {
    type Result = usize;

    fn handle(&mut self, _: SessionCount, _: &mut Context<Self>) -> usize {
        self.sessions.len()
    }
}
