use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event sent by a WebSocket client, tagged by `type`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Attach a user id to an anonymous session
    Authenticate { user_id: String },
    NewPost { post: Value },
    NewComment { post_id: String, comment: Value },
    LikePost { post_id: String, user_id: String },
    Typing { post_id: String, user: Value },
    Ping,
}

/// Event pushed to WebSocket clients, tagged by `type`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    UserOnline { user_id: String },
    UserOffline { user_id: String },
    PostCreated { post: Value },
    CommentAdded { post_id: String, comment: Value },
    PostLiked { post_id: String, user_id: String },
    UserTyping { post_id: String, user: Value },
    Pong,
    Error { message: String },
}

impl ServerEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_use_camel_case_tags_and_fields() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "likePost",
            "postId": "p1",
            "userId": "u1",
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::LikePost {
                post_id: "p1".into(),
                user_id: "u1".into()
            }
        );

        let ping: ClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientEvent::Ping);
    }

    #[test]
    fn server_event_shape() {
        let event = ServerEvent::CommentAdded {
            post_id: "p1".into(),
            comment: json!({ "content": "hi" }),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "commentAdded", "postId": "p1", "comment": { "content": "hi" } })
        );
    }

    #[test]
    fn unknown_client_event_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"vote"}"#).is_err());
    }
}
