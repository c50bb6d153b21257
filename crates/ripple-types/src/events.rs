use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::{CommentResource, PostResource, ReactionResource};

/// Name of the private channel carrying events for one post.
pub fn post_channel(post_id: Uuid) -> String {
    format!("post.{post_id}")
}

/// Whether a frame is delivered to every subscriber of the channel, or to
/// everyone except the connection that triggered the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryScope {
    All,
    OthersOnly,
}

/// Domain events broadcast on per-post channels after a successful mutation.
///
/// Transient by design: an event is constructed from the projected entity
/// immediately after the durable write, published once, and discarded.
/// Each variant maps to a fixed (wire name, payload, delivery scope) triple —
/// the mapping is part of the client protocol and must not drift.
#[derive(Debug, Clone)]
pub enum BroadcastEvent {
    PostCreated { post: PostResource },
    PostDeleted { post: PostResource },
    CommentCreated { post: PostResource, comment: CommentResource },
    CommentDeleted { post: PostResource, comment: CommentResource },
    ReactCreated { react: ReactionResource },
    ReactDeleted { react: ReactionResource },
    Toast { message: String },
}

impl BroadcastEvent {
    /// Short name the event travels under on the wire. The react events use
    /// dotted names; the rest broadcast under their type name.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::PostCreated { .. } => "PostCreated",
            Self::PostDeleted { .. } => "PostDeleted",
            Self::CommentCreated { .. } => "PostCommentCreated",
            Self::CommentDeleted { .. } => "PostCommentDeleted",
            Self::ReactCreated { .. } => "react.created",
            Self::ReactDeleted { .. } => "react.deleted",
            Self::Toast { .. } => "ToastrMessage",
        }
    }

    /// Post create/delete skip the originating connection so a client never
    /// re-processes its own action; everything else goes to all subscribers.
    pub fn delivery_scope(&self) -> DeliveryScope {
        match self {
            Self::PostCreated { .. } | Self::PostDeleted { .. } => DeliveryScope::OthersOnly,
            _ => DeliveryScope::All,
        }
    }

    /// Wire payload. Key sets are intentionally asymmetric per event type:
    /// comment events carry the parent post, react events carry only the
    /// reaction (the post is omitted to keep the frame small).
    pub fn payload(&self) -> Value {
        match self {
            Self::PostCreated { post } | Self::PostDeleted { post } => json!({ "post": post }),
            Self::CommentCreated { post, comment } | Self::CommentDeleted { post, comment } => {
                json!({ "post": post, "comment": comment })
            }
            Self::ReactCreated { react } | Self::ReactDeleted { react } => {
                json!({ "react": react })
            }
            Self::Toast { message } => json!({ "message": message }),
        }
    }
}

/// A published frame as it travels from the dispatcher to connections.
/// `exclude` is server-side routing state and never reaches the client.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub channel: String,
    pub event: &'static str,
    pub payload: Value,
    #[serde(skip)]
    pub exclude: Option<Uuid>,
}

/// Commands sent FROM client TO server over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Subscribe to the private channels of specific posts.
    /// The server only forwards frames for subscribed posts.
    Subscribe { post_ids: Vec<Uuid> },
}
