use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared across ripple-api (REST middleware) and ripple-gateway
/// (WebSocket identify handshake). Canonical definition lives here in
/// ripple-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub body: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub body: String,
    pub media_url: Option<String>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub body: String,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReactionRequest {
    pub kind: String,
}

// -- Projections --
//
// Client-safe views of persisted entities. Built once per request from the
// stored row; deterministic — the same entity state always projects to the
// same value. Internal columns (password hashes, raw FK strings) never
// appear here.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResource {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_username: String,
    pub body: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResource {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub user_id: Uuid,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionResource {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

// -- Response envelopes --

#[derive(Debug, Serialize)]
pub struct PostEnvelope {
    pub message: String,
    pub post: PostResource,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResource>,
}

#[derive(Debug, Serialize)]
pub struct CommentEnvelope {
    pub message: String,
    pub comment: CommentResource,
}

#[derive(Debug, Serialize)]
pub struct CommentListEnvelope {
    pub message: String,
    pub comments: Vec<CommentResource>,
}

#[derive(Debug, Serialize)]
pub struct ReactionEnvelope {
    pub message: String,
    pub react: ReactionResource,
}

#[derive(Debug, Serialize)]
pub struct DeletedEnvelope {
    pub message: String,
}
