use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use ripple_types::api::{
    Claims, CreatePostRequest, DeletedEnvelope, PostEnvelope, PostListResponse, UpdatePostRequest,
};
use ripple_types::events::BroadcastEvent;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::guard;
use crate::middleware::Origin;
use crate::projection::post_resource;

const MAX_BODY_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor-based pagination — pass the `created_at` of the oldest post
    /// from the previous page to fetch older posts.
    pub before: Option<String>,
}

fn default_limit() -> u32 {
    10
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<PostListResponse>, ApiError> {
    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let limit = query.limit.min(100);
    let before = query.before;

    let rows = tokio::task::spawn_blocking(move || db.db.list_posts(limit, before.as_deref()))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    Ok(Json(PostListResponse {
        posts: rows.iter().map(post_resource).collect(),
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostEnvelope>), ApiError> {
    let body = validate_body(&req.body)?;

    let post_id = Uuid::new_v4();
    state.db.insert_post(
        &post_id.to_string(),
        &claims.sub.to_string(),
        &body,
        req.media_url.as_deref(),
    )?;

    // Re-read the stored row so the projection (response and broadcast
    // payload alike) reflects exactly what was persisted.
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("post {post_id} vanished after insert"))?;
    let post = post_resource(&row);

    let message = format!("Post created by {}", claims.username);
    state.dispatcher.publish(
        post.id,
        BroadcastEvent::PostCreated { post: post.clone() },
        origin,
    );
    state.dispatcher.publish(
        post.id,
        BroadcastEvent::Toast { message: message.clone() },
        origin,
    );

    Ok((StatusCode::CREATED, Json(PostEnvelope { message, post })))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostEnvelope>, ApiError> {
    // No ownership check on updates in this layer; the surrounding
    // deployment is expected to police it. Updates emit no broadcast —
    // there is no post-updated event in the catalog.
    state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    let body = validate_body(&req.body)?;
    state
        .db
        .update_post(&post_id.to_string(), &body, req.media_url.as_deref())?;

    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("post {post_id} vanished after update"))?;

    Ok(Json(PostEnvelope {
        message: "Post updated successfully".into(),
        post: post_resource(&row),
    }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
) -> Result<Json<DeletedEnvelope>, ApiError> {
    let row = state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;

    guard::can_delete_post(&claims, &row)?;

    // Project before the row disappears — the broadcast carries the final
    // state of the deleted post.
    let post = post_resource(&row);
    state.db.delete_post(&post_id.to_string())?;

    let message = format!("Post deleted by {}", claims.username);
    state.dispatcher.publish(
        post.id,
        BroadcastEvent::PostDeleted { post },
        origin,
    );
    state.dispatcher.publish(
        post_id,
        BroadcastEvent::Toast { message: message.clone() },
        origin,
    );

    Ok(Json(DeletedEnvelope { message }))
}

fn validate_body(raw: &str) -> Result<String, ApiError> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(ApiError::validation("body", "Body must not be empty"));
    }
    if body.len() > MAX_BODY_LEN {
        return Err(ApiError::validation(
            "body",
            format!("Body must not exceed {MAX_BODY_LEN} characters"),
        ));
    }
    Ok(body.to_string())
}
