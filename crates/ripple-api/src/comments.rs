use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use ripple_db::models::{CommentRow, PostRow};
use ripple_types::api::{
    Claims, CommentEnvelope, CommentListEnvelope, CreateCommentRequest, UpdateCommentRequest,
};
use ripple_types::events::BroadcastEvent;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::guard;
use crate::middleware::Origin;
use crate::projection::{comment_resource, post_resource};

const MAX_BODY_LEN: usize = 2000;

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<CommentListEnvelope>, ApiError> {
    fetch_post(&state, post_id)?;

    let rows = state.db.list_comments(&post_id.to_string())?;
    Ok(Json(CommentListEnvelope {
        message: "Comments fetched successfully".into(),
        comments: rows.iter().map(comment_resource).collect(),
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentEnvelope>), ApiError> {
    let post_row = fetch_post(&state, post_id)?;
    let body = validate_body(&req.body)?;

    // A reply must target a comment on the same post.
    if let Some(parent_id) = req.parent_comment_id {
        let parent = state
            .db
            .get_comment(&parent_id.to_string())?
            .filter(|parent| parent.post_id == post_id.to_string());
        if parent.is_none() {
            return Err(ApiError::validation(
                "parent_comment_id",
                "Parent comment does not belong to this post",
            ));
        }
    }

    let comment_id = Uuid::new_v4();
    state.db.insert_comment(
        &comment_id.to_string(),
        &post_id.to_string(),
        req.parent_comment_id.map(|id| id.to_string()).as_deref(),
        &claims.sub.to_string(),
        &body,
    )?;

    let row = state
        .db
        .get_comment(&comment_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("comment {comment_id} vanished after insert"))?;
    let comment = comment_resource(&row);

    state.dispatcher.publish(
        post_id,
        BroadcastEvent::CommentCreated {
            post: post_resource(&post_row),
            comment: comment.clone(),
        },
        origin,
    );

    Ok((
        StatusCode::CREATED,
        Json(CommentEnvelope {
            message: "Comment added successfully".into(),
            comment,
        }),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentEnvelope>, ApiError> {
    // No ownership check on updates in this layer; no comment-updated event
    // exists in the catalog, so nothing is broadcast.
    fetch_comment(&state, post_id, comment_id)?;
    let body = validate_body(&req.body)?;

    state.db.update_comment(&comment_id.to_string(), &body)?;

    let row = state
        .db
        .get_comment(&comment_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("comment {comment_id} vanished after update"))?;

    Ok(Json(CommentEnvelope {
        message: "Comment updated successfully".into(),
        comment: comment_resource(&row),
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
) -> Result<Json<CommentEnvelope>, ApiError> {
    let post_row = fetch_post(&state, post_id)?;
    let comment_row = fetch_comment(&state, post_id, comment_id)?;

    let child_count = state.db.count_child_comments(&comment_id.to_string())?;
    guard::can_delete_comment(&claims, &post_row, child_count)?;

    let comment = comment_resource(&comment_row);
    state.db.delete_comment(&comment_id.to_string())?;

    state.dispatcher.publish(
        post_id,
        BroadcastEvent::CommentDeleted {
            post: post_resource(&post_row),
            comment: comment.clone(),
        },
        origin,
    );

    Ok(Json(CommentEnvelope {
        message: "Comment deleted successfully".into(),
        comment,
    }))
}

fn fetch_post(state: &AppState, post_id: Uuid) -> Result<PostRow, ApiError> {
    state
        .db
        .get_post(&post_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))
}

fn fetch_comment(state: &AppState, post_id: Uuid, comment_id: Uuid) -> Result<CommentRow, ApiError> {
    state
        .db
        .get_comment(&comment_id.to_string())?
        .filter(|row| row.post_id == post_id.to_string())
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{claims_for, test_state};
    use ripple_types::events::post_channel;

    fn seed_post(state: &AppState, claims: &Claims, body: &str) -> Uuid {
        let id = Uuid::new_v4();
        state
            .db
            .insert_post(&id.to_string(), &claims.sub.to_string(), body, None)
            .unwrap();
        id
    }

    #[tokio::test]
    async fn comment_creation_broadcasts_post_and_comment_to_all() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let bob = claims_for(&state, "bob");
        let post_id = seed_post(&state, &alice, "a post");
        let mut rx = dispatcher.subscribe();
        let origin = Uuid::new_v4();

        let (status, Json(envelope)) = create_comment(
            State(state.clone()),
            Path(post_id),
            Extension(bob),
            Origin(Some(origin)),
            Json(CreateCommentRequest { body: "nice".into(), parent_comment_id: None }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(envelope.comment.post_id, post_id);

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.event, "PostCommentCreated");
        assert_eq!(frame.channel, post_channel(post_id));
        // Comment events go to all subscribers, including the originator.
        assert_eq!(frame.exclude, None);
        assert!(frame.payload.get("post").is_some());
        assert!(frame.payload.get("comment").is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reply_to_comment_on_other_post_is_rejected() {
        let (state, _dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let post_a = seed_post(&state, &alice, "a");
        let post_b = seed_post(&state, &alice, "b");

        let (_, Json(on_a)) = create_comment(
            State(state.clone()),
            Path(post_a),
            Extension(alice.clone()),
            Origin(None),
            Json(CreateCommentRequest { body: "root".into(), parent_comment_id: None }),
        )
        .await
        .unwrap();

        let err = create_comment(
            State(state.clone()),
            Path(post_b),
            Extension(alice),
            Origin(None),
            Json(CreateCommentRequest {
                body: "cross-post reply".into(),
                parent_comment_id: Some(on_a.comment.id),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn comment_with_reply_cannot_be_deleted_even_by_post_owner() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let post_id = seed_post(&state, &alice, "a post");

        let (_, Json(parent)) = create_comment(
            State(state.clone()),
            Path(post_id),
            Extension(alice.clone()),
            Origin(None),
            Json(CreateCommentRequest { body: "parent".into(), parent_comment_id: None }),
        )
        .await
        .unwrap();
        create_comment(
            State(state.clone()),
            Path(post_id),
            Extension(alice.clone()),
            Origin(None),
            Json(CreateCommentRequest {
                body: "child".into(),
                parent_comment_id: Some(parent.comment.id),
            }),
        )
        .await
        .unwrap();

        let mut rx = dispatcher.subscribe();
        let err = delete_comment(
            State(state.clone()),
            Path((post_id, parent.comment.id)),
            Extension(alice),
            Origin(None),
        )
        .await
        .unwrap_err();

        let ApiError::Forbidden(message) = err else {
            panic!("expected Forbidden");
        };
        assert_eq!(message, "Comment cannot be deleted, someone commented on this already");
        assert!(state.db.get_comment(&parent.comment.id.to_string()).unwrap().is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leaf_comment_delete_by_post_owner_broadcasts_deleted() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let bob = claims_for(&state, "bob");
        let post_id = seed_post(&state, &alice, "a post");

        let (_, Json(created)) = create_comment(
            State(state.clone()),
            Path(post_id),
            Extension(bob.clone()),
            Origin(None),
            Json(CreateCommentRequest { body: "leaf".into(), parent_comment_id: None }),
        )
        .await
        .unwrap();

        // Bob wrote the comment, but only the post owner may delete it.
        let err = delete_comment(
            State(state.clone()),
            Path((post_id, created.comment.id)),
            Extension(bob),
            Origin(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let mut rx = dispatcher.subscribe();
        let Json(envelope) = delete_comment(
            State(state.clone()),
            Path((post_id, created.comment.id)),
            Extension(alice),
            Origin(None),
        )
        .await
        .unwrap();

        assert_eq!(envelope.comment.id, created.comment.id);
        assert!(state.db.get_comment(&created.comment.id.to_string()).unwrap().is_none());

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.event, "PostCommentDeleted");
        assert_eq!(frame.exclude, None);
        assert!(rx.try_recv().is_err());
    }
}
