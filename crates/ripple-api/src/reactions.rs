use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use ripple_types::api::{Claims, CreateReactionRequest, ReactionEnvelope};
use ripple_types::events::BroadcastEvent;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::guard;
use crate::middleware::Origin;
use crate::projection::reaction_resource;

const MAX_KIND_LEN: usize = 32;

pub async fn create_reaction(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
    Json(req): Json<CreateReactionRequest>,
) -> Result<(StatusCode, Json<ReactionEnvelope>), ApiError> {
    if state.db.get_post(&post_id.to_string())?.is_none() {
        return Err(ApiError::NotFound("Post not found".into()));
    }

    let kind = req.kind.trim();
    if kind.is_empty() || kind.len() > MAX_KIND_LEN {
        return Err(ApiError::validation(
            "kind",
            format!("Kind must be between 1 and {MAX_KIND_LEN} characters"),
        ));
    }

    let reaction_id = Uuid::new_v4();
    let inserted = state.db.insert_reaction(
        &reaction_id.to_string(),
        &post_id.to_string(),
        &claims.sub.to_string(),
        kind,
    )?;
    if !inserted {
        return Err(ApiError::validation(
            "kind",
            "You have already reacted to this post with this kind",
        ));
    }

    let row = state
        .db
        .get_reaction(&reaction_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("reaction {reaction_id} vanished after insert"))?;
    let react = reaction_resource(&row);

    state.dispatcher.publish(
        post_id,
        BroadcastEvent::ReactCreated { react: react.clone() },
        origin,
    );

    Ok((
        StatusCode::CREATED,
        Json(ReactionEnvelope {
            message: "Reaction added successfully".into(),
            react,
        }),
    ))
}

pub async fn delete_reaction(
    State(state): State<AppState>,
    Path((post_id, reaction_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    Origin(origin): Origin,
) -> Result<Json<ReactionEnvelope>, ApiError> {
    let row = state
        .db
        .get_reaction(&reaction_id.to_string())?
        .filter(|row| row.post_id == post_id.to_string())
        .ok_or_else(|| ApiError::NotFound("Reaction not found".into()))?;

    guard::can_delete_reaction(&claims, &row)?;

    let react = reaction_resource(&row);
    state.db.delete_reaction(&reaction_id.to_string())?;

    state.dispatcher.publish(
        post_id,
        BroadcastEvent::ReactDeleted { react: react.clone() },
        origin,
    );

    Ok(Json(ReactionEnvelope {
        message: "Reaction removed successfully".into(),
        react,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{claims_for, test_state};
    use ripple_types::events::post_channel;

    fn seed_post(state: &AppState, claims: &Claims) -> Uuid {
        let id = Uuid::new_v4();
        state
            .db
            .insert_post(&id.to_string(), &claims.sub.to_string(), "a post", None)
            .unwrap();
        id
    }

    #[tokio::test]
    async fn reaction_deleted_payload_omits_the_post() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let bob = claims_for(&state, "bob");
        let post_id = seed_post(&state, &alice);

        let (_, Json(created)) = create_reaction(
            State(state.clone()),
            Path(post_id),
            Extension(bob.clone()),
            Origin(None),
            Json(CreateReactionRequest { kind: "like".into() }),
        )
        .await
        .unwrap();

        let mut rx = dispatcher.subscribe();
        let Json(envelope) = delete_reaction(
            State(state.clone()),
            Path((post_id, created.react.id)),
            Extension(bob),
            Origin(Some(Uuid::new_v4())),
        )
        .await
        .unwrap();

        assert_eq!(envelope.react.id, created.react.id);

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.event, "react.deleted");
        assert_eq!(frame.channel, post_channel(post_id));
        // Delivered to all subscribers, originator included.
        assert_eq!(frame.exclude, None);
        assert!(frame.payload.get("react").is_some());
        assert!(frame.payload.get("post").is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn duplicate_reaction_is_a_validation_error() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let post_id = seed_post(&state, &alice);

        create_reaction(
            State(state.clone()),
            Path(post_id),
            Extension(alice.clone()),
            Origin(None),
            Json(CreateReactionRequest { kind: "like".into() }),
        )
        .await
        .unwrap();

        let mut rx = dispatcher.subscribe();
        let err = create_reaction(
            State(state.clone()),
            Path(post_id),
            Extension(alice),
            Origin(None),
            Json(CreateReactionRequest { kind: "like".into() }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn only_the_reaction_owner_may_delete_it() {
        let (state, dispatcher) = test_state();
        let alice = claims_for(&state, "alice");
        let bob = claims_for(&state, "bob");
        let post_id = seed_post(&state, &alice);

        let (_, Json(created)) = create_reaction(
            State(state.clone()),
            Path(post_id),
            Extension(bob),
            Origin(None),
            Json(CreateReactionRequest { kind: "like".into() }),
        )
        .await
        .unwrap();

        let mut rx = dispatcher.subscribe();
        let err = delete_reaction(
            State(state.clone()),
            Path((post_id, created.react.id)),
            Extension(alice),
            Origin(None),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(state.db.get_reaction(&created.react.id.to_string()).unwrap().is_some());
        assert!(rx.try_recv().is_err());
    }
}
