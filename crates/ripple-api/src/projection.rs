use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use ripple_db::models::{CommentRow, PostRow, ReactionRow};
use ripple_types::api::{CommentResource, PostResource, ReactionResource};

/// Builders for the client-safe projections that go into responses and
/// broadcast payloads. Pure functions of the stored row: the same row always
/// projects to the same resource.

pub fn post_resource(row: &PostRow) -> PostResource {
    PostResource {
        id: parse_id(&row.id, "post id"),
        user_id: parse_id(&row.user_id, "post user_id"),
        author_username: row.author_username.clone(),
        body: row.body.clone(),
        media_url: row.media_url.clone(),
        created_at: parse_timestamp(&row.created_at, "post"),
    }
}

pub fn comment_resource(row: &CommentRow) -> CommentResource {
    CommentResource {
        id: parse_id(&row.id, "comment id"),
        post_id: parse_id(&row.post_id, "comment post_id"),
        parent_comment_id: row
            .parent_comment_id
            .as_deref()
            .map(|raw| parse_id(raw, "comment parent_comment_id")),
        user_id: parse_id(&row.user_id, "comment user_id"),
        author_username: row.author_username.clone(),
        body: row.body.clone(),
        created_at: parse_timestamp(&row.created_at, "comment"),
    }
}

pub fn reaction_resource(row: &ReactionRow) -> ReactionResource {
    ReactionResource {
        id: parse_id(&row.id, "reaction id"),
        post_id: parse_id(&row.post_id, "reaction post_id"),
        user_id: parse_id(&row.user_id, "reaction user_id"),
        kind: row.kind.clone(),
        created_at: parse_timestamp(&row.created_at, "reaction"),
    }
}

fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", context, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}
