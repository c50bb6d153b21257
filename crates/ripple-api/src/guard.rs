use ripple_db::models::{PostRow, ReactionRow};
use ripple_types::api::Claims;

use crate::error::ApiError;

/// Authorization policy for destructive mutations. Every check runs before
/// the write; a rejection aborts the request with no side effects — nothing
/// is deleted and nothing is broadcast.

pub fn can_delete_post(actor: &Claims, post: &PostRow) -> Result<(), ApiError> {
    if post.user_id != actor.sub.to_string() {
        return Err(ApiError::Forbidden(
            "You are not authorized to do the action".into(),
        ));
    }
    Ok(())
}

/// Comments are deleted leaf-first: a comment with replies is never
/// deletable. The ownership subject is the *post* owner, not the comment
/// owner — clients depend on this exact policy and its 403 message.
pub fn can_delete_comment(
    actor: &Claims,
    post: &PostRow,
    child_count: i64,
) -> Result<(), ApiError> {
    if child_count > 0 || post.user_id != actor.sub.to_string() {
        return Err(ApiError::Forbidden(
            "Comment cannot be deleted, someone commented on this already".into(),
        ));
    }
    Ok(())
}

pub fn can_delete_reaction(actor: &Claims, reaction: &ReactionRow) -> Result<(), ApiError> {
    if reaction.user_id != actor.sub.to_string() {
        return Err(ApiError::Forbidden(
            "You are not authorized to do the action".into(),
        ));
    }
    Ok(())
}
