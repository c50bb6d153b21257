/// Database row types — these map directly to SQLite rows.
/// Distinct from ripple-types API models to keep the DB layer independent.
/// `author_username` fields are filled by a JOIN on users, never stored.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub author_username: String,
    pub body: String,
    pub media_url: Option<String>,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub user_id: String,
    pub author_username: String,
    pub body: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub kind: String,
    pub created_at: String,
}
