use crate::Database;
use crate::models::{CommentRow, PostRow, ReactionRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        user_id: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, user_id, body, media_url) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, user_id, body, media_url],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn update_post(&self, id: &str, body: &str, media_url: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET body = ?2, media_url = ?3 WHERE id = ?1",
                rusqlite::params![id, body, media_url],
            )?;
            Ok(())
        })
    }

    /// Deletes the post. Comments and reactions go with it (FK cascade).
    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn list_posts(&self, limit: u32, before: Option<&str>) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| query_posts(conn, limit, before))
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        parent_comment_id: Option<&str>,
        user_id: &str,
        body: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, parent_comment_id, user_id, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, post_id, parent_comment_id, user_id, body],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn update_comment(&self, id: &str, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE comments SET body = ?2 WHERE id = ?1",
                rusqlite::params![id, body],
            )?;
            Ok(())
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Comments of a post, oldest first.
    pub fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, post_id))
    }

    /// Number of direct replies. The leaf-first deletion rule hangs off this.
    pub fn count_child_comments(&self, comment_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE parent_comment_id = ?1",
                [comment_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Reactions --

    /// Insert a reaction unless the same (post, user, kind) already exists.
    /// Returns true if inserted, false if it was already there.
    pub fn insert_reaction(
        &self,
        id: &str,
        post_id: &str,
        user_id: &str,
        kind: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM reactions WHERE post_id = ?1 AND user_id = ?2 AND kind = ?3",
                    rusqlite::params![post_id, user_id, kind],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO reactions (id, post_id, user_id, kind) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, post_id, user_id, kind],
            )?;
            Ok(true)
        })
    }

    pub fn get_reaction(&self, id: &str) -> Result<Option<ReactionRow>> {
        self.with_conn(|conn| query_reaction(conn, id))
    }

    pub fn delete_reaction(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM reactions WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

const POST_COLUMNS: &str =
    "p.id, p.user_id, u.username, p.body, p.media_url, p.created_at";

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(3)?,
        media_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    // JOIN users to fetch author_username in a single query
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}
         FROM posts p
         LEFT JOIN users u ON p.user_id = u.id
         WHERE p.id = ?1",
    ))?;

    let row = stmt.query_row([id], map_post).optional()?;
    Ok(row)
}

fn query_posts(conn: &Connection, limit: u32, before: Option<&str>) -> Result<Vec<PostRow>> {
    // Cursor-based pagination — `before` is the created_at of the oldest
    // post from the previous page.
    let sql = match before {
        Some(_) => format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             LEFT JOIN users u ON p.user_id = u.id
             WHERE p.created_at < ?2
             ORDER BY p.created_at DESC
             LIMIT ?1",
        ),
        None => format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             LEFT JOIN users u ON p.user_id = u.id
             ORDER BY p.created_at DESC
             LIMIT ?1",
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = match before {
        Some(cursor) => stmt
            .query_map(rusqlite::params![limit, cursor], map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map(rusqlite::params![limit], map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok(rows)
}

const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.parent_comment_id, c.user_id, u.username, c.body, c.created_at";

fn map_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_comment_id: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_comment(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS}
         FROM comments c
         LEFT JOIN users u ON c.user_id = u.id
         WHERE c.id = ?1",
    ))?;

    let row = stmt.query_row([id], map_comment).optional()?;
    Ok(row)
}

fn query_comments(conn: &Connection, post_id: &str) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS}
         FROM comments c
         LEFT JOIN users u ON c.user_id = u.id
         WHERE c.post_id = ?1
         ORDER BY c.created_at",
    ))?;

    let rows = stmt
        .query_map([post_id], map_comment)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_reaction(conn: &Connection, id: &str) -> Result<Option<ReactionRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, user_id, kind, created_at FROM reactions WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ReactionRow {
                id: row.get(0)?,
                post_id: row.get(1)?,
                user_id: row.get(2)?,
                kind: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, "hash").unwrap();
        id
    }

    fn seed_post(db: &Database, user_id: &str, body: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_post(&id, user_id, body, None).unwrap();
        id
    }

    #[test]
    fn post_roundtrip_with_author() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let post_id = seed_post(&db, &alice, "first post");

        let row = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(row.body, "first post");
        assert_eq!(row.author_username, "alice");
        assert_eq!(row.media_url, None);

        db.update_post(&post_id, "edited", Some("https://cdn/x.png")).unwrap();
        let row = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(row.body, "edited");
        assert_eq!(row.media_url.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn list_posts_newest_first_with_cursor() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let old = seed_post(&db, &alice, "old");
        let new = seed_post(&db, &alice, "new");

        // Force distinct timestamps — datetime('now') has second granularity.
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET created_at = '2024-01-01 00:00:00' WHERE id = ?1",
                [&old],
            )?;
            conn.execute(
                "UPDATE posts SET created_at = '2024-06-01 00:00:00' WHERE id = ?1",
                [&new],
            )?;
            Ok(())
        })
        .unwrap();

        let rows = db.list_posts(10, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, new);
        assert_eq!(rows[1].id, old);

        let older = db.list_posts(10, Some(&rows[0].created_at)).unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, old);
    }

    #[test]
    fn child_comment_count() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let post_id = seed_post(&db, &alice, "post");

        let parent = Uuid::new_v4().to_string();
        db.insert_comment(&parent, &post_id, None, &alice, "parent").unwrap();
        assert_eq!(db.count_child_comments(&parent).unwrap(), 0);

        let child = Uuid::new_v4().to_string();
        db.insert_comment(&child, &post_id, Some(&parent), &alice, "child").unwrap();
        assert_eq!(db.count_child_comments(&parent).unwrap(), 1);

        db.delete_comment(&child).unwrap();
        assert_eq!(db.count_child_comments(&parent).unwrap(), 0);
    }

    #[test]
    fn deleting_post_cascades() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let post_id = seed_post(&db, &alice, "post");

        let comment_id = Uuid::new_v4().to_string();
        db.insert_comment(&comment_id, &post_id, None, &alice, "c").unwrap();
        let reaction_id = Uuid::new_v4().to_string();
        assert!(db.insert_reaction(&reaction_id, &post_id, &alice, "like").unwrap());

        db.delete_post(&post_id).unwrap();
        assert!(db.get_post(&post_id).unwrap().is_none());
        assert!(db.get_comment(&comment_id).unwrap().is_none());
        assert!(db.get_reaction(&reaction_id).unwrap().is_none());
    }

    #[test]
    fn duplicate_reaction_is_rejected() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let post_id = seed_post(&db, &alice, "post");

        let first = Uuid::new_v4().to_string();
        assert!(db.insert_reaction(&first, &post_id, &alice, "like").unwrap());

        let second = Uuid::new_v4().to_string();
        assert!(!db.insert_reaction(&second, &post_id, &alice, "like").unwrap());

        // A different kind from the same user is fine.
        let third = Uuid::new_v4().to_string();
        assert!(db.insert_reaction(&third, &post_id, &alice, "love").unwrap());
    }

    #[test]
    fn comments_listed_oldest_first() {
        let db = db();
        let alice = seed_user(&db, "alice");
        let post_id = seed_post(&db, &alice, "post");

        let a = Uuid::new_v4().to_string();
        let b = Uuid::new_v4().to_string();
        db.insert_comment(&a, &post_id, None, &alice, "a").unwrap();
        db.insert_comment(&b, &post_id, None, &alice, "b").unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE comments SET created_at = '2024-01-01 00:00:00' WHERE id = ?1",
                [&a],
            )?;
            conn.execute(
                "UPDATE comments SET created_at = '2024-06-01 00:00:00' WHERE id = ?1",
                [&b],
            )?;
            Ok(())
        })
        .unwrap();

        let rows = db.list_comments(&post_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, a);
        assert_eq!(rows[1].id, b);
    }
}
