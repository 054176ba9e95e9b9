use crate::Database;
use crate::models::{ArticleRow, ListLimit, UserRow};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use gazette_types::models::ArticleDraft;
use rusqlite::Connection;

const ARTICLE_COLUMNS: &str =
    "id, title, subtitle, body, image_url, video_url, published_at, author";

impl Database {
    // -- Articles --

    /// Insert a new article stamped with the current time. Returns its id.
    pub fn create_article(&self, draft: &ArticleDraft) -> Result<i64> {
        let published_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO articles (title, subtitle, body, image_url, video_url, author, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    draft.title,
                    draft.subtitle,
                    draft.body,
                    draft.image_url,
                    draft.video_url,
                    draft.author,
                    published_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_articles(&self, limit: ListLimit) -> Result<Vec<ArticleRow>> {
        self.with_conn(|conn| query_articles(conn, limit))
    }

    pub fn get_article(&self, id: i64) -> Result<Option<ArticleRow>> {
        self.with_conn(|conn| query_article_by_id(conn, id))
    }

    /// Overwrite every mutable field. Returns the number of rows changed;
    /// zero means no article has this id.
    pub fn update_article(&self, id: i64, draft: &ArticleDraft) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE articles
                 SET title = ?1, subtitle = ?2, body = ?3, image_url = ?4, video_url = ?5, author = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    draft.title,
                    draft.subtitle,
                    draft.body,
                    draft.image_url,
                    draft.video_url,
                    draft.author,
                    id,
                ],
            )?;
            Ok(changed)
        })
    }

    /// Hard delete. Returns the number of rows removed.
    pub fn delete_article(&self, id: i64) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM articles WHERE id = ?1", [id])?))
    }

    pub fn count_articles(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?)
        })
    }

    // -- Users --

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
    }

    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Create the bootstrap account, but only while the table is empty.
    /// Returns `None` if any account already exists.
    pub fn create_first_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password_hash)
                 SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM users)",
                (username, password_hash),
            )?;
            Ok((inserted == 1).then(|| conn.last_insert_rowid()))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }
}

fn map_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        body: row.get(3)?,
        image_url: row.get(4)?,
        video_url: row.get(5)?,
        published_at: row.get(6)?,
        author: row.get(7)?,
    })
}

fn query_articles(conn: &Connection, limit: ListLimit) -> Result<Vec<ArticleRow>> {
    // SQLite treats a negative LIMIT as "no limit"
    let limit: i64 = match limit {
        ListLimit::Latest(n) => i64::from(n),
        ListLimit::All => -1,
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles
         ORDER BY julianday(published_at) DESC, id DESC
         LIMIT ?1"
    ))?;

    let rows = stmt
        .query_map([limit], map_article)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_article_by_id(conn: &Connection, id: i64) -> Result<Option<ArticleRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"))?;
    stmt.query_row([id], map_article).optional()
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT id, username, password_hash, created_at FROM users WHERE username = ?1")?;

    stmt.query_row([username], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get(3)?,
        })
    })
    .optional()
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
