//! Row types as stored in SQLite, and their conversion to view models.
//! Distinct from gazette-types models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, Utc};
use gazette_types::models::Article;
use tracing::warn;

pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub image_url: String,
    pub video_url: String,
    pub published_at: String,
    pub author: String,
}

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// How many articles a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLimit {
    Latest(u32),
    All,
}

impl ListLimit {
    /// Size of the public front-page feed.
    pub const FEED: u32 = 6;
}

impl Default for ListLimit {
    fn default() -> Self {
        ListLimit::Latest(Self::FEED)
    }
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        let published_at = parse_timestamp(&row.published_at).unwrap_or_else(|| {
            warn!("Corrupt published_at '{}' on article {}", row.published_at, row.id);
            DateTime::default()
        });

        Article {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            body: row.body,
            image_url: row.image_url,
            video_url: row.video_url,
            author: row.author,
            published_at,
        }
    }
}

/// Accepts RFC 3339 as written by this crate, and SQLite's
/// `datetime('now')` form ("YYYY-MM-DD HH:MM:SS", implicitly UTC).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_forms() {
        let rfc = parse_timestamp("2025-11-27T10:30:00.250Z").unwrap();
        assert_eq!(rfc.timestamp_millis() % 1000, 250);

        let sqlite = parse_timestamp("2025-11-27 10:30:00").unwrap();
        assert_eq!(sqlite.to_rfc3339(), "2025-11-27T10:30:00+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }
}
