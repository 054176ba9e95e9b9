use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#)
        .expect("youtube pattern compiles")
});

static VIMEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vimeo\.com/(\d+)").expect("vimeo pattern compiles"));

/// A published news item, as shown on public pages and returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub image_url: String,
    pub video_url: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
}

impl Article {
    pub fn video_embed_url(&self) -> Option<String> {
        video_embed_url(&self.video_url)
    }
}

/// The editable fields of an article. Used for both create and edit; an edit
/// overwrites every field, there is no partial patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub author: String,
}

impl ArticleDraft {
    /// Names of required fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("body", &self.body),
            ("author", &self.author),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

impl From<&Article> for ArticleDraft {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            subtitle: article.subtitle.clone(),
            body: article.body.clone(),
            image_url: article.image_url.clone(),
            video_url: article.video_url.clone(),
            author: article.author.clone(),
        }
    }
}

/// Derive an embeddable player URL from a YouTube or Vimeo link.
/// Anything else yields `None`; the link itself is never validated.
pub fn video_embed_url(video_url: &str) -> Option<String> {
    if video_url.is_empty() {
        return None;
    }

    if let Some(id) = YOUTUBE_ID.captures(video_url).and_then(|c| c.get(1)) {
        return Some(format!("https://www.youtube.com/embed/{}", id.as_str()));
    }

    VIMEO_ID
        .captures(video_url)
        .and_then(|c| c.get(1))
        .map(|id| format!("https://player.vimeo.com/video/{}", id.as_str()))
}
