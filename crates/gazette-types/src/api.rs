use serde::{Deserialize, Serialize};

use crate::models::ArticleDraft;

// -- Articles --

/// Body of `POST /api/articles`. Optional fields may be omitted or `null`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub author: Option<String>,
}

impl CreateArticleRequest {
    pub fn into_draft(self) -> ArticleDraft {
        ArticleDraft {
            title: self.title.unwrap_or_default(),
            subtitle: self.subtitle.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            video_url: self.video_url.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateArticleResponse {
    pub id: i64,
    pub message: String,
    pub title: String,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_absent_fields_become_empty() {
        let req: CreateArticleRequest =
            serde_json::from_str(r#"{"title": "A", "body": "B", "author": "C", "subtitle": null}"#).unwrap();
        let draft = req.into_draft();
        assert!(draft.is_complete());
        assert_eq!(draft.subtitle, "");
        assert_eq!(draft.image_url, "");
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let req: CreateArticleRequest = serde_json::from_str(r#"{"title": "A"}"#).unwrap();
        assert_eq!(req.into_draft().missing_fields(), vec!["body", "author"]);
    }
}
