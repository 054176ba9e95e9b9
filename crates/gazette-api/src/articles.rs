use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::{SignedCookieJar, WithRejection};
use serde::Deserialize;
use tracing::info;

use gazette_db::ListLimit;
use gazette_types::api::{CreateArticleRequest, CreateArticleResponse};
use gazette_types::models::Article;

use crate::error::{ApiError, Error};
use crate::middleware::current_user;
use crate::state::AppState;
use crate::templates;

/// Articles on the front page.
pub const HOME_LIMIT: u32 = 20;

const API_MAX_LIMIT: u32 = 200;

const API_DEFAULT_LIMIT: u32 = 5;

/// `limit` is read leniently: anything that is not a positive number falls
/// back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
}

impl ListQuery {
    fn limit(&self) -> u32 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(API_DEFAULT_LIMIT)
            .min(API_MAX_LIMIT)
    }
}

/// `id` stays a string so a malformed value renders the not-found page
/// rather than a query rejection.
#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub id: Option<String>,
}

pub async fn home(State(state): State<AppState>, jar: SignedCookieJar) -> Result<Html<String>, Error> {
    let rows = state
        .run_db(|db| db.list_articles(ListLimit::Latest(HOME_LIMIT)))
        .await?;
    let articles: Vec<Article> = rows.into_iter().map(Article::from).collect();

    let user = current_user(&state, &jar);
    let mut context = templates::context(user.as_ref());
    context.insert("articles", &articles);
    templates::render(&state.templates, "home.html", &context)
}

pub async fn article_page(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
    jar: SignedCookieJar,
) -> Result<Response, Error> {
    let user = current_user(&state, &jar);

    let Some(id) = query.id.as_deref().and_then(|raw| raw.trim().parse::<i64>().ok()) else {
        return templates::not_found(&state.templates, user.as_ref(), "Article");
    };

    let Some(row) = state.run_db(move |db| db.get_article(id)).await? else {
        return templates::not_found(&state.templates, user.as_ref(), "Article");
    };
    let article = Article::from(row);

    let mut context = templates::context(user.as_ref());
    context.insert("video_embed_url", &article.video_embed_url());
    context.insert("article", &article);
    Ok(templates::render(&state.templates, "article.html", &context)?.into_response())
}

// -- JSON API --

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let limit = query.limit();
    let rows = state
        .run_db(move |db| db.list_articles(ListLimit::Latest(limit)))
        .await?;
    Ok(Json(rows.into_iter().map(Article::from).collect()))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    state
        .run_db(move |db| db.get_article(id))
        .await?
        .map(|row| Json(Article::from(row)))
        .ok_or(ApiError(Error::NotFound { resource: "Article" }))
}

pub async fn create_article(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateArticleRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = req.into_draft();
    if !draft.is_complete() {
        return Err(Error::BadRequest {
            message: "Missing required fields: title, body and author are required".to_string(),
        }
        .into());
    }

    let title = draft.title.clone();
    let id = state.run_db(move |db| db.create_article(&draft)).await?;
    info!(article_id = id, "Article created via API");

    Ok((
        StatusCode::CREATED,
        Json(CreateArticleResponse {
            id,
            message: "Article created".to_string(),
            title,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(raw: Option<&str>) -> ListQuery {
        ListQuery {
            limit: raw.map(str::to_string),
        }
    }

    #[test]
    fn limit_falls_back_to_default() {
        assert_eq!(query(None).limit(), 5);
        assert_eq!(query(Some("abc")).limit(), 5);
        assert_eq!(query(Some("-1")).limit(), 5);
        assert_eq!(query(Some("0")).limit(), 5);
        assert_eq!(query(Some(" 3 ")).limit(), 3);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(query(Some("500")).limit(), API_MAX_LIMIT);
    }
}
