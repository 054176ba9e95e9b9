use axum::{
    Extension,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use gazette_db::ListLimit;
use gazette_types::models::{Article, ArticleDraft};

use crate::error::Error;
use crate::session::SessionUser;
use crate::state::AppState;
use crate::templates;
use crate::uploads::{self, IMAGE_FIELD, PendingImage, UploadError};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Title, body and author are required";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save the article. Please try again.";

/// Transient notices passed back to the list page after a write.
#[derive(Debug, Default, Deserialize)]
pub struct ListNotice {
    pub created: Option<String>,
    pub updated: Option<String>,
    pub deleted: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Notice {
    kind: &'static str,
    message: &'static str,
}

impl ListNotice {
    fn resolve(&self) -> Option<Notice> {
        let error = |message| Some(Notice { kind: "error", message });
        let success = |message| Some(Notice { kind: "success", message });

        match self.error.as_deref() {
            Some("delete") => return error("The article could not be deleted."),
            Some("update") => return error("The article could not be updated."),
            Some("missing") => return error("That article no longer exists."),
            Some(_) => return error("Something went wrong."),
            None => {}
        }

        if self.created.is_some() {
            success("Article published.")
        } else if self.updated.is_some() {
            success("Article updated.")
        } else if self.deleted.is_some() {
            success("Article deleted.")
        } else {
            None
        }
    }
}

/// Which of the two article forms is being shown.
#[derive(Debug, Clone, Copy)]
enum FormMode {
    New,
    Edit(i64),
}

impl FormMode {
    fn heading(self) -> &'static str {
        match self {
            FormMode::New => "New article",
            FormMode::Edit(_) => "Edit article",
        }
    }

    fn action(self) -> String {
        match self {
            FormMode::New => "/admin/articles/new".to_string(),
            FormMode::Edit(id) => format!("/admin/articles/{id}/edit"),
        }
    }
}

/// Everything a submitted article form carried. An upload rejection does not
/// stop the other fields from being read, so the form can be re-rendered
/// with what the user typed.
#[derive(Debug, Default)]
struct Submission {
    draft: ArticleDraft,
    image: Option<PendingImage>,
    upload_error: Option<UploadError>,
}

async fn read_submission(mut multipart: Multipart) -> Submission {
    let mut submission = Submission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                submission.upload_error = Some(e.into());
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            match uploads::accept_image(field).await {
                Ok(image) => submission.image = image,
                Err(e) => submission.upload_error = Some(e),
            }
            continue;
        }

        let slot = match name.as_str() {
            "title" => &mut submission.draft.title,
            "subtitle" => &mut submission.draft.subtitle,
            "body" => &mut submission.draft.body,
            "image_url" => &mut submission.draft.image_url,
            "video_url" => &mut submission.draft.video_url,
            "author" => &mut submission.draft.author,
            _ => continue,
        };
        match field.text().await {
            Ok(text) => *slot = text,
            Err(e) => {
                submission.upload_error = Some(e.into());
                break;
            }
        }
    }

    submission
}

fn render_form(
    state: &AppState,
    user: &SessionUser,
    mode: FormMode,
    status: StatusCode,
    draft: &ArticleDraft,
    error: Option<&str>,
) -> Result<Response, Error> {
    let mut context = templates::context(Some(user));
    context.insert("heading", mode.heading());
    context.insert("action", &mode.action());
    context.insert("article", draft);
    context.insert("error", &error);
    templates::render_with_status(&state.templates, status, "admin_form.html", &context)
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(notice): Query<ListNotice>,
) -> Result<Html<String>, Error> {
    let rows = state.run_db(|db| db.list_articles(ListLimit::All)).await?;
    let articles: Vec<Article> = rows.into_iter().map(Article::from).collect();

    let mut context = templates::context(Some(&user));
    context.insert("articles", &articles);
    context.insert("notice", &notice.resolve());
    templates::render(&state.templates, "admin_list.html", &context)
}

pub async fn new_form(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, Error> {
    render_form(&state, &user, FormMode::New, StatusCode::OK, &ArticleDraft::default(), None)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<Response, Error> {
    let Submission {
        mut draft,
        image,
        upload_error,
    } = read_submission(multipart).await;
    let mode = FormMode::New;

    if let Some(e) = upload_error {
        warn!(user_id = user.id, "Article image rejected: {}", e);
        return render_form(&state, &user, mode, e.status_code(), &draft, Some(e.user_message().as_str()));
    }

    if !draft.is_complete() {
        return render_form(&state, &user, mode, StatusCode::OK, &draft, Some(REQUIRED_FIELDS_MESSAGE));
    }

    let mut uploaded = None;
    if let Some(image) = image {
        match state.uploads.save(&image).await {
            Ok(url) => {
                draft.image_url = url.clone();
                uploaded = Some(url);
            }
            Err(e) => {
                return render_form(&state, &user, mode, e.status_code(), &draft, Some(e.user_message().as_str()));
            }
        }
    }

    let insert = draft.clone();
    match state.run_db(move |db| db.create_article(&insert)).await {
        Ok(id) => {
            info!(article_id = id, user_id = user.id, title = %draft.title, "Article created");
            Ok(Redirect::to("/admin/articles?created=true").into_response())
        }
        Err(e) => {
            error!("Failed to create article: {}", e);
            if let Some(url) = uploaded {
                state.uploads.remove(&url).await;
            }
            render_form(&state, &user, mode, StatusCode::INTERNAL_SERVER_ERROR, &draft, Some(SAVE_FAILED_MESSAGE))
        }
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> Result<Response, Error> {
    let Some(row) = state.run_db(move |db| db.get_article(id)).await? else {
        return templates::not_found(&state.templates, Some(&user), "Article");
    };
    let draft = ArticleDraft::from(&Article::from(row));
    render_form(&state, &user, FormMode::Edit(id), StatusCode::OK, &draft, None)
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, Error> {
    let Submission {
        mut draft,
        image,
        upload_error,
    } = read_submission(multipart).await;
    let mode = FormMode::Edit(id);

    let Some(existing) = state.run_db(move |db| db.get_article(id)).await? else {
        return templates::not_found(&state.templates, Some(&user), "Article");
    };

    if let Some(e) = upload_error {
        warn!(article_id = id, user_id = user.id, "Article image rejected: {}", e);
        return render_form(&state, &user, mode, e.status_code(), &draft, Some(e.user_message().as_str()));
    }

    if !draft.is_complete() {
        return render_form(&state, &user, mode, StatusCode::OK, &draft, Some(REQUIRED_FIELDS_MESSAGE));
    }

    // new file, then a typed URL, then whatever the article already had
    let mut uploaded = None;
    if let Some(image) = image {
        match state.uploads.save(&image).await {
            Ok(url) => {
                draft.image_url = url.clone();
                uploaded = Some(url);
            }
            Err(e) => {
                return render_form(&state, &user, mode, e.status_code(), &draft, Some(e.user_message().as_str()));
            }
        }
    } else if draft.image_url.trim().is_empty() {
        draft.image_url = existing.image_url;
    }

    let changes = draft.clone();
    match state.run_db(move |db| db.update_article(id, &changes)).await {
        Ok(0) => {
            warn!(article_id = id, "Article vanished before update");
            if let Some(url) = uploaded {
                state.uploads.remove(&url).await;
            }
            templates::not_found(&state.templates, Some(&user), "Article")
        }
        Ok(_) => {
            info!(article_id = id, user_id = user.id, "Article updated");
            Ok(Redirect::to("/admin/articles?updated=true").into_response())
        }
        Err(e) => {
            error!(article_id = id, "Failed to update article: {}", e);
            if let Some(url) = uploaded {
                state.uploads.remove(&url).await;
            }
            render_form(&state, &user, mode, StatusCode::INTERNAL_SERVER_ERROR, &draft, Some(SAVE_FAILED_MESSAGE))
        }
    }
}

/// Serves both `/delete` and its `/exclude` alias. Deleting an id that is
/// already gone redirects exactly like a successful delete.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> Redirect {
    match state.run_db(move |db| db.delete_article(id)).await {
        Ok(removed) => {
            info!(article_id = id, user_id = user.id, removed, "Article deleted");
            Redirect::to("/admin/articles?deleted=true")
        }
        Err(e) => {
            error!(article_id = id, "Failed to delete article: {}", e);
            Redirect::to("/admin/articles?error=delete")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_notice_wins_over_success() {
        let notice = ListNotice {
            deleted: Some("true".into()),
            error: Some("delete".into()),
            ..Default::default()
        };
        let resolved = notice.resolve().unwrap();
        assert_eq!(resolved.kind, "error");
    }

    #[test]
    fn no_flags_means_no_notice() {
        assert!(ListNotice::default().resolve().is_none());
    }

    #[test]
    fn form_actions() {
        assert_eq!(FormMode::New.action(), "/admin/articles/new");
        assert_eq!(FormMode::Edit(4).action(), "/admin/articles/4/edit");
    }
}
