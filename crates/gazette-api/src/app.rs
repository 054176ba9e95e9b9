use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::middleware::require_session;
use crate::state::AppState;
use crate::uploads::{MAX_IMAGE_BYTES, PUBLIC_PREFIX};
use crate::{admin, articles, auth};

/// Room for the text fields and multipart framing on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the full application router. Tracing and other transport layers are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(articles::home))
        .route("/article", get(articles::article_page))
        .route("/api/articles", get(articles::list_articles).post(articles::create_article))
        .route("/api/articles/{id}", get(articles::get_article))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/admin/setup-user", get(auth::setup_user))
        .route("/health", get(health));

    let admin_routes = Router::new()
        .route("/admin", get(|| async { Redirect::to(auth::ADMIN_HOME) }))
        .route("/admin/articles", get(admin::list))
        .route("/admin/articles/new", get(admin::new_form).post(admin::create))
        .route("/admin/articles/{id}/edit", get(admin::edit_form).post(admin::update))
        .route("/admin/articles/{id}/delete", post(admin::delete))
        .route("/admin/articles/{id}/exclude", post(admin::delete))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let uploads = ServeDir::new(state.uploads.dir());

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .nest_service(PUBLIC_PREFIX, uploads)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
