use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;
use tracing::debug;

use crate::session::{SESSION_COOKIE, SessionUser};
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";

/// Resolve the session cookie to a live session, if any.
pub fn current_user(state: &AppState, jar: &SignedCookieJar) -> Option<SessionUser> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value()))
}

/// Gate for admin routes: without a live session the browser is sent to the
/// login page; with one, the [`SessionUser`] is put in request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match current_user(&state, &jar) {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            debug!(path = %req.uri().path(), "No session, redirecting to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
