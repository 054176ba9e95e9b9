use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    SignedCookieJar,
    cookie::{Cookie, SameSite},
};
use rand::{Rng, distr::Alphanumeric};
use tracing::{error, info, warn};

use gazette_db::UserRow;
use gazette_types::api::LoginForm;

use crate::error::Error;
use crate::middleware::{LOGIN_PATH, current_user};
use crate::session::{SESSION_COOKIE, SessionUser};
use crate::state::AppState;
use crate::templates;

pub const ADMIN_HOME: &str = "/admin/articles";

pub const MISSING_CREDENTIALS: &str = "Please enter username and password";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

const GENERATED_PASSWORD_LEN: usize = 16;

/// Verified against when the username is unknown, so both failure paths cost
/// one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("gazette-dummy").ok());

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

fn password_matches(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Check a login attempt. Returns the session identity on success.
fn verify_login(user: Option<UserRow>, password: &str) -> Option<SessionUser> {
    match user {
        Some(user) if password_matches(password, &user.password_hash) => Some(SessionUser {
            id: user.id,
            username: user.username,
        }),
        Some(_) => None,
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = password_matches(password, dummy);
            }
            None
        }
    }
}

fn login_page_with(
    state: &AppState,
    status: StatusCode,
    username: &str,
    error: Option<&str>,
) -> Result<Response, Error> {
    let mut context = templates::context(None);
    context.insert("username", username);
    context.insert("error", &error);
    templates::render_with_status(&state.templates, status, "login.html", &context)
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, Error> {
    if current_user(&state, &jar).is_some() {
        return Ok(Redirect::to(ADMIN_HOME).into_response());
    }
    login_page_with(&state, StatusCode::OK, "", None)
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, Error> {
    if form.username.trim().is_empty() || form.password.is_empty() {
        return login_page_with(&state, StatusCode::BAD_REQUEST, &form.username, Some(MISSING_CREDENTIALS));
    }

    let username = form.username.clone();
    let password = form.password;
    let verified = state
        .run_db(move |db| {
            let user = db.get_user_by_username(&username)?;
            Ok(verify_login(user, &password))
        })
        .await?;

    let Some(user) = verified else {
        warn!(username = %form.username, "Rejected login");
        return login_page_with(&state, StatusCode::UNAUTHORIZED, &form.username, Some(INVALID_CREDENTIALS));
    };

    info!(user_id = user.id, username = %user.username, "Login succeeded");
    let token = state.sessions.create(user);
    let max_age = cookie::time::Duration::seconds(state.sessions.ttl().as_secs() as i64);
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.settings.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    Ok((jar.add(cookie), Redirect::to(ADMIN_HOME)).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && state.sessions.destroy(cookie.value())
    {
        info!("Logged out");
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/").build()),
        Redirect::to(LOGIN_PATH),
    )
}

/// One-time bootstrap of the first admin account.
pub async fn setup_user(State(state): State<AppState>) -> Result<Response, Error> {
    let existing = state.run_db(|db| db.count_users()).await?;
    if existing > 0 {
        return setup_done(&state);
    }

    let username = state.settings.setup_username.clone();
    let (password, generated) = match &state.settings.setup_password {
        Some(password) => (password.clone(), false),
        None => (generate_password(), true),
    };

    let hash_input = password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&hash_input))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            Error::Internal {
                operation: "hash setup password".to_string(),
            }
        })??;

    let name = username.clone();
    let created = state
        .run_db(move |db| db.create_first_user(&name, &password_hash))
        .await?;

    let Some(user_id) = created else {
        return setup_done(&state);
    };

    info!(user_id, username = %username, "Admin account created by setup");

    let mut context = templates::context(None);
    context.insert("created", &true);
    context.insert("username", &username);
    context.insert("generated_password", &generated.then_some(password));
    templates::render_with_status(&state.templates, StatusCode::CREATED, "setup.html", &context)
}

fn setup_done(state: &AppState) -> Result<Response, Error> {
    warn!("Setup requested but an account already exists");
    let mut context = templates::context(None);
    context.insert("created", &false);
    context.insert("username", "");
    context.insert("generated_password", &Option::<String>::None);
    templates::render_with_status(&state.templates, StatusCode::CONFLICT, "setup.html", &context)
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
