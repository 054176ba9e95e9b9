use std::sync::Arc;

use anyhow::bail;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use tera::Tera;
use tracing::error;

use gazette_db::Database;

use crate::error::Error;
use crate::session::SessionStore;
use crate::templates;
use crate::uploads::UploadStore;

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// First-run and cookie settings handed down from the server config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub setup_username: String,
    /// Generated and shown once when unset.
    pub setup_password: Option<String>,
    pub cookie_secure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            setup_username: "admin".to_string(),
            setup_password: None,
            cookie_secure: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub uploads: Arc<UploadStore>,
    pub sessions: SessionStore,
    pub templates: Arc<Tera>,
    pub settings: Arc<Settings>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        db: Database,
        uploads: UploadStore,
        session_secret: &str,
        settings: Settings,
    ) -> anyhow::Result<Self> {
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("session secret must be at least {MIN_SECRET_LEN} bytes");
        }

        Ok(Self {
            db: Arc::new(db),
            uploads: Arc::new(uploads),
            sessions: SessionStore::default(),
            templates: Arc::new(templates::load()?),
            settings: Arc::new(settings),
            cookie_key: Key::derive_from(session_secret.as_bytes()),
        })
    }

    /// Run blocking SQLite work off the async runtime.
    pub async fn run_db<F, T>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                Error::Internal {
                    operation: "run database task".to_string(),
                }
            })?
            .map_err(Error::Database)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
