use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

use gazette_api::Settings;
use gazette_api::state::MIN_SECRET_LEN;

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "replace-with-at-least-32-random-bytes",
];

#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub session_secret: String,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("GAZETTE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("GAZETTE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("GAZETTE_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;

        let db_path = var("GAZETTE_DB_PATH").unwrap_or_else(|| "gazette.db".into()).into();
        let upload_dir = var("GAZETTE_UPLOAD_DIR")
            .unwrap_or_else(|| "public/uploads".into())
            .into();

        let session_secret = var("GAZETTE_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("GAZETTE_SESSION_SECRET is unset or still a placeholder; set it in your .env file");
        }
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("GAZETTE_SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes");
        }

        let cookie_secure = match var("GAZETTE_COOKIE_SECURE").as_deref() {
            None | Some("") => false,
            Some(v) => v
                .parse::<bool>()
                .context("GAZETTE_COOKIE_SECURE must be true or false")?,
        };

        let settings = Settings {
            setup_username: var("GAZETTE_SETUP_USERNAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| Settings::default().setup_username),
            setup_password: var("GAZETTE_SETUP_PASSWORD").filter(|v| !v.is_empty()),
            cookie_secure,
        };

        Ok(Self {
            addr,
            db_path,
            upload_dir,
            session_secret,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("GAZETTE_SESSION_SECRET", SECRET)]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("gazette.db"));
        assert_eq!(config.upload_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.settings.setup_username, "admin");
        assert!(config.settings.setup_password.is_none());
        assert!(!config.settings.cookie_secure);
    }

    #[test]
    fn secret_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("GAZETTE_SESSION_SECRET", "dev-secret-change-me")]).is_err());
        assert!(load(&[("GAZETTE_SESSION_SECRET", "short")]).is_err());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("GAZETTE_SESSION_SECRET", SECRET),
            ("GAZETTE_PORT", "8080"),
            ("GAZETTE_SETUP_PASSWORD", "hunter22"),
            ("GAZETTE_COOKIE_SECURE", "true"),
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.settings.setup_password.as_deref(), Some("hunter22"));
        assert!(config.settings.cookie_secure);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(load(&[("GAZETTE_SESSION_SECRET", SECRET), ("GAZETTE_PORT", "http")]).is_err());
    }
}
