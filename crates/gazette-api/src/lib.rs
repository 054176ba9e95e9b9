pub mod admin;
pub mod app;
pub mod articles;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod session;
pub mod state;
pub mod templates;
pub mod uploads;

pub use app::router;
pub use state::{AppState, Settings};
