use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use gazette_types::api::ErrorResponse;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// No row with the requested id
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Storage failure, with full context chain
    #[error(transparent)]
    Database(#[from] anyhow::Error),

    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Database(_) | Error::Template(_) | Error::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a user-safe message, without internal details.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::BadRequest { message } => message.clone(),
            Error::Database(_) | Error::Template(_) | Error::Internal { .. } => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    fn log(&self) {
        match self {
            Error::Database(_) | Error::Template(_) | Error::Internal { .. } => {
                tracing::error!("Internal error: {:#}", self);
            }
            Error::NotFound { .. } | Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

/// HTML pages get a bare error document; rendering it through the template
/// engine could fail for the same reason the request did.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.log();
        let message = tera::escape_html(&self.user_message());
        let body = format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"><title>{message}</title></head>\
             <body><h1>{message}</h1><p><a href=\"/\">Back to the front page</a></p></body></html>"
        );
        (self.status_code(), Html(body)).into_response()
    }
}

/// JSON flavour of [`Error`] for the `/api` routes.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError(Error::Database(e))
    }
}

/// Malformed or mistyped JSON bodies answer with the same `{"error": …}`
/// shape as every other API failure. The extractor's own text stays in the log.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        ApiError(Error::BadRequest {
            message: "Request body must be a JSON object".to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();
        let body = ErrorResponse {
            error: self.0.user_message(),
        };
        (self.0.status_code(), Json(body)).into_response()
    }
}
