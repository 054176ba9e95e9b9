use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use rand::Rng;
use thiserror::Error as ThisError;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

/// 5 MiB limit for article images
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field that carries the image file.
pub const IMAGE_FIELD: &str = "image";

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(ThisError, Debug)]
pub enum UploadError {
    #[error("unsupported media type {content_type:?}")]
    UnsupportedMediaType { content_type: String },

    #[error("image larger than 5 MiB")]
    PayloadTooLarge,

    #[error("malformed multipart body: {0}")]
    Malformed(String),

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Malformed(_) => StatusCode::BAD_REQUEST,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            UploadError::UnsupportedMediaType { .. } => "Only image files are allowed.".to_string(),
            UploadError::PayloadTooLarge => "The image must be 5 MB or smaller.".to_string(),
            UploadError::Malformed(_) => "The form could not be read. Please try again.".to_string(),
            UploadError::Io(_) => "The image could not be saved. Please try again.".to_string(),
        }
    }
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::PayloadTooLarge
        } else {
            UploadError::Malformed(e.body_text())
        }
    }
}

/// An accepted image that has not been written to disk yet.
#[derive(Debug)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read the image field of a multipart form.
///
/// Returns `Ok(None)` when the browser submitted the field without choosing a
/// file. The content type is checked before any bytes are read, and the size
/// limit is enforced chunk by chunk so an oversized file is never buffered whole.
pub async fn accept_image(mut field: Field<'_>) -> Result<Option<PendingImage>, UploadError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    if file_name.is_empty() {
        return Ok(None);
    }

    let content_type = field.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("image/") {
        return Err(UploadError::UnsupportedMediaType { content_type });
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::PayloadTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(PendingImage {
        file_name,
        content_type,
        bytes,
    }))
}

/// Manages the public image directory.
///
/// Each image is stored as a flat file named `{millis}-{random}-{original}`
/// and served back under [`PUBLIC_PREFIX`].
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the image under a fresh unique name and return its public URL.
    pub async fn save(&self, image: &PendingImage) -> Result<String, UploadError> {
        let stored_name = unique_name(&image.file_name);
        let path = self.dir.join(&stored_name);

        let file = fs::File::create(&path).await.map_err(|e| {
            error!("Failed to create upload {}: {}", path.display(), e);
            e
        })?;
        write_or_discard(file, &path, &image.bytes).await?;

        info!(
            file = %stored_name,
            content_type = %image.content_type,
            size = image.bytes.len(),
            "Image uploaded"
        );
        Ok(format!("{PUBLIC_PREFIX}/{stored_name}"))
    }

    /// Best-effort removal of an image written by [`UploadStore::save`]. URLs
    /// outside the upload directory are ignored.
    pub async fn remove(&self, url: &str) {
        let Some(name) = url.strip_prefix(PUBLIC_PREFIX).and_then(|rest| rest.strip_prefix('/')) else {
            return;
        };
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return;
        }

        match fs::remove_file(self.dir.join(name)).await {
            Ok(()) => info!("Removed orphaned upload {}", name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {}: {}", name, e),
        }
    }
}

/// Write `bytes` to a freshly created file. On failure the partial file is
/// deleted before the error is returned.
async fn write_or_discard(mut file: fs::File, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        error!("Failed to write upload {}: {}", path.display(), e);
        drop(file);
        if let Err(rm) = fs::remove_file(path).await {
            warn!("Failed to discard partial upload {}: {}", path.display(), rm);
        }
        return Err(e);
    }
    Ok(())
}

fn unique_name(original: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{millis}-{suffix}-{}", sanitize_file_name(original))
}

/// Keep only the final path component and a conservative character set.
fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
