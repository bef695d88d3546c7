//! Product image uploads stored on local disk.
//!
//! Files are identified by their leading bytes, not by the client's content
//! type or extension, and stored under a random UUID name. The storefront
//! serves the same directory under `/uploads`.

use std::path::PathBuf;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Multipart field name that carries images.
pub const IMAGES_FIELD: &str = "images";

/// Most images accepted in one request.
pub const MAX_FILES: usize = 8;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no images were uploaded")]
    NoFiles,

    #[error("at most {max} images can be uploaded at once")]
    TooManyFiles { max: usize },

    #[error("each image must be at most {limit} bytes")]
    TooLarge { limit: usize },

    #[error("{filename} is not a JPEG, PNG, WebP or GIF image")]
    UnsupportedType { filename: String },

    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoFiles | Self::TooManyFiles { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Identify an image from its magic bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

/// A received file that passed validation but isn't written yet.
#[derive(Debug)]
struct PendingImage {
    kind: ImageKind,
    bytes: Vec<u8>,
}

/// Local-disk image storage.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl ImageStore {
    #[must_use]
    pub const fn new(dir: PathBuf, public_base_url: String, max_bytes: usize) -> Self {
        Self {
            dir,
            public_base_url,
            max_bytes,
        }
    }

    /// Largest request body the upload route should accept.
    #[must_use]
    pub const fn request_limit(&self) -> usize {
        // Headroom for multipart boundaries and headers
        self.max_bytes
            .saturating_mul(MAX_FILES)
            .saturating_add(64 * 1024)
    }

    /// Read every `images` field, validate all of them, then write them.
    ///
    /// Nothing is written if any file is rejected, and files already written
    /// are removed if a later write fails. Other fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns an `UploadError` for the first rejected file, or if writing
    /// fails.
    pub async fn save_multipart(&self, mut multipart: Multipart) -> Result<Vec<String>, UploadError> {
        let mut pending = Vec::new();

        while let Some(mut field) = multipart.next_field().await? {
            if field.name() != Some(IMAGES_FIELD) {
                continue;
            }
            if pending.len() == MAX_FILES {
                return Err(UploadError::TooManyFiles { max: MAX_FILES });
            }

            let filename = field.file_name().unwrap_or("upload").to_owned();
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await? {
                if bytes.len() + chunk.len() > self.max_bytes {
                    return Err(UploadError::TooLarge {
                        limit: self.max_bytes,
                    });
                }
                bytes.extend_from_slice(&chunk);
            }

            let kind =
                ImageKind::sniff(&bytes).ok_or(UploadError::UnsupportedType { filename })?;
            pending.push(PendingImage { kind, bytes });
        }

        if pending.is_empty() {
            return Err(UploadError::NoFiles);
        }

        let urls = self.write_all(&pending).await?;
        tracing::info!(count = urls.len(), "Images uploaded");
        Ok(urls)
    }

    /// Write every image, removing the ones already written if one fails.
    async fn write_all(&self, images: &[PendingImage]) -> Result<Vec<String>, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut names = Vec::with_capacity(images.len());
        for image in images {
            match self.write(image).await {
                Ok(name) => names.push(name),
                Err(err) => {
                    self.discard(&names).await;
                    return Err(err.into());
                }
            }
        }

        Ok(names
            .iter()
            .map(|name| format!("{}/{name}", self.public_base_url))
            .collect())
    }

    async fn write(&self, image: &PendingImage) -> std::io::Result<String> {
        let name = format!("{}.{}", Uuid::new_v4(), image.kind.extension());
        tokio::fs::write(self.dir.join(&name), &image.bytes).await?;
        Ok(name)
    }

    async fn discard(&self, names: &[String]) {
        for name in names {
            if let Err(err) = tokio::fs::remove_file(self.dir.join(name)).await {
                tracing::warn!(error = %err, file = %name, "Failed to remove partial upload");
            }
        }
    }
}
