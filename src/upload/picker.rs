// Image acquisition
// The device picker is an external capability; the pipeline only sees this trait.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Result, WardrobeError};
use crate::storage::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    File(PathBuf),
    /// Already base64-encoded payload (camera capture, clipboard)
    Base64(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickedImage {
    pub source: ImageSource,
    pub media_kind: MediaKind,
}

impl PickedImage {
    /// Media kind guessed from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let media_kind = path
            .extension()
            .and_then(|e| e.to_str())
            .map(MediaKind::from_extension)
            .unwrap_or(MediaKind::Image);
        Self {
            source: ImageSource::File(path),
            media_kind,
        }
    }

    /// Raw bytes of the picked media.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            ImageSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                WardrobeError::Encoding(format!("Cannot read {}: {}", path.display(), e))
            }),
            ImageSource::Base64(encoded) => STANDARD
                .decode(encoded.trim())
                .map_err(|e| WardrobeError::Encoding(format!("Invalid base64 image: {}", e))),
        }
    }
}

#[async_trait]
pub trait ImagePicker: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// None when the user cancels.
    async fn pick(&self) -> Result<Option<PickedImage>>;
}

/// Picks a fixed path (CLI). No path means the user cancelled.
pub struct FilePicker {
    path: Option<PathBuf>,
}

impl FilePicker {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ImagePicker for FilePicker {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn pick(&self) -> Result<Option<PickedImage>> {
        Ok(self.path.clone().map(PickedImage::from_path))
    }
}
