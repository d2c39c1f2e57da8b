// Object storage
// Blob store contract and the path/content-type rules for uploaded media.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    IMAGE_CONTENT_TYPE, IMAGE_EXTENSION, VIDEO_CONTENT_TYPE, VIDEO_EXTENSION, VIDEO_EXTENSIONS,
};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => IMAGE_EXTENSION,
            MediaKind::Video => VIDEO_EXTENSION,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => IMAGE_CONTENT_TYPE,
            MediaKind::Video => VIDEO_CONTENT_TYPE,
        }
    }

    /// Guess from a file extension; anything not a known video is an image.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// Descriptor returned by a successful blob write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub path: String,
    pub size_bytes: u64,
    pub content_type: String,
}

/// Blob path namespaced by owner with a timestamp-derived suffix.
/// Format: "<owner>/<unix_millis>.<ext>"
pub fn object_path(owner_id: &str, kind: MediaKind, now: DateTime<Utc>) -> String {
    format!("{}/{}.{}", owner_id, now.timestamp_millis(), kind.extension())
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject>;

    /// Publicly resolvable URL for a stored path. Never fails.
    fn public_url(&self, path: &str) -> String;

    async fn exists(&self, path: &str) -> Result<bool>;
}
