// Wardrobe - Upload Module
// Turns a picked image into a stored blob plus an item record.

pub mod picker;
pub mod pipeline;

use serde::Serialize;

use crate::items::Item;

pub use picker::{FilePicker, ImagePicker, ImageSource, PermissionStatus, PickedImage};
pub use pipeline::UploadPipeline;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadStage {
    Permission,
    Pick,
    Encode,
    Store,
    ResolveUrl,
    Insert,
    Refresh,
    Done,
}

impl UploadStage {
    pub const COUNT: u64 = 7;

    /// 1-based step number; Done reports as complete.
    pub fn step(&self) -> u64 {
        match self {
            UploadStage::Permission => 1,
            UploadStage::Pick => 2,
            UploadStage::Encode => 3,
            UploadStage::Store => 4,
            UploadStage::ResolveUrl => 5,
            UploadStage::Insert => 6,
            UploadStage::Refresh => 7,
            UploadStage::Done => Self::COUNT,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadStage::Permission => "Checking photo library access",
            UploadStage::Pick => "Choosing image",
            UploadStage::Encode => "Reading image",
            UploadStage::Store => "Uploading image",
            UploadStage::ResolveUrl => "Resolving image URL",
            UploadStage::Insert => "Saving item",
            UploadStage::Refresh => "Refreshing wardrobe",
            UploadStage::Done => "Done",
        }
    }
}

/// Progress payload for one upload run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub upload_id: String,
    pub stage: UploadStage,
    pub current: u64,
    pub total: u64,
    pub percent: f64,
    pub message: String,
    pub is_cancelled: bool,
    pub is_error: bool,
    pub error_message: Option<String>,
}

impl UploadProgress {
    pub fn new(upload_id: impl Into<String>, stage: UploadStage) -> Self {
        let current = stage.step();
        let total = UploadStage::COUNT;
        let percent = if stage == UploadStage::Done {
            100.0
        } else {
            ((current - 1) as f64 / total as f64) * 100.0
        };
        Self {
            upload_id: upload_id.into(),
            stage,
            current,
            total,
            percent,
            message: stage.label().to_string(),
            is_cancelled: false,
            is_error: false,
            error_message: None,
        }
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = msg.into();
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.is_cancelled = true;
        self
    }

    pub fn error(mut self, msg: impl Into<String>) -> Self {
        self.is_error = true;
        self.error_message = Some(msg.into());
        self
    }
}

/// Receives progress events (CLI printer, desktop event emitter, tests).
pub trait UploadObserver: Send + Sync {
    fn on_progress(&self, progress: &UploadProgress);
}

impl<F> UploadObserver for F
where
    F: Fn(&UploadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &UploadProgress) {
        self(progress)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(Item),
    /// User dismissed the picker
    Cancelled,
}
