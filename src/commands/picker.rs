// Native file dialog as the image picker

use async_trait::async_trait;
use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;
use tokio::sync::oneshot;

use crate::constants::VIDEO_EXTENSIONS;
use crate::error::{Result, WardrobeError};
use crate::upload::{ImagePicker, PermissionStatus, PickedImage};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "heic", "webp", "gif"];

pub struct DialogPicker {
    app: AppHandle,
}

impl DialogPicker {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

#[async_trait]
impl ImagePicker for DialogPicker {
    /// Desktop file dialogs need no library permission.
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn pick(&self) -> Result<Option<PickedImage>> {
        let (tx, rx) = oneshot::channel();
        self.app
            .dialog()
            .file()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .add_filter("Videos", &VIDEO_EXTENSIONS)
            .pick_file(move |file| {
                let _ = tx.send(file);
            });

        let picked = rx
            .await
            .map_err(|_| WardrobeError::Other("File dialog closed unexpectedly".to_string()))?;

        match picked {
            Some(file) => {
                let path = file
                    .into_path()
                    .map_err(|e| WardrobeError::Encoding(format!("Unsupported file location: {}", e)))?;
                Ok(Some(PickedImage::from_path(path)))
            }
            None => Ok(None),
        }
    }
}
