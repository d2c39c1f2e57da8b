// Wardrobe - Item Commands
// Gallery, upload, gestures and the demo wardrobe

use std::sync::Arc;

use tauri::{AppHandle, Emitter, State};

use super::picker::DialogPicker;
use super::{to_alert, AppState};
use crate::constants::EVENT_UPLOAD_PROGRESS;
use crate::error::UserAlert;
use crate::gallery::{GalleryGesture, GalleryLayout, GalleryModel, GestureEffect};
use crate::items::{Item, ItemKey};
use crate::upload::{UploadObserver, UploadOutcome, UploadProgress};

/// View regained focus: refetch and return the rendered gallery.
#[tauri::command]
pub async fn focus_wardrobe(state: State<'_, AppState>, layout: GalleryLayout) -> Result<GalleryModel, UserAlert> {
    state.0.view.on_focus().await.map_err(to_alert)?;
    Ok(state.0.view.gallery(layout))
}

#[tauri::command]
pub fn get_gallery(state: State<'_, AppState>, layout: GalleryLayout) -> GalleryModel {
    state.0.view.gallery(layout)
}

#[tauri::command]
pub fn get_selection(state: State<'_, AppState>) -> Option<Item> {
    state.0.view.snapshot().selection().cloned()
}

/// Pick a file and run the upload pipeline. Progress goes out as events.
/// Returns None when the dialog was cancelled.
#[tauri::command]
pub async fn add_item(app: AppHandle, state: State<'_, AppState>) -> Result<Option<Item>, UserAlert> {
    let emitter = app.clone();
    let observer: Arc<dyn UploadObserver> = Arc::new(move |progress: &UploadProgress| {
        let _ = emitter.emit(EVENT_UPLOAD_PROGRESS, progress);
    });

    let picker = DialogPicker::new(app);
    match state.0.view.add_item(&picker, Some(observer)).await.map_err(to_alert)? {
        UploadOutcome::Uploaded(item) => Ok(Some(item)),
        UploadOutcome::Cancelled => Ok(None),
    }
}

#[tauri::command]
pub async fn gallery_gesture(
    state: State<'_, AppState>,
    gesture: GalleryGesture,
) -> Result<GestureEffect, UserAlert> {
    state.0.view.gesture(gesture).await.map_err(to_alert)
}

#[tauri::command]
pub fn select_item(state: State<'_, AppState>, key: ItemKey) -> bool {
    state.0.view.select(&key)
}

#[tauri::command]
pub async fn seed_items(state: State<'_, AppState>) -> Result<usize, UserAlert> {
    state.0.view.seed().await.map_err(to_alert)
}
