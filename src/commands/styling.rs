// Wardrobe - Styling Commands

use tauri::State;

use super::{to_alert, AppState};
use crate::error::UserAlert;
use crate::styling::StylingResult;

/// Styling advice for the current selection, or general advice without one.
#[tauri::command]
pub async fn request_styling(
    state: State<'_, AppState>,
    season: String,
    styles: Vec<String>,
) -> Result<StylingResult, UserAlert> {
    state.0.view.request_styling(&season, &styles).await.map_err(to_alert)
}
