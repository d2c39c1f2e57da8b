// Wardrobe - Auth Commands
// Sign in/up/out and password reset from the login screen

use tauri::State;

use super::{to_alert, AppState};
use crate::error::UserAlert;
use crate::session::keychain;
use crate::session::validation::CredentialsForm;
use crate::session::{Session, UserIdentity};

#[tauri::command]
pub async fn sign_in(state: State<'_, AppState>, form: CredentialsForm) -> Result<Session, UserAlert> {
    let session = state.0.auth.sign_in(&form).await.map_err(to_alert)?;
    if let Err(e) = keychain::save_session(&session) {
        log::warn!("Session not persisted: {}", e);
    }
    Ok(session)
}

#[tauri::command]
pub async fn sign_up(state: State<'_, AppState>, form: CredentialsForm) -> Result<UserIdentity, UserAlert> {
    state.0.auth.sign_up(&form).await.map_err(to_alert)
}

#[tauri::command]
pub async fn sign_out(state: State<'_, AppState>) -> Result<(), UserAlert> {
    state.0.auth.sign_out().await.map_err(to_alert)?;
    if let Err(e) = keychain::clear_session() {
        log::warn!("Stored session not removed: {}", e);
    }
    Ok(())
}

#[tauri::command]
pub async fn reset_password(state: State<'_, AppState>, email: String) -> Result<(), UserAlert> {
    state.0.auth.reset_password(&email).await.map_err(to_alert)
}

/// Current session, if any (used by the frontend on start)
#[tauri::command]
pub fn current_session(state: State<'_, AppState>) -> Option<Session> {
    state.0.session().current()
}
