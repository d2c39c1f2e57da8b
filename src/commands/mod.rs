// Wardrobe - Commands Module
// Tauri commands organized by domain

pub mod auth;
pub mod items;
pub mod picker;
pub mod styling;

// Re-export all commands for easy registration
pub use auth::*;
pub use items::*;
pub use styling::*;

use std::sync::Mutex;

use serde::Serialize;
use tauri::{AppHandle, Emitter};

use crate::app::AppContext;
use crate::constants::EVENT_AUTH_CHANGED;
use crate::error::{UserAlert, WardrobeError};
use crate::session::{AuthEvent, Subscription};

/// App context managed by Tauri. Cloning shares the same session and view.
pub struct AppState(pub AppContext);

/// Keeps the auth-changed forwarding alive for the lifetime of the app.
pub struct AuthWatch(pub Mutex<Option<Subscription>>);

/// Commands return the user-facing alert for any failure.
pub(crate) fn to_alert(err: WardrobeError) -> UserAlert {
    log::warn!("Command failed: {}", err);
    err.alert()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthChanged {
    event: AuthEvent,
    user_id: Option<String>,
    email: Option<String>,
}

/// Forward every session change to the frontend as an event.
pub fn watch_auth(app: &AppHandle, ctx: &AppContext) -> Subscription {
    let app = app.clone();
    ctx.session().subscribe(move |event, session| {
        let payload = AuthChanged {
            event,
            user_id: session.map(|s| s.user.id.clone()),
            email: session.and_then(|s| s.user.email.clone()),
        };
        if let Err(e) = app.emit(EVENT_AUTH_CHANGED, payload) {
            log::warn!("Failed to emit auth change: {}", e);
        }
    })
}
