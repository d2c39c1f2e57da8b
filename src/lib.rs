// Wardrobe - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod db;
pub mod items;
pub mod storage;
pub mod session;
pub mod backend;
pub mod sync;
pub mod upload;
pub mod styling;
pub mod gallery;
pub mod view;
pub mod app;
#[cfg(feature = "desktop")]
pub mod commands;

pub use app::AppContext;
pub use error::{Result, WardrobeError};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Mutex;
    use tauri::Manager;

    use commands::{AppState, AuthWatch};

    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let ctx = match AppContext::load() {
                Ok(ctx) => ctx,
                Err(e) => {
                    log::error!("Config unusable ({}), falling back to defaults", e);
                    AppContext::new(config::AppConfig::default())?
                }
            };
            let watch = commands::watch_auth(app.handle(), &ctx);
            app.manage(AppState(ctx));
            app.manage(AuthWatch(Mutex::new(Some(watch))));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Auth
            commands::sign_in,
            commands::sign_up,
            commands::sign_out,
            commands::reset_password,
            commands::current_session,
            // Items and gallery
            commands::focus_wardrobe,
            commands::get_gallery,
            commands::get_selection,
            commands::add_item,
            commands::gallery_gesture,
            commands::select_item,
            commands::seed_items,
            // Styling
            commands::request_styling,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
