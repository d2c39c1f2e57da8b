// Wardrobe - App Context
// Wires config, backend, session and the wardrobe view for one process.

use std::sync::Arc;

use crate::backend::Backend;
use crate::config::AppConfig;
use crate::error::Result;
use crate::session::{keychain, AuthService, SessionStore};
use crate::styling::{HttpStylingProxy, StylingProxy};
use crate::view::WardrobeView;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub auth: AuthService,
    pub view: WardrobeView,
}

impl AppContext {
    /// Build every collaborator from `config`. No session is restored.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let session = SessionStore::new();
        let backend = Backend::from_config(&config, session.clone())?;

        let styling = HttpStylingProxy::from_config(&config)?
            .map(|proxy| Arc::new(proxy) as Arc<dyn StylingProxy>);
        if styling.is_none() {
            log::info!("No styling endpoints configured; styling requests are disabled");
        }

        let auth = AuthService::new(Arc::clone(&backend.auth), session.clone());
        let view = WardrobeView::new(session, &backend, styling, config.gallery.strip_limit);

        Ok(Self { config, auth, view })
    }

    /// Load config, build the context and restore the keychain session.
    pub fn load() -> Result<Self> {
        let ctx = Self::new(AppConfig::load()?)?;
        ctx.auth.restore(keychain::load_session());
        Ok(ctx)
    }

    pub fn session(&self) -> &SessionStore {
        self.auth.store()
    }
}
