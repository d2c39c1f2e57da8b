// Wardrobe - Backends
// Concrete collaborators behind the session, item and storage contracts.

pub mod local;
pub mod supabase;

use std::sync::Arc;

use crate::config::{AppConfig, BackendConfig};
use crate::error::Result;
use crate::items::ItemRepository;
use crate::session::{AuthBackend, SessionStore};
use crate::storage::ObjectStore;

pub use local::LocalBackend;
pub use supabase::SupabaseBackend;

/// The three collaborators every view needs, all backed by one service.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthBackend>,
    pub items: Arc<dyn ItemRepository>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Backend {
    pub fn from_config(config: &AppConfig, session: SessionStore) -> Result<Self> {
        match &config.backend {
            BackendConfig::Local { library_root } => {
                let local = Arc::new(LocalBackend::open(library_root)?);
                Ok(Self::shared(local))
            }
            BackendConfig::Supabase { url, anon_key, bucket, table } => {
                log::info!("Using Supabase backend at {}", url);
                let remote = Arc::new(SupabaseBackend::new(url, anon_key, bucket, table, session)?);
                Ok(Self::shared(remote))
            }
        }
    }

    fn shared<B>(backend: Arc<B>) -> Self
    where
        B: AuthBackend + ItemRepository + ObjectStore + 'static,
    {
        Self {
            auth: backend.clone(),
            items: backend.clone(),
            objects: backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_config_builds_working_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            backend: BackendConfig::Local { library_root: dir.path().to_path_buf() },
            ..Default::default()
        };
        let backend = Backend::from_config(&config, SessionStore::new()).unwrap();

        let user = backend.auth.sign_up("ana@example.com", "secret1").await.unwrap();
        assert!(backend.items.list_by_owner(&user.id).await.unwrap().is_empty());
        assert!(dir.path().join(".wardrobe").join("wardrobe.db").exists());
    }
}
