// Item sync engine
// Refetches the owner's items and applies them to the view state in issue order.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, WardrobeError};
use crate::items::{Item, ItemId, ItemKey, ItemRepository};
use super::state::{RefreshOutcome, WardrobeState};

#[derive(Clone)]
pub struct ItemSyncEngine {
    state: Arc<Mutex<WardrobeState>>,
    repo: Arc<dyn ItemRepository>,
}

impl ItemSyncEngine {
    pub fn new(repo: Arc<dyn ItemRepository>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WardrobeState::new())),
            repo,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WardrobeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run one state transition. The lock is released before returning.
    pub fn update<R>(&self, f: impl FnOnce(&mut WardrobeState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> WardrobeState {
        self.lock().clone()
    }

    pub fn repository(&self) -> Arc<dyn ItemRepository> {
        Arc::clone(&self.repo)
    }

    /// Fetch the owner's items, newest first. A result that arrives after a
    /// later-issued refresh was applied, or after a local delete or upload, is
    /// dropped; a failure keeps the list. Returns the list now displayed.
    pub async fn refresh(&self, owner_id: &str) -> Result<Vec<Item>> {
        let ticket = self.update(|s| s.refresh_issued());
        log::debug!("Refresh {:?} issued for {}", ticket, owner_id);

        match self.repo.list_by_owner(owner_id).await {
            Ok(items) => {
                let count = items.len();
                let (outcome, shown) = self.update(|s| {
                    let outcome = s.refresh_applied(ticket, items);
                    (outcome, s.items().to_vec())
                });
                match outcome {
                    RefreshOutcome::Applied => log::info!("Refresh {:?} applied ({} items)", ticket, count),
                    RefreshOutcome::Stale => log::info!("Refresh {:?} discarded as stale", ticket),
                    RefreshOutcome::Unmounted => log::debug!("Refresh {:?} arrived after unmount", ticket),
                }
                Ok(shown)
            }
            Err(e) => {
                let e = match e {
                    WardrobeError::Fetch(_) => e,
                    other => WardrobeError::Fetch(other.to_string()),
                };
                log::warn!("Refresh {:?} failed: {}", ticket, e);
                self.update(|s| s.refresh_failed(ticket, e.to_string()));
                Err(e)
            }
        }
    }

    /// The view regained focus.
    pub async fn on_focus(&self, owner_id: &str) -> Result<Vec<Item>> {
        self.refresh(owner_id).await
    }

    /// Delete remotely, drop locally (reconciling the selection), then refetch.
    pub async fn delete(&self, owner_id: &str, id: ItemId) -> Result<()> {
        if let Err(e) = self.repo.delete(id).await {
            let e = match e {
                WardrobeError::RecordDelete(_) => e,
                other => WardrobeError::RecordDelete(other.to_string()),
            };
            log::warn!("Delete of item {} failed: {}", id, e);
            return Err(e);
        }
        log::info!("Deleted item {}", id);
        self.update(|s| s.item_deleted(id));
        self.refresh(owner_id).await.map(|_| ())
    }

    pub fn select(&self, key: &ItemKey) -> bool {
        self.update(|s| s.item_selected(key))
    }

    pub fn unmount(&self) {
        self.update(|s| s.unmounted());
    }
}
