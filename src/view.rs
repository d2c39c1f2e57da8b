// Wardrobe - View
// One wardrobe screen: session-scoped sync engine, upload pipeline and styling.

use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{Result, WardrobeError};
use crate::gallery::{self, GalleryGesture, GalleryLayout, GalleryModel, GestureEffect};
use crate::items::{sample_items, Item, ItemId, ItemKey};
use crate::session::SessionStore;
use crate::styling::{self, StylingProxy, StylingResult};
use crate::sync::{ItemSyncEngine, WardrobeState};
use crate::upload::{ImagePicker, UploadObserver, UploadOutcome, UploadPipeline};

#[derive(Clone)]
pub struct WardrobeView {
    session: SessionStore,
    sync: ItemSyncEngine,
    upload: UploadPipeline,
    styling: Option<Arc<dyn StylingProxy>>,
    strip_limit: usize,
}

impl WardrobeView {
    pub fn new(
        session: SessionStore,
        backend: &Backend,
        styling: Option<Arc<dyn StylingProxy>>,
        strip_limit: usize,
    ) -> Self {
        let sync = ItemSyncEngine::new(Arc::clone(&backend.items));
        let upload = UploadPipeline::new(Arc::clone(&backend.objects), sync.clone());
        Self {
            session,
            sync,
            upload,
            styling,
            strip_limit,
        }
    }

    fn owner(&self) -> Result<String> {
        self.session.require_owner()
    }

    pub async fn on_focus(&self) -> Result<Vec<Item>> {
        let owner = self.owner()?;
        self.sync.on_focus(&owner).await
    }

    pub async fn add_item(
        &self,
        picker: &dyn ImagePicker,
        observer: Option<Arc<dyn UploadObserver>>,
    ) -> Result<UploadOutcome> {
        let owner = self.owner()?;
        match observer {
            Some(observer) => self.upload.clone().with_observer(observer).run(&owner, picker).await,
            None => self.upload.run(&owner, picker).await,
        }
    }

    /// Apply a gallery gesture; a delete effect is carried out here.
    pub async fn gesture(&self, gesture: GalleryGesture) -> Result<GestureEffect> {
        let effect = self.sync.update(|s| s.gesture(gesture));
        if let GestureEffect::Delete(id) = effect {
            self.delete_item(id).await?;
        }
        Ok(effect)
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        let owner = self.owner()?;
        self.sync.delete(&owner, id).await
    }

    pub fn select(&self, key: &ItemKey) -> bool {
        self.sync.select(key)
    }

    /// Styling for the current selection (image endpoint) or general advice.
    pub async fn request_styling(&self, season: &str, styles: &[String]) -> Result<StylingResult> {
        let proxy = self.styling.as_ref().ok_or_else(|| {
            WardrobeError::Config("Styling endpoints are not configured".to_string())
        })?;
        let selection = self.sync.snapshot().selection().cloned();

        let result = styling::request_styling(proxy.as_ref(), season, styles, selection.as_ref()).await?;
        self.sync.update(|s| s.styling_received(result.clone()));
        Ok(result)
    }

    /// Insert the demo wardrobe and refetch. Returns how many were added.
    pub async fn seed(&self) -> Result<usize> {
        let owner = self.owner()?;
        let added = self
            .sync
            .repository()
            .insert(sample_items(&owner))
            .await?;
        log::info!("Added {} sample items for {}", added.len(), owner);
        self.sync.refresh(&owner).await?;
        Ok(added.len())
    }

    pub fn gallery(&self, layout: GalleryLayout) -> GalleryModel {
        gallery::render(&self.sync.snapshot(), layout, self.strip_limit)
    }

    pub fn snapshot(&self) -> WardrobeState {
        self.sync.snapshot()
    }

    pub fn unmount(&self) {
        self.sync.unmount();
    }
}
