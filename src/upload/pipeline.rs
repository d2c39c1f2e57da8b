// Upload pipeline execution
// permission -> pick -> encode -> store -> public URL -> insert -> refresh.
// Every run starts from the first stage; nothing is resumed or retried.

use std::sync::Arc;

use chrono::Utc;

use crate::constants::{DEFAULT_ITEM_DESCRIPTION, DEFAULT_ITEM_NAME};
use crate::error::{Result, WardrobeError};
use crate::items::{Item, NewItem};
use crate::storage::{object_path, ObjectStore};
use crate::sync::ItemSyncEngine;
use super::{ImagePicker, PermissionStatus, UploadObserver, UploadOutcome, UploadProgress, UploadStage};

#[derive(Clone)]
pub struct UploadPipeline {
    objects: Arc<dyn ObjectStore>,
    sync: ItemSyncEngine,
    observer: Option<Arc<dyn UploadObserver>>,
}

impl UploadPipeline {
    pub fn new(objects: Arc<dyn ObjectStore>, sync: ItemSyncEngine) -> Self {
        Self {
            objects,
            sync,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn emit(&self, progress: UploadProgress) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&progress);
        }
    }

    fn stage(&self, upload_id: &str, stage: UploadStage) {
        log::info!("Upload {}: {}", upload_id, stage.label());
        self.emit(UploadProgress::new(upload_id, stage));
    }

    /// Run one upload for `owner_id`. The upload flag is raised for the whole
    /// run; a second run while one is active is rejected.
    pub async fn run(&self, owner_id: &str, picker: &dyn ImagePicker) -> Result<UploadOutcome> {
        self.sync.update(|s| s.upload_started())?;
        let upload_id = uuid::Uuid::new_v4().to_string();

        let result = self.run_stages(&upload_id, owner_id, picker).await;

        match &result {
            Ok(UploadOutcome::Uploaded(item)) => {
                let item = item.clone();
                self.sync.update(|s| s.upload_succeeded(item));

                self.stage(&upload_id, UploadStage::Refresh);
                if let Err(e) = self.sync.refresh(owner_id).await {
                    log::warn!("Upload {}: refresh after upload failed: {}", upload_id, e);
                }
                self.emit(
                    UploadProgress::new(&upload_id, UploadStage::Done)
                        .with_message("Image uploaded and item saved successfully!"),
                );
            }
            Ok(UploadOutcome::Cancelled) => {
                log::info!("Upload {}: image picker cancelled", upload_id);
                self.sync.update(|s| s.upload_cancelled());
                self.emit(UploadProgress::new(&upload_id, UploadStage::Pick).cancelled());
            }
            Err(e) => {
                log::error!("Upload {} failed: {}", upload_id, e);
                let alert = e.alert();
                self.sync.update(|s| s.upload_failed(alert.message.clone()));
                self.emit(UploadProgress::new(&upload_id, UploadStage::Done).error(alert.message));
            }
        }

        result
    }

    async fn run_stages(
        &self,
        upload_id: &str,
        owner_id: &str,
        picker: &dyn ImagePicker,
    ) -> Result<UploadOutcome> {
        // 1. Permission
        self.stage(upload_id, UploadStage::Permission);
        if picker.request_permission().await != PermissionStatus::Granted {
            return Err(WardrobeError::PermissionDenied(
                "Photo library access was not granted".to_string(),
            ));
        }

        // 2. Pick (cancel ends the run quietly)
        self.stage(upload_id, UploadStage::Pick);
        let Some(picked) = picker.pick().await? else {
            return Ok(UploadOutcome::Cancelled);
        };

        // 3. Encode
        self.stage(upload_id, UploadStage::Encode);
        let bytes = picked.read_bytes().await?;
        let kind = picked.media_kind;

        // 4. Store (failure aborts before any record exists)
        self.stage(upload_id, UploadStage::Store);
        let path = object_path(owner_id, kind, Utc::now());
        let stored = self
            .objects
            .upload(&path, bytes, kind.content_type())
            .await
            .map_err(|e| match e {
                WardrobeError::StorageWrite(_) => e,
                other => WardrobeError::StorageWrite(other.to_string()),
            })?;
        log::debug!("Upload {}: stored {} ({} bytes)", upload_id, stored.path, stored.size_bytes);

        // 5. Public URL
        self.stage(upload_id, UploadStage::ResolveUrl);
        let public_url = self.objects.public_url(&stored.path);

        // 6. Insert (a failure leaves the blob behind unreferenced)
        self.stage(upload_id, UploadStage::Insert);
        let record = NewItem::new(owner_id, DEFAULT_ITEM_NAME, DEFAULT_ITEM_DESCRIPTION, &public_url);
        let item = match self.insert_one(record).await {
            Ok(item) => item,
            Err(e) => {
                log::warn!(
                    "Upload {}: blob {} is orphaned after insert failure",
                    upload_id,
                    stored.path
                );
                return Err(e);
            }
        };

        Ok(UploadOutcome::Uploaded(item))
    }

    async fn insert_one(&self, record: NewItem) -> Result<Item> {
        let inserted = self
            .sync
            .repository()
            .insert(vec![record])
            .await
            .map_err(|e| match e {
                WardrobeError::RecordInsert(_) => e,
                other => WardrobeError::RecordInsert(other.to_string()),
            })?;

        inserted
            .into_iter()
            .next()
            .ok_or_else(|| WardrobeError::RecordInsert("Insert returned no rows".to_string()))
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
