// Upload pipeline tests with in-memory collaborators and injected failures

use super::super::*;
use super::UploadPipeline;
use crate::error::{Result, WardrobeError};
use crate::items::{Item, ItemId, ItemRepository, NewItem};
use crate::storage::{MediaKind, ObjectStore, StoredObject};
use crate::sync::ItemSyncEngine;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

#[derive(Default)]
struct MemoryStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail: bool,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        if self.fail {
            return Err(WardrobeError::StorageWrite("bucket unavailable".into()));
        }
        let size_bytes = bytes.len() as u64;
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(StoredObject {
            path: path.to_string(),
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/{}", path)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }
}

#[derive(Default)]
struct MemoryRepo {
    items: Mutex<Vec<Item>>,
    fail_insert: bool,
}

#[async_trait]
impl ItemRepository for MemoryRepo {
    async fn insert(&self, items: Vec<NewItem>) -> Result<Vec<Item>> {
        if self.fail_insert {
            return Err(WardrobeError::Other("violates row-level security policy".into()));
        }
        let mut stored = self.items.lock().unwrap();
        let inserted: Vec<Item> = items
            .into_iter()
            .map(|n| Item {
                id: stored.len() as ItemId + 1,
                owner_id: n.owner_id,
                name: n.name,
                description: n.description,
                image_url: n.image_url,
                created_at: Utc::now(),
            })
            .collect();
        stored.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        self.items.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }
}

struct StaticPicker {
    permission: PermissionStatus,
    image: Option<PickedImage>,
    picked: Mutex<bool>,
}

impl StaticPicker {
    fn new(permission: PermissionStatus, image: Option<PickedImage>) -> Self {
        Self {
            permission,
            image,
            picked: Mutex::new(false),
        }
    }

    fn image(kind: MediaKind) -> Self {
        Self::new(
            PermissionStatus::Granted,
            Some(PickedImage {
                source: ImageSource::Base64(STANDARD.encode(b"pixels")),
                media_kind: kind,
            }),
        )
    }
}

#[async_trait]
impl ImagePicker for StaticPicker {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn pick(&self) -> Result<Option<PickedImage>> {
        *self.picked.lock().unwrap() = true;
        Ok(self.image.clone())
    }
}

fn pipeline(store: Arc<MemoryStore>, repo: Arc<MemoryRepo>) -> (UploadPipeline, ItemSyncEngine) {
    let sync = ItemSyncEngine::new(repo);
    (UploadPipeline::new(store, sync.clone()), sync)
}

#[tokio::test]
async fn test_upload_into_empty_list_selects_new_item() {
    let store = Arc::new(MemoryStore::default());
    let repo = Arc::new(MemoryRepo::default());
    let (pipeline, sync) = pipeline(store.clone(), repo.clone());

    sync.refresh("u1").await.unwrap();
    assert!(sync.snapshot().selection().is_none());

    let outcome = pipeline
        .run("u1", &StaticPicker::image(MediaKind::Image))
        .await
        .unwrap();
    let item = match outcome {
        UploadOutcome::Uploaded(item) => item,
        other => panic!("unexpected outcome {:?}", other),
    };

    assert_eq!(item.name, "New Item");
    assert_eq!(item.description, "Item uploaded from mobile app");
    assert!(item.image_url.starts_with("https://cdn.test/u1/"));
    assert!(item.image_url.ends_with(".png"));

    let snapshot = sync.snapshot();
    assert_eq!(snapshot.items().len(), 1);
    assert_eq!(snapshot.selection().map(|i| i.id), Some(item.id));
    assert!(!snapshot.is_uploading());

    let blobs = store.blobs.lock().unwrap();
    let (bytes, content_type) = blobs.values().next().unwrap();
    assert_eq!(bytes, b"pixels");
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_video_uses_mp4_path_and_content_type() {
    let store = Arc::new(MemoryStore::default());
    let (pipeline, _sync) = pipeline(store.clone(), Arc::new(MemoryRepo::default()));

    pipeline
        .run("u1", &StaticPicker::image(MediaKind::Video))
        .await
        .unwrap();

    let blobs = store.blobs.lock().unwrap();
    let (path, (_, content_type)) = blobs.iter().next().unwrap();
    assert!(path.starts_with("u1/") && path.ends_with(".mp4"));
    assert_eq!(content_type, "video/mp4");
}

#[tokio::test]
async fn test_storage_failure_inserts_nothing() {
    let store = Arc::new(MemoryStore { fail: true, ..Default::default() });
    let repo = Arc::new(MemoryRepo::default());
    let (pipeline, sync) = pipeline(store, repo.clone());

    let err = pipeline
        .run("u1", &StaticPicker::image(MediaKind::Image))
        .await
        .unwrap_err();

    assert!(matches!(err, WardrobeError::StorageWrite(_)));
    assert_eq!(err.alert().title, "Upload Failed");
    assert!(repo.items.lock().unwrap().is_empty());

    let snapshot = sync.snapshot();
    assert!(!snapshot.is_uploading());
    assert_eq!(snapshot.last_error(), Some("Failed to upload image to storage"));
}

#[tokio::test]
async fn test_insert_failure_leaves_blob_stored() {
    let store = Arc::new(MemoryStore::default());
    let repo = Arc::new(MemoryRepo { fail_insert: true, ..Default::default() });
    let (pipeline, sync) = pipeline(store.clone(), repo);

    let err = pipeline
        .run("u1", &StaticPicker::image(MediaKind::Image))
        .await
        .unwrap_err();

    assert!(matches!(err, WardrobeError::RecordInsert(_)));
    assert_eq!(err.alert().title, "Database Error");

    let path = store.blobs.lock().unwrap().keys().next().cloned().unwrap();
    assert!(store.exists(&path).await.unwrap());
    assert!(sync.snapshot().items().is_empty());
}

#[tokio::test]
async fn test_permission_denied_stops_before_picker() {
    let store = Arc::new(MemoryStore::default());
    let (pipeline, _sync) = pipeline(store.clone(), Arc::new(MemoryRepo::default()));
    let picker = StaticPicker::new(PermissionStatus::Denied, None);

    let err = pipeline.run("u1", &picker).await.unwrap_err();
    assert!(matches!(err, WardrobeError::PermissionDenied(_)));
    assert_eq!(err.alert().title, "Permission needed");
    assert!(!*picker.picked.lock().unwrap());
    assert!(store.blobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_pick_is_silent() {
    let (pipeline, sync) = pipeline(Arc::new(MemoryStore::default()), Arc::new(MemoryRepo::default()));
    let picker = StaticPicker::new(PermissionStatus::Granted, None);

    let outcome = pipeline.run("u1", &picker).await.unwrap();
    assert_eq!(outcome, UploadOutcome::Cancelled);

    let snapshot = sync.snapshot();
    assert!(snapshot.last_error().is_none());
    assert!(!snapshot.is_uploading());
}

#[tokio::test]
async fn test_bad_payload_is_encoding_error() {
    let store = Arc::new(MemoryStore::default());
    let (pipeline, _sync) = pipeline(store.clone(), Arc::new(MemoryRepo::default()));
    let picker = StaticPicker::new(
        PermissionStatus::Granted,
        Some(PickedImage {
            source: ImageSource::Base64("not base64 !!".into()),
            media_kind: MediaKind::Image,
        }),
    );

    let err = pipeline.run("u1", &picker).await.unwrap_err();
    assert!(matches!(err, WardrobeError::Encoding(_)));
    assert!(store.blobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_reports_stages_in_order() {
    let seen: Arc<Mutex<Vec<UploadStage>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let observer = move |p: &UploadProgress| seen_cb.lock().unwrap().push(p.stage);

    let (pipeline, _sync) = pipeline(Arc::new(MemoryStore::default()), Arc::new(MemoryRepo::default()));
    let pipeline = pipeline.with_observer(Arc::new(observer));
    pipeline
        .run("u1", &StaticPicker::image(MediaKind::Image))
        .await
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[
            UploadStage::Permission,
            UploadStage::Pick,
            UploadStage::Encode,
            UploadStage::Store,
            UploadStage::ResolveUrl,
            UploadStage::Insert,
            UploadStage::Refresh,
            UploadStage::Done,
        ]
    );
}

/// Holds the pick stage open until the test releases it.
struct GatedPicker {
    entered: mpsc::UnboundedSender<()>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

#[async_trait]
impl ImagePicker for GatedPicker {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn pick(&self) -> Result<Option<PickedImage>> {
        let release = self.release.lock().unwrap().take();
        self.entered.send(()).unwrap();
        if let Some(rx) = release {
            let _ = rx.await;
        }
        Ok(None)
    }
}

#[tokio::test]
async fn test_second_upload_rejected_while_first_runs() {
    let (pipeline, sync) = pipeline(Arc::new(MemoryStore::default()), Arc::new(MemoryRepo::default()));
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let (release_tx, release_rx) = oneshot::channel();
    let picker = Arc::new(GatedPicker {
        entered: entered_tx,
        release: Mutex::new(Some(release_rx)),
    });

    let first = {
        let pipeline = pipeline.clone();
        let picker = Arc::clone(&picker);
        tokio::spawn(async move { pipeline.run("u1", picker.as_ref()).await })
    };
    entered_rx.recv().await.unwrap();
    assert!(sync.snapshot().is_uploading());

    let err = pipeline
        .run("u1", &StaticPicker::image(MediaKind::Image))
        .await
        .unwrap_err();
    match err {
        WardrobeError::Validation(msg) => assert_eq!(msg, "Upload already in progress"),
        other => panic!("unexpected error {:?}", other),
    }

    release_tx.send(()).unwrap();
    assert_eq!(first.await.unwrap().unwrap(), UploadOutcome::Cancelled);
    assert!(!sync.snapshot().is_uploading());
}
