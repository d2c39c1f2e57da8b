// Wardrobe - Local Backend
// Offline backend: SQLite for accounts and items, a folder of blobs for media.

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;

use crate::db::{self, schema};
use crate::error::{Result, WardrobeError};
use crate::items::{Item, ItemId, ItemRepository, NewItem};
use crate::session::{AuthBackend, Session, UserIdentity};
use crate::storage::{ObjectStore, StoredObject};

pub struct LocalBackend {
    conn: Mutex<Connection>,
    objects_root: PathBuf,
}

impl LocalBackend {
    /// Open (or create) a library at `library_root`.
    pub fn open(library_root: &Path) -> Result<Self> {
        db::init_library_folders(library_root)?;
        let conn = db::open_db(&db::get_db_path(library_root))?;
        log::info!("Opened local library at {}", library_root.display());
        Ok(Self {
            conn: Mutex::new(conn),
            objects_root: db::get_objects_path(library_root),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn object_file(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(WardrobeError::StorageWrite(format!("Invalid object path: {}", path)));
        }
        Ok(self.objects_root.join(relative))
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthBackend for LocalBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let user = schema::get_user_by_email(&self.conn(), &email)?
            .filter(|u| password_digest(&u.password_salt, password) == u.password_digest)
            .ok_or_else(|| WardrobeError::Auth("Invalid login credentials".to_string()))?;

        Ok(Session {
            user: UserIdentity {
                id: user.id,
                email: Some(user.email),
            },
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_at: None,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let email = normalize_email(email);
        let conn = self.conn();
        if schema::get_user_by_email(&conn, &email)?.is_some() {
            return Err(WardrobeError::Auth("User already registered".to_string()));
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        let user = schema::UserRow {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.clone(),
            password_digest: password_digest(&salt, password),
            password_salt: salt,
            created_at: String::new(),
        };
        schema::insert_user(&conn, &user)?;

        Ok(UserIdentity {
            id: user.id,
            email: Some(email),
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        log::debug!("Local sign out for {}", session.user.id);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        // Same answer whether or not the account exists
        if schema::get_user_by_email(&self.conn(), &normalize_email(email))?.is_some() {
            log::info!("Password reset requested for a local account");
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for LocalBackend {
    async fn insert(&self, items: Vec<NewItem>) -> Result<Vec<Item>> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| WardrobeError::RecordInsert(e.to_string()))?;

        let now = Utc::now();
        let mut stored = Vec::with_capacity(items.len());
        for item in &items {
            let row = schema::insert_item(&tx, item, now)
                .map_err(|e| WardrobeError::RecordInsert(e.to_string()))?;
            stored.push(row);
        }
        tx.commit()
            .map_err(|e| WardrobeError::RecordInsert(e.to_string()))?;
        Ok(stored)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Item>> {
        schema::list_items_by_owner(&self.conn(), owner_id)
            .map_err(|e| WardrobeError::Fetch(e.to_string()))
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let removed = schema::delete_item(&self.conn(), id)
            .map_err(|e| WardrobeError::RecordDelete(e.to_string()))?;
        if removed == 0 {
            log::debug!("Delete of unknown item {} ignored", id);
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalBackend {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        let file = self.object_file(path)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WardrobeError::StorageWrite(e.to_string()))?;
        }
        let size_bytes = bytes.len() as u64;
        tokio::fs::write(&file, bytes)
            .await
            .map_err(|e| WardrobeError::StorageWrite(e.to_string()))?;

        schema::upsert_object(&self.conn(), path, size_bytes, content_type)
            .map_err(|e| WardrobeError::StorageWrite(e.to_string()))?;

        Ok(StoredObject {
            path: path.to_string(),
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, path: &str) -> String {
        let file = self.objects_root.join(path);
        let display = file.to_string_lossy().replace('\\', "/");
        if display.starts_with('/') {
            format!("file://{}", display)
        } else {
            format!("file:///{}", display)
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let file = match self.object_file(path) {
            Ok(f) => f,
            Err(_) => return Ok(false),
        };
        Ok(file.is_file() && schema::object_exists(&self.conn(), path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path()).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (_dir, backend) = backend();
        let user = backend.sign_up("Ana@Example.com", "secret1").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));

        let session = backend.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(!session.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_and_duplicate_email() {
        let (_dir, backend) = backend();
        backend.sign_up("ana@example.com", "secret1").await.unwrap();

        let err = backend.sign_in("ana@example.com", "secret2").await.unwrap_err();
        assert!(matches!(err, WardrobeError::Auth(_)));

        let err = backend.sign_in("bob@example.com", "secret1").await.unwrap_err();
        assert!(matches!(err, WardrobeError::Auth(_)));

        let err = backend.sign_up("ana@example.com", "other12").await.unwrap_err();
        assert!(matches!(err, WardrobeError::Auth(_)));
    }

    #[tokio::test]
    async fn test_items_insert_list_delete() {
        let (_dir, backend) = backend();
        let stored = backend
            .insert(vec![NewItem::new("u1", "Shirt", "", "file:///a.png")])
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        backend
            .insert(vec![NewItem::new("u2", "Hat", "", "file:///b.png")])
            .await
            .unwrap();

        let items = backend.list_by_owner("u1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Shirt");

        backend.delete(stored[0].id).await.unwrap();
        assert!(backend.list_by_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_writes_blob_and_resolves_url() {
        let (dir, backend) = backend();
        let obj = backend
            .upload("u1/1700000000000.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(obj.size_bytes, 3);
        assert!(backend.exists("u1/1700000000000.png").await.unwrap());
        assert!(!backend.exists("u1/missing.png").await.unwrap());

        let on_disk = dir.path().join("objects").join("u1").join("1700000000000.png");
        assert_eq!(std::fs::read(on_disk).unwrap(), vec![1, 2, 3]);

        let url = backend.public_url("u1/1700000000000.png");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("u1/1700000000000.png"));
    }

    #[tokio::test]
    async fn test_upload_rejects_escaping_paths() {
        let (_dir, backend) = backend();
        let err = backend
            .upload("../outside.png", vec![0], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, WardrobeError::StorageWrite(_)));
    }
}
