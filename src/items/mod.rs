// Wardrobe items
// Item records and the repository contract implemented by each backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub type ItemId = i64;

/// A user-owned wardrobe entry. Never mutated in place once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey {
            owner_id: self.owner_id.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Identifying key of an item: owner + image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub owner_id: String,
    pub image_url: String,
}

/// Record to insert; id and created_at are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

impl NewItem {
    pub fn new(owner_id: &str, name: &str, description: &str, image_url: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            image_url: image_url.to_string(),
        }
    }
}

/// Row storage for items.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert records and return them as stored.
    async fn insert(&self, items: Vec<NewItem>) -> Result<Vec<Item>>;

    /// All items of one owner, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Item>>;

    async fn delete(&self, id: ItemId) -> Result<()>;
}

/// Demo wardrobe used by the `seed` operation.
pub fn sample_items(owner_id: &str) -> Vec<NewItem> {
    vec![
        NewItem::new(
            owner_id,
            "Blue Denim Jacket",
            "Classic blue denim jacket perfect for casual outings",
            "https://images.unsplash.com/photo-1544022613-e87ca75a784a?w=400&h=400&fit=crop",
        ),
        NewItem::new(
            owner_id,
            "White Sneakers",
            "Comfortable white sneakers for everyday wear",
            "https://images.unsplash.com/photo-1549298916-b41d501d3772?w=400&h=400&fit=crop",
        ),
        NewItem::new(
            owner_id,
            "Black T-Shirt",
            "Essential black t-shirt for any outfit",
            "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=400&h=400&fit=crop",
        ),
        NewItem::new(
            owner_id,
            "Khaki Pants",
            "Versatile khaki pants for business casual",
            "https://images.unsplash.com/photo-1473966968600-fa801b869a1a?w=400&h=400&fit=crop",
        ),
    ]
}
