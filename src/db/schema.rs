// Database schema types and query helpers

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{WardrobeError, Result};
use crate::items::{Item, ItemId, NewItem};

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision,
/// which keeps lexical and chronological order identical.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WardrobeError::Other(format!("Invalid timestamp '{}': {}", raw, e)))
}

// ----- User -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_salt: String,
    pub password_digest: String,
    pub created_at: String,
}

pub fn insert_user(conn: &Connection, user: &UserRow) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, email, password_salt, password_digest) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.email, user.password_salt, user.password_digest],
    )?;
    Ok(())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let result = conn.query_row(
        "SELECT id, email, password_salt, password_digest, created_at FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password_salt: row.get(2)?,
                password_digest: row.get(3)?,
                created_at: row.get(4)?,
            })
        },
    ).optional()?;
    Ok(result)
}

// ----- Item -----

struct ItemRow {
    id: ItemId,
    owner_id: String,
    name: String,
    description: String,
    image_url: String,
    created_at: String,
}

impl ItemRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ItemRow {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            image_url: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_item(self) -> Result<Item> {
        Ok(Item {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

pub fn insert_item(conn: &Connection, item: &NewItem, created_at: DateTime<Utc>) -> Result<Item> {
    let created = format_timestamp(created_at);
    conn.execute(
        "INSERT INTO user_items (user_id, item_name, item_description, item_image_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![item.owner_id, item.name, item.description, item.image_url, created],
    )?;
    get_item(conn, conn.last_insert_rowid())?
        .ok_or_else(|| WardrobeError::RecordInsert("Item not found after insert".to_string()))
}

pub fn get_item(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
    let row = conn.query_row(
        "SELECT item_id, user_id, item_name, item_description, item_image_url, created_at
         FROM user_items WHERE item_id = ?1",
        params![id],
        ItemRow::from_row,
    ).optional()?;
    row.map(ItemRow::into_item).transpose()
}

/// Items of one owner, newest first. Ties on created_at fall back to insertion order.
pub fn list_items_by_owner(conn: &Connection, owner_id: &str) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, user_id, item_name, item_description, item_image_url, created_at
         FROM user_items WHERE user_id = ?1
         ORDER BY created_at DESC, item_id DESC"
    )?;

    let rows = stmt
        .query_map(params![owner_id], ItemRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(ItemRow::into_item).collect()
}

/// Returns the number of rows removed (0 when the id is unknown).
pub fn delete_item(conn: &Connection, id: ItemId) -> Result<usize> {
    let removed = conn.execute("DELETE FROM user_items WHERE item_id = ?1", params![id])?;
    Ok(removed)
}

pub fn count_items(conn: &Connection, owner_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_items WHERE user_id = ?1",
        params![owner_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ----- Object -----

pub fn upsert_object(conn: &Connection, path: &str, size_bytes: u64, content_type: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO objects (path, size_bytes, content_type) VALUES (?1, ?2, ?3)
         ON CONFLICT(path) DO UPDATE SET size_bytes = excluded.size_bytes, content_type = excluded.content_type",
        params![path, size_bytes as i64, content_type],
    )?;
    Ok(())
}

pub fn object_exists(conn: &Connection, path: &str) -> Result<bool> {
    let found: Option<i64> = conn.query_row(
        "SELECT 1 FROM objects WHERE path = ?1",
        params![path],
        |row| row.get(0),
    ).optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_list_items_newest_first_per_owner() {
        let conn = crate::db::open_memory_db().unwrap();
        let t0 = Utc::now();
        insert_item(&conn, &NewItem::new("a", "Old", "", "u/1.png"), t0).unwrap();
        insert_item(&conn, &NewItem::new("a", "New", "", "u/2.png"), t0 + Duration::seconds(5)).unwrap();
        insert_item(&conn, &NewItem::new("b", "Other", "", "v/1.png"), t0).unwrap();

        let items = list_items_by_owner(&conn, "a").unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(count_items(&conn, "b").unwrap(), 1);
    }

    #[test]
    fn test_same_millisecond_keeps_insertion_order() {
        let conn = crate::db::open_memory_db().unwrap();
        let t0 = Utc::now();
        let first = insert_item(&conn, &NewItem::new("a", "First", "", "u/1.png"), t0).unwrap();
        let second = insert_item(&conn, &NewItem::new("a", "Second", "", "u/2.png"), t0).unwrap();

        let items = list_items_by_owner(&conn, "a").unwrap();
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);
    }

    #[test]
    fn test_delete_unknown_item_removes_nothing() {
        let conn = crate::db::open_memory_db().unwrap();
        assert_eq!(delete_item(&conn, 42).unwrap(), 0);
    }

    #[test]
    fn test_timestamp_round_trip_preserves_millis() {
        let ts = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(ts)).unwrap();
        assert_eq!(parsed.timestamp_millis(), ts.timestamp_millis());
    }
}
