// Wardrobe Error Types

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardrobeError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to fetch items: {0}")]
    Fetch(String),

    #[error("Failed to encode image: {0}")]
    Encoding(String),

    #[error("Failed to store image: {0}")]
    StorageWrite(String),

    #[error("Failed to save item: {0}")]
    RecordInsert(String),

    #[error("Failed to delete item: {0}")]
    RecordDelete(String),

    #[error("Styling proxy returned {status}: {body}")]
    Proxy { status: u16, body: String },

    #[error("{0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Title + message pair shown to the user as an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAlert {
    pub title: String,
    pub message: String,
}

impl UserAlert {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl WardrobeError {
    /// The user-facing alert for this error. Each kind gets its own title.
    pub fn alert(&self) -> UserAlert {
        match self {
            WardrobeError::PermissionDenied(_) => UserAlert::new(
                "Permission needed",
                "Please grant permission to access your photo library",
            ),
            WardrobeError::Fetch(msg) => UserAlert::new("Could not load items", msg.clone()),
            WardrobeError::Encoding(_) => {
                UserAlert::new("Image Error", "The selected image could not be read")
            }
            WardrobeError::StorageWrite(_) => {
                UserAlert::new("Upload Failed", "Failed to upload image to storage")
            }
            WardrobeError::RecordInsert(_) => {
                UserAlert::new("Database Error", "Failed to save item to database")
            }
            WardrobeError::RecordDelete(_) => {
                UserAlert::new("Delete Failed", "Failed to delete item")
            }
            WardrobeError::Proxy { status, .. } => UserAlert::new(
                "Styling Unavailable",
                format!("The styling service failed (HTTP {}). Please try again.", status),
            ),
            WardrobeError::Validation(msg) => UserAlert::new("Error", msg.clone()),
            WardrobeError::Auth(msg) => UserAlert::new("Authentication Error", msg.clone()),
            WardrobeError::Http(_) => UserAlert::new(
                "Network Error",
                "Could not reach the server. Check your connection.",
            ),
            other => UserAlert::new("Error", other.to_string()),
        }
    }
}

impl From<anyhow::Error> for WardrobeError {
    fn from(err: anyhow::Error) -> Self {
        WardrobeError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WardrobeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_stage_alerts_are_distinct() {
        let errors = [
            WardrobeError::PermissionDenied("denied".into()),
            WardrobeError::Encoding("bad".into()),
            WardrobeError::StorageWrite("503".into()),
            WardrobeError::RecordInsert("constraint".into()),
        ];
        let titles: std::collections::HashSet<String> =
            errors.iter().map(|e| e.alert().title).collect();
        assert_eq!(titles.len(), errors.len());
    }

    #[test]
    fn test_validation_alert_keeps_message() {
        let alert = WardrobeError::Validation("Passwords do not match".into()).alert();
        assert_eq!(alert.message, "Passwords do not match");
    }

    #[test]
    fn test_proxy_alert_hides_body() {
        let alert = WardrobeError::Proxy {
            status: 500,
            body: "OpenAI API error: secret details".into(),
        }
        .alert();
        assert!(!alert.message.contains("secret"));
        assert!(alert.message.contains("500"));
    }
}
