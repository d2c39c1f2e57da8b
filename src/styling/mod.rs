// Wardrobe - Styling
// Season/style requests to the styling proxy and the advice they return.

pub mod client;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WardrobeError};
use crate::items::Item;

pub use client::HttpStylingProxy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylingRequest {
    pub season: String,
    pub styles: Vec<String>,
    pub selected_image_url: Option<String>,
}

impl StylingRequest {
    pub fn new(season: &str, styles: &[String], selected_image_url: Option<&str>) -> Self {
        Self {
            season: season.trim().to_string(),
            styles: styles
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            selected_image_url: selected_image_url.map(str::to_string),
        }
    }

    /// Same rule the proxy enforces with its 400 response.
    pub fn validate(&self) -> Result<()> {
        if self.season.trim().is_empty() {
            return Err(WardrobeError::Validation("Please choose a season".to_string()));
        }
        if !self.styles.iter().any(|s| !s.trim().is_empty()) {
            return Err(WardrobeError::Validation(
                "Please choose at least one style".to_string(),
            ));
        }
        Ok(())
    }

    /// Styles as the single comma-separated string the proxy expects
    pub fn styles_text(&self) -> String {
        self.styles.join(", ")
    }
}

/// Advice for one request. Held in view state only, replaced on each request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylingResult {
    pub advice_text: String,
    /// Base64-encoded generated images
    pub generated_images: Vec<String>,
    pub response_time_ms: Option<u64>,
}

impl StylingResult {
    pub fn first_image_bytes(&self) -> Result<Option<Vec<u8>>> {
        match self.generated_images.first() {
            Some(encoded) => STANDARD
                .decode(encoded.trim())
                .map(Some)
                .map_err(|e| WardrobeError::Encoding(format!("Generated image is not base64: {}", e))),
            None => Ok(None),
        }
    }
}

#[async_trait]
pub trait StylingProxy: Send + Sync {
    /// Text advice for a season and set of styles
    async fn request_advice(&self, request: &StylingRequest) -> Result<StylingResult>;

    /// Instructions and generated images, optionally built around a selected item
    async fn request_image(&self, request: &StylingRequest) -> Result<StylingResult>;
}

/// Image endpoint when an item is selected, text advice otherwise.
pub async fn request_styling(
    proxy: &dyn StylingProxy,
    season: &str,
    styles: &[String],
    selection: Option<&Item>,
) -> Result<StylingResult> {
    let request = StylingRequest::new(season, styles, selection.map(|i| i.image_url.as_str()));
    request.validate()?;

    match selection {
        Some(item) => {
            log::info!("Requesting styling image around item {}", item.id);
            proxy.request_image(&request).await
        }
        None => {
            log::info!("Requesting styling advice for {}", request.season);
            proxy.request_advice(&request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProxy {
        calls: Mutex<Vec<(&'static str, StylingRequest)>>,
    }

    #[async_trait]
    impl StylingProxy for RecordingProxy {
        async fn request_advice(&self, request: &StylingRequest) -> Result<StylingResult> {
            self.calls.lock().unwrap().push(("advice", request.clone()));
            Ok(StylingResult { advice_text: "wear layers".into(), ..Default::default() })
        }

        async fn request_image(&self, request: &StylingRequest) -> Result<StylingResult> {
            self.calls.lock().unwrap().push(("image", request.clone()));
            Ok(StylingResult { advice_text: "flat lay".into(), ..Default::default() })
        }
    }

    fn item() -> Item {
        Item {
            id: 3,
            owner_id: "u1".into(),
            name: "Jacket".into(),
            description: String::new(),
            image_url: "https://x/u1/3.png".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_selection_picks_image_endpoint() {
        let proxy = RecordingProxy::default();
        let styles = vec!["casual".to_string(), "boho".to_string()];

        request_styling(&proxy, "Fall", &styles, Some(&item())).await.unwrap();
        request_styling(&proxy, "Fall", &styles, None).await.unwrap();

        let calls = proxy.calls.lock().unwrap();
        assert_eq!(calls[0].0, "image");
        assert_eq!(calls[0].1.selected_image_url.as_deref(), Some("https://x/u1/3.png"));
        assert_eq!(calls[1].0, "advice");
        assert_eq!(calls[1].1.styles_text(), "casual, boho");
    }

    #[tokio::test]
    async fn test_missing_styles_rejected_before_proxy() {
        let proxy = RecordingProxy::default();
        let err = request_styling(&proxy, "Summer", &["  ".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, WardrobeError::Validation(_)));
        assert!(proxy.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_image_bytes() {
        let result = StylingResult {
            generated_images: vec![STANDARD.encode(b"png!")],
            ..Default::default()
        };
        assert_eq!(result.first_image_bytes().unwrap(), Some(b"png!".to_vec()));
        assert_eq!(StylingResult::default().first_image_bytes().unwrap(), None);

        let bad = StylingResult {
            generated_images: vec!["***".into()],
            ..Default::default()
        };
        assert!(matches!(bad.first_image_bytes(), Err(WardrobeError::Encoding(_))));
    }
}
