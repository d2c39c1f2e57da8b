// Styling proxy HTTP client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::config::BackendConfig;
use crate::constants::ADVICE_PLACEHOLDER;
use crate::error::{Result, WardrobeError};
use super::{StylingProxy, StylingRequest, StylingResult};

#[derive(Debug, Serialize)]
struct AdviceBody<'a> {
    season: &'a str,
    styles: String,
}

#[derive(Debug, Serialize)]
struct ImageBody<'a> {
    season: &'a str,
    style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_image_url: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

/// Chat-completion shaped payload of the advice endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdviceResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    response_time: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default, rename = "text_instructions")]
    text_instructions: Option<String>,
    #[serde(default, rename = "base64_images")]
    base64_images: Vec<String>,
    #[serde(default)]
    response_time: Option<u64>,
}

fn advice_or_placeholder(text: Option<String>) -> String {
    text.filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| ADVICE_PLACEHOLDER.to_string())
}

/// Client for the two serverless styling endpoints. No retry.
#[derive(Debug, Clone)]
pub struct HttpStylingProxy {
    http: Client,
    advice_url: String,
    image_url: String,
    api_key: Option<String>,
}

impl HttpStylingProxy {
    pub fn new(advice_url: &str, image_url: &str, timeout: Duration, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wardrobe/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            advice_url: advice_url.to_string(),
            image_url: image_url.to_string(),
            api_key,
        })
    }

    /// None when no endpoints are configured (local backend without explicit URLs).
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(endpoints) = config.styling_endpoints() else {
            return Ok(None);
        };
        let api_key = match &config.backend {
            BackendConfig::Supabase { anon_key, .. } => Some(anon_key.clone()),
            BackendConfig::Local { .. } => None,
        };
        let proxy = Self::new(
            &endpoints.advice_url,
            &endpoints.image_url,
            Duration::from_secs(config.styling.timeout_secs),
            api_key,
        )?;
        Ok(Some(proxy))
    }

    async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<(Response, u64)> {
        let mut req = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key).header("apikey", key);
        }

        let started = Instant::now();
        let res = req.send().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if res.status().is_success() {
            return Ok((res, elapsed_ms));
        }

        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        log::warn!("Styling proxy {} returned {}: {}", url, status, body);
        Err(WardrobeError::Proxy { status, body })
    }
}

/// Parse a success body. Malformed JSON counts as an empty payload; a body
/// that cannot be read off the wire is a transport error.
async fn lenient_json<T: for<'de> Deserialize<'de> + Default>(res: Response) -> Result<T> {
    let text = res.text().await?;
    match serde_json::from_str(&text) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            log::warn!("Unreadable styling response ({}), using placeholder", e);
            Ok(T::default())
        }
    }
}

#[async_trait]
impl StylingProxy for HttpStylingProxy {
    async fn request_advice(&self, request: &StylingRequest) -> Result<StylingResult> {
        let body = AdviceBody {
            season: &request.season,
            styles: request.styles_text(),
        };
        let (res, elapsed_ms) = self.post(&self.advice_url, &body).await?;
        let parsed: AdviceResponse = lenient_json(res).await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        Ok(StylingResult {
            advice_text: advice_or_placeholder(content),
            generated_images: Vec::new(),
            response_time_ms: parsed.response_time.or(Some(elapsed_ms)),
        })
    }

    async fn request_image(&self, request: &StylingRequest) -> Result<StylingResult> {
        let body = ImageBody {
            season: &request.season,
            style: request.styles_text(),
            selected_image_url: request.selected_image_url.as_deref(),
        };
        let (res, elapsed_ms) = self.post(&self.image_url, &body).await?;
        let parsed: ImageResponse = lenient_json(res).await?;

        Ok(StylingResult {
            advice_text: advice_or_placeholder(parsed.text_instructions),
            generated_images: parsed.base64_images,
            response_time_ms: parsed.response_time.or(Some(elapsed_ms)),
        })
    }
}
