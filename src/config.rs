// Wardrobe - Configuration
// Loaded from ~/.wardrobe/config.json, then overridden from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ADVICE_FUNCTION, APP_DIR, CONFIG_FILENAME, DEFAULT_BUCKET, DEFAULT_ITEMS_TABLE,
    DEFAULT_PROXY_TIMEOUT_SECS, IMAGE_FUNCTION, RECENT_STRIP_LIMIT,
};
use crate::error::{Result, WardrobeError};

/// Library folder used by the local backend when none is configured
const DEFAULT_LIBRARY_FOLDER: &str = "Wardrobe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Offline SQLite + filesystem backend
    #[serde(rename_all = "camelCase")]
    Local { library_root: PathBuf },
    /// Hosted BaaS backend (auth, items table, storage bucket)
    #[serde(rename_all = "camelCase")]
    Supabase {
        url: String,
        anon_key: String,
        #[serde(default = "default_bucket")]
        bucket: String,
        #[serde(default = "default_table")]
        table: String,
    },
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_table() -> String {
    DEFAULT_ITEMS_TABLE.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            library_root: default_library_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylingConfig {
    pub advice_url: Option<String>,
    pub image_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            advice_url: None,
            image_url: None,
            timeout_secs: DEFAULT_PROXY_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryConfig {
    pub strip_limit: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            strip_limit: RECENT_STRIP_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub styling: StylingConfig,
    pub gallery: GalleryConfig,
}

/// Resolved styling endpoints (both present or styling is unavailable)
#[derive(Debug, Clone, PartialEq)]
pub struct StylingEndpoints {
    pub advice_url: String,
    pub image_url: String,
}

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_library_root() -> PathBuf {
    home_dir().join(DEFAULT_LIBRARY_FOLDER)
}

/// ~/.wardrobe/config.json
pub fn config_path() -> PathBuf {
    home_dir().join(APP_DIR).join(CONFIG_FILENAME)
}

impl AppConfig {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            WardrobeError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply WARDROBE_* overrides. A Supabase URL switches the backend to Supabase.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("WARDROBE_SUPABASE_URL") {
            let (anon_key, bucket, table) = match &self.backend {
                BackendConfig::Supabase { anon_key, bucket, table, .. } => {
                    (anon_key.clone(), bucket.clone(), table.clone())
                }
                BackendConfig::Local { .. } => (String::new(), default_bucket(), default_table()),
            };
            self.backend = BackendConfig::Supabase { url, anon_key, bucket, table };
        }

        match &mut self.backend {
            BackendConfig::Supabase { anon_key, bucket, .. } => {
                if let Some(key) = var("WARDROBE_SUPABASE_ANON_KEY") {
                    *anon_key = key;
                }
                if let Some(b) = var("WARDROBE_BUCKET") {
                    *bucket = b;
                }
            }
            BackendConfig::Local { library_root } => {
                if let Some(root) = var("WARDROBE_LIBRARY") {
                    *library_root = PathBuf::from(root);
                }
            }
        }

        if let Some(url) = var("WARDROBE_ADVICE_URL") {
            self.styling.advice_url = Some(url);
        }
        if let Some(url) = var("WARDROBE_IMAGE_URL") {
            self.styling.image_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let BackendConfig::Supabase { url, anon_key, bucket, .. } = &self.backend {
            if url.trim().is_empty() {
                return Err(WardrobeError::Config("Supabase URL is required".to_string()));
            }
            if anon_key.trim().is_empty() {
                return Err(WardrobeError::Config("Supabase anon key is required".to_string()));
            }
            if bucket.trim().is_empty() {
                return Err(WardrobeError::Config("Storage bucket name is empty".to_string()));
            }
        }
        if self.gallery.strip_limit == 0 {
            return Err(WardrobeError::Config("gallery.stripLimit must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Styling endpoints: explicit URLs win, otherwise the Supabase functions.
    pub fn styling_endpoints(&self) -> Option<StylingEndpoints> {
        let functions_base = match &self.backend {
            BackendConfig::Supabase { url, .. } => {
                Some(format!("{}/functions/v1", url.trim_end_matches('/')))
            }
            BackendConfig::Local { .. } => None,
        };

        let advice_url = self
            .styling
            .advice_url
            .clone()
            .or_else(|| functions_base.as_ref().map(|b| format!("{}/{}", b, ADVICE_FUNCTION)))?;
        let image_url = self
            .styling
            .image_url
            .clone()
            .or_else(|| functions_base.as_ref().map(|b| format!("{}/{}", b, IMAGE_FUNCTION)))?;

        Some(StylingEndpoints { advice_url, image_url })
    }
}
