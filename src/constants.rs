// Wardrobe Constants
// Values shared by the backends, the upload pipeline and the presentation layer.

// App folders
pub const APP_DIR: &str = ".wardrobe";
pub const CONFIG_FILENAME: &str = "config.json";
pub const DB_FILENAME: &str = "wardrobe.db";
pub const OBJECTS_FOLDER: &str = "objects";

// Remote backend defaults
pub const DEFAULT_BUCKET: &str = "user-images";
pub const DEFAULT_ITEMS_TABLE: &str = "user_items";
pub const ADVICE_FUNCTION: &str = "get-styling-advice";
pub const IMAGE_FUNCTION: &str = "get-styling-image";
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 120;

// Upload record defaults
pub const DEFAULT_ITEM_NAME: &str = "New Item";
pub const DEFAULT_ITEM_DESCRIPTION: &str = "Item uploaded from mobile app";

// Media kinds
pub const IMAGE_EXTENSION: &str = "png";
pub const IMAGE_CONTENT_TYPE: &str = "image/png";
pub const VIDEO_EXTENSION: &str = "mp4";
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "m4v", "webm", "avi", "3gp"];

// Gallery
pub const RECENT_STRIP_LIMIT: usize = 5;

// Styling
pub const ADVICE_PLACEHOLDER: &str = "No styling advice was returned. Try again with different styles.";

// Form validation
pub const MIN_PASSWORD_LEN: usize = 6;

// Keychain
pub const KEYCHAIN_SERVICE: &str = "com.wardrobe.app";
pub const KEYCHAIN_SESSION_ACCOUNT: &str = "session";

// Events emitted to the desktop frontend
pub const EVENT_UPLOAD_PROGRESS: &str = "upload-progress";
pub const EVENT_AUTH_CHANGED: &str = "auth-changed";
