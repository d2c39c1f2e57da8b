// Session persistence in the OS keychain
// The serialized session lives under one keychain account so it survives restarts.

use crate::constants::{KEYCHAIN_SERVICE, KEYCHAIN_SESSION_ACCOUNT};
use crate::error::{Result, WardrobeError};
use super::Session;

fn entry() -> Result<keyring::Entry> {
    keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_SESSION_ACCOUNT)
        .map_err(|e| WardrobeError::Other(format!("Keychain unavailable: {}", e)))
}

/// Load the stored session, if any. Unreadable entries are treated as absent.
pub fn load_session() -> Option<Session> {
    let entry = match entry() {
        Ok(entry) => entry,
        Err(e) => {
            log::warn!("{}", e);
            return None;
        }
    };
    session_from(entry.get_password())
}

fn session_from(stored: keyring::Result<String>) -> Option<Session> {
    let raw = match stored {
        Ok(raw) => raw,
        Err(keyring::Error::NoEntry) => return None,
        Err(e) => {
            log::warn!("Failed to read stored session: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("Ignoring unreadable stored session: {}", e);
            None
        }
    }
}

pub fn save_session(session: &Session) -> Result<()> {
    let raw = serde_json::to_string(session)?;
    entry()?
        .set_password(&raw)
        .map_err(|e| WardrobeError::Other(format!("Failed to store session: {}", e)))
}

pub fn clear_session() -> Result<()> {
    match entry()?.delete_password() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(WardrobeError::Other(format!("Failed to remove session: {}", e))),
    }
}
