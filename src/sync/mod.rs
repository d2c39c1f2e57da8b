// Wardrobe - Item Sync
// View-owned item list and selection, kept current by the sync engine.

pub mod engine;
pub mod selection;
pub mod state;

pub use engine::ItemSyncEngine;
pub use selection::reconcile;
pub use state::{RefreshOutcome, RefreshTicket, WardrobeState};
