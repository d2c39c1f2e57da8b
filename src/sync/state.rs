// Wardrobe view state
// Owned by one view instance. Every transition is a plain method so the
// refresh ordering and selection rules can be tested without any I/O.

use serde::Serialize;

use crate::error::{Result, WardrobeError};
use crate::gallery::{GalleryGesture, GestureEffect};
use crate::items::{Item, ItemId, ItemKey};
use crate::styling::StylingResult;
use super::selection::reconcile;

/// Issued per refresh, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A refresh issued later has already been applied, or the list was
    /// changed locally after this refresh was issued
    Stale,
    /// The view is gone; nothing was applied
    Unmounted,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeState {
    items: Vec<Item>,
    selection: Option<Item>,
    uploading: bool,
    delete_mode: bool,
    styling: Option<StylingResult>,
    last_error: Option<String>,
    #[serde(skip)]
    next_ticket: u64,
    #[serde(skip)]
    newest_applied: Option<RefreshTicket>,
    /// Tickets issued up to here predate a local change to the list.
    #[serde(skip)]
    mutation_floor: u64,
    #[serde(skip)]
    unmounted: bool,
}

impl WardrobeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn selection(&self) -> Option<&Item> {
        self.selection.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn delete_mode(&self) -> bool {
        self.delete_mode
    }

    pub fn styling(&self) -> Option<&StylingResult> {
        self.styling.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmounted
    }

    fn replace_items(&mut self, items: Vec<Item>) {
        self.selection = reconcile(self.selection.as_ref(), &items);
        self.items = items;
    }

    /// Refreshes already in flight fetched the list before this change.
    fn mark_local_change(&mut self) {
        self.mutation_floor = self.next_ticket;
    }

    // ----- Refresh -----

    pub fn refresh_issued(&mut self) -> RefreshTicket {
        self.next_ticket += 1;
        RefreshTicket(self.next_ticket)
    }

    fn is_stale(&self, ticket: RefreshTicket) -> bool {
        ticket.0 <= self.mutation_floor
            || matches!(self.newest_applied, Some(newest) if ticket < newest)
    }

    pub fn refresh_applied(&mut self, ticket: RefreshTicket, items: Vec<Item>) -> RefreshOutcome {
        if self.unmounted {
            return RefreshOutcome::Unmounted;
        }
        if self.is_stale(ticket) {
            log::debug!("Discarding stale refresh {:?}", ticket);
            return RefreshOutcome::Stale;
        }
        self.newest_applied = Some(ticket);
        self.last_error = None;
        self.replace_items(items);
        RefreshOutcome::Applied
    }

    /// A failed refresh keeps the displayed list and records the message.
    pub fn refresh_failed(&mut self, ticket: RefreshTicket, message: String) -> RefreshOutcome {
        if self.unmounted {
            return RefreshOutcome::Unmounted;
        }
        if self.is_stale(ticket) {
            return RefreshOutcome::Stale;
        }
        self.last_error = Some(message);
        RefreshOutcome::Applied
    }

    // ----- Upload -----

    /// Raise the upload-in-progress flag. Only one upload at a time.
    pub fn upload_started(&mut self) -> Result<()> {
        if self.uploading {
            return Err(WardrobeError::Validation("Upload already in progress".to_string()));
        }
        self.uploading = true;
        self.last_error = None;
        Ok(())
    }

    /// Show the new item right away; the following refresh replaces the list.
    pub fn upload_succeeded(&mut self, item: Item) {
        self.uploading = false;
        if self.unmounted {
            return;
        }
        self.mark_local_change();
        if !self.items.iter().any(|i| i.key() == item.key()) {
            let mut items = Vec::with_capacity(self.items.len() + 1);
            items.push(item);
            items.extend(self.items.drain(..));
            self.replace_items(items);
        }
    }

    pub fn upload_failed(&mut self, message: String) {
        self.uploading = false;
        if !self.unmounted {
            self.last_error = Some(message);
        }
    }

    /// Picker dismissed; not an error.
    pub fn upload_cancelled(&mut self) {
        self.uploading = false;
    }

    // ----- Items and selection -----

    pub fn item_deleted(&mut self, id: ItemId) {
        if self.unmounted {
            return;
        }
        self.mark_local_change();
        let items: Vec<Item> = self.items.iter().filter(|i| i.id != id).cloned().collect();
        self.replace_items(items);
    }

    /// Select by key. Returns false when no listed item has that key.
    pub fn item_selected(&mut self, key: &ItemKey) -> bool {
        match self.items.iter().find(|i| &i.key() == key) {
            Some(item) => {
                self.selection = Some(item.clone());
                true
            }
            None => false,
        }
    }

    pub fn delete_mode_toggled(&mut self) {
        self.delete_mode = !self.delete_mode;
    }

    pub fn delete_mode_exited(&mut self) {
        self.delete_mode = false;
    }

    pub fn styling_received(&mut self, result: StylingResult) {
        if !self.unmounted {
            self.styling = Some(result);
        }
    }

    /// After this every late result is dropped without error.
    pub fn unmounted(&mut self) {
        self.unmounted = true;
        self.delete_mode = false;
    }

    // ----- Gestures -----

    pub fn gesture(&mut self, gesture: GalleryGesture) -> GestureEffect {
        match gesture {
            GalleryGesture::LongPress(_) => {
                self.delete_mode_toggled();
                GestureEffect::None
            }
            GalleryGesture::TapOutside => {
                self.delete_mode_exited();
                GestureEffect::None
            }
            GalleryGesture::TapDelete(id) => {
                if self.delete_mode && self.items.iter().any(|i| i.id == id) {
                    GestureEffect::Delete(id)
                } else {
                    GestureEffect::None
                }
            }
            GalleryGesture::TapItem(id) => {
                if !self.delete_mode {
                    if let Some(key) = self.items.iter().find(|i| i.id == id).map(Item::key) {
                        self.item_selected(&key);
                    }
                }
                GestureEffect::None
            }
        }
    }
}
