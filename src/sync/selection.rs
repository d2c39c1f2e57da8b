// Selection reconciliation
// Runs after every list replacement so the selection never dangles.

use crate::items::Item;

/// Keep `current` if its key is still in `list`, otherwise fall back to the
/// head of the list (most recent), or None for an empty list.
pub fn reconcile(current: Option<&Item>, list: &[Item]) -> Option<Item> {
    if let Some(selected) = current {
        let key = selected.key();
        if list.iter().any(|item| item.key() == key) {
            return Some(selected.clone());
        }
    }
    list.first().cloned()
}
