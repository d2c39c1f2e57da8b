// Wardrobe - Gallery
// Pure rendering of the view state into strip/grid card models.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;
use crate::sync::WardrobeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    /// Horizontal recent strip, most recent first, capped
    Strip,
    /// Wrapping grid of every item
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum GalleryGesture {
    LongPress(ItemId),
    TapItem(ItemId),
    TapDelete(ItemId),
    TapOutside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum GestureEffect {
    None,
    Delete(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButton {
    pub enabled: bool,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCard {
    pub id: ItemId,
    pub image_url: String,
    pub name: String,
    pub selected: bool,
    pub show_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryModel {
    pub layout: GalleryLayout,
    pub add_button: AddButton,
    pub cards: Vec<ItemCard>,
    /// Total items, including any cut from a strip
    pub total: usize,
    /// Full-page overlay that exits delete mode when tapped
    pub dismiss_overlay: bool,
}

pub fn render(state: &WardrobeState, layout: GalleryLayout, strip_limit: usize) -> GalleryModel {
    let selected_key = state.selection().map(|s| s.key());
    let limit = match layout {
        GalleryLayout::Strip => strip_limit,
        GalleryLayout::Grid => usize::MAX,
    };

    let cards = state
        .items()
        .iter()
        .take(limit)
        .map(|item| ItemCard {
            id: item.id,
            image_url: item.image_url.clone(),
            name: item.name.clone(),
            selected: selected_key.as_ref() == Some(&item.key()),
            show_delete: state.delete_mode(),
        })
        .collect();

    GalleryModel {
        layout,
        add_button: AddButton {
            enabled: !state.is_uploading(),
            busy: state.is_uploading(),
        },
        cards,
        total: state.items().len(),
        dismiss_overlay: state.delete_mode(),
    }
}

/// Plain-text rendering for terminals.
pub fn render_text(model: &GalleryModel) -> String {
    let mut out = String::new();
    let add = if model.add_button.busy { "[+ uploading...]" } else { "[+ add item]" };
    out.push_str(add);
    out.push('\n');

    if model.cards.is_empty() {
        out.push_str("  (no items yet)\n");
        return out;
    }

    for card in &model.cards {
        let marker = if card.selected { '*' } else { ' ' };
        let delete = if card.show_delete { "  [x]" } else { "" };
        out.push_str(&format!(
            "{} #{:<5} {}  {}{}\n",
            marker, card.id, card.name, card.image_url, delete
        ));
    }

    let hidden = model.total.saturating_sub(model.cards.len());
    if hidden > 0 {
        out.push_str(&format!("  ... {} more (use --all)\n", hidden));
    }
    if model.dismiss_overlay {
        out.push_str("  delete mode: tap outside to finish\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::items::Item;

    fn item(id: i64) -> Item {
        Item {
            id,
            owner_id: "u1".into(),
            name: format!("item {}", id),
            description: String::new(),
            image_url: format!("u1/{}.png", id),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(id),
        }
    }

    fn state_with(ids: &[i64]) -> WardrobeState {
        let mut state = WardrobeState::new();
        let ticket = state.refresh_issued();
        state.refresh_applied(ticket, ids.iter().map(|id| item(*id)).collect());
        state
    }

    #[test]
    fn test_strip_is_capped_grid_is_not() {
        let state = state_with(&[7, 6, 5, 4, 3, 2, 1]);
        let strip = render(&state, GalleryLayout::Strip, 5);
        assert_eq!(strip.cards.len(), 5);
        assert_eq!(strip.cards[0].id, 7);
        assert_eq!(strip.total, 7);

        let grid = render(&state, GalleryLayout::Grid, 5);
        assert_eq!(grid.cards.len(), 7);
    }

    #[test]
    fn test_selected_card_marked() {
        let state = state_with(&[2, 1]);
        let model = render(&state, GalleryLayout::Grid, 5);
        assert!(model.cards[0].selected);
        assert!(!model.cards[1].selected);
    }

    #[test]
    fn test_delete_mode_shows_glyphs_on_every_card() {
        let mut state = state_with(&[2, 1]);
        state.gesture(GalleryGesture::LongPress(1));
        let model = render(&state, GalleryLayout::Grid, 5);
        assert!(model.cards.iter().all(|c| c.show_delete));
        assert!(model.dismiss_overlay);
    }

    #[test]
    fn test_add_button_disabled_while_uploading() {
        let mut state = state_with(&[]);
        state.upload_started().unwrap();
        let model = render(&state, GalleryLayout::Strip, 5);
        assert!(!model.add_button.enabled);
        assert!(model.add_button.busy);
        assert!(render_text(&model).contains("uploading"));
    }

    #[test]
    fn test_render_text_lists_hidden_count() {
        let state = state_with(&[3, 2, 1]);
        let text = render_text(&render(&state, GalleryLayout::Strip, 2));
        assert!(text.contains("* #3"));
        assert!(text.contains("1 more"));
    }
}
