use crate::events::EngineEvent;

use super::LayoutEngine;

/// Single source of truth for which node is selected and which is hovered.
/// Both are independent of pin state and of each other.
#[derive(Default)]
pub(super) struct SelectionState {
    selected: Option<String>,
    hovered: Option<String>,
}

impl LayoutEngine {
    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected.as_deref()
    }

    pub fn hovered_id(&self) -> Option<&str> {
        self.selection.hovered.as_deref()
    }

    /// Sets the selection. Unknown ids are ignored; an unchanged selection
    /// emits nothing. The change event carries the full node record.
    pub fn set_selected(&mut self, id: Option<&str>) {
        let next = match id {
            Some(id) if self.index_by_id.contains_key(id) => Some(id.to_owned()),
            Some(_) => return,
            None => None,
        };
        if self.selection.selected == next {
            return;
        }

        self.selection.selected = next;
        let record = self
            .selection
            .selected
            .clone()
            .and_then(|id| self.node(&id));
        self.events.emit(&EngineEvent::SelectionChanged(record));
    }

    pub fn toggle_selected(&mut self, id: &str) {
        if self.selected_id() == Some(id) {
            self.set_selected(None);
        } else {
            self.set_selected(Some(id));
        }
    }

    pub fn clear_selection(&mut self) {
        self.set_selected(None);
    }

    /// Sets the hovered node with the same conventions as selection.
    pub fn set_hovered(&mut self, id: Option<&str>) {
        let next = match id {
            Some(id) if self.index_by_id.contains_key(id) => Some(id.to_owned()),
            Some(_) => return,
            None => None,
        };
        if self.selection.hovered == next {
            return;
        }

        self.selection.hovered = next;
        let record = self
            .selection
            .hovered
            .clone()
            .and_then(|id| self.node(&id));
        self.events.emit(&EngineEvent::HoverChanged(record));
    }
}
