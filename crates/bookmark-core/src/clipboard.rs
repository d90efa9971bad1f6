use std::collections::BTreeSet;

use serde::Serialize;

use crate::item::{ItemId, Subtree};

/// Multi-select state for the items currently on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ItemId>,
}

impl Selection {
    /// Flips membership; returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: &ItemId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids = ids.into_iter().collect();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardAction {
    Cut,
    Copy,
}

impl ClipboardAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ClipboardAction::Cut => "cut",
            ClipboardAction::Copy => "copy",
        }
    }
}

/// Pending cut or copy.
///
/// A cut only remembers which items to move; a copy owns deep snapshots so
/// a later paste reproduces the tree as it was when copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Clipboard {
    #[default]
    Empty,
    Cut(Vec<ItemId>),
    Copy(Vec<Subtree>),
}

impl Clipboard {
    pub fn action(&self) -> Option<ClipboardAction> {
        match self {
            Clipboard::Empty => None,
            Clipboard::Cut(_) => Some(ClipboardAction::Cut),
            Clipboard::Copy(_) => Some(ClipboardAction::Copy),
        }
    }

    /// Ids of the top-level clipboard entries.
    pub fn ids(&self) -> Vec<ItemId> {
        match self {
            Clipboard::Empty => vec![],
            Clipboard::Cut(ids) => ids.clone(),
            Clipboard::Copy(snapshots) => snapshots
                .iter()
                .map(|snapshot| snapshot.item().id.clone())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Clipboard::Empty => 0,
            Clipboard::Cut(ids) => ids.len(),
            Clipboard::Copy(snapshots) => snapshots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `id` is waiting to be moved by a cut.
    pub fn is_cut(&self, id: &str) -> bool {
        matches!(self, Clipboard::Cut(ids) if ids.iter().any(|cut| cut.as_str() == id))
    }
}

#[cfg(test)]
mod tests {
    use super::{Clipboard, ClipboardAction, Selection};
    use crate::item::ItemId;

    #[test]
    fn toggle_flips_membership() {
        let mut selection = Selection::default();
        let id = ItemId::new("docs");
        assert!(selection.toggle(&id));
        assert!(selection.contains("docs"));
        assert!(!selection.toggle(&id));
        assert!(selection.is_empty());
    }

    #[test]
    fn empty_cut_counts_as_empty() {
        let clipboard = Clipboard::Cut(vec![]);
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.action(), Some(ClipboardAction::Cut));
        assert!(!clipboard.is_cut("docs"));
        assert!(Clipboard::Cut(vec![ItemId::new("docs")]).is_cut("docs"));
    }
}
