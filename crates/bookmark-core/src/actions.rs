use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{ParseNameError, StoreError, StoreResult};
use crate::item::{Item, ItemId, ItemKind};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextAction {
    Open,
    OpenNewTab,
    Rename,
    Delete,
    Copy,
    Cut,
}

impl ContextAction {
    pub const ALL: [ContextAction; 6] = [
        ContextAction::Open,
        ContextAction::OpenNewTab,
        ContextAction::Rename,
        ContextAction::Delete,
        ContextAction::Copy,
        ContextAction::Cut,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContextAction::Open => "open",
            ContextAction::OpenNewTab => "open-new-tab",
            ContextAction::Rename => "rename",
            ContextAction::Delete => "delete",
            ContextAction::Copy => "copy",
            ContextAction::Cut => "cut",
        }
    }
}

impl fmt::Display for ContextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextAction {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| ParseNameError::new("context action", s))
    }
}

/// One context-menu entry as the presentation layer draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub action: ContextAction,
    pub icon: &'static str,
    pub text: &'static str,
    pub shortcut: Option<&'static str>,
}

impl MenuOption {
    const fn new(
        action: ContextAction,
        icon: &'static str,
        text: &'static str,
        shortcut: &'static str,
    ) -> Self {
        Self {
            action,
            icon,
            text,
            shortcut: Some(shortcut),
        }
    }
}

/// Context-menu entries for `item`. With more than one item selected only
/// the bulk actions are offered.
pub fn menu_options(item: &Item, selected: usize) -> Vec<MenuOption> {
    let mut options = Vec::with_capacity(6);

    if selected <= 1 {
        if item.is_folder() {
            options.push(MenuOption::new(ContextAction::Open, "FolderOpen", "Open", "Enter"));
        } else {
            options.push(MenuOption::new(
                ContextAction::Open,
                "ExternalLink",
                "Open Link",
                "Enter",
            ));
            options.push(MenuOption::new(
                ContextAction::OpenNewTab,
                "ExternalLink",
                "Open in New Tab",
                "Ctrl+Enter",
            ));
        }
        options.push(MenuOption::new(ContextAction::Rename, "Pencil", "Rename", "F2"));
    }

    options.push(MenuOption::new(ContextAction::Copy, "Copy", "Copy", "Ctrl+C"));
    options.push(MenuOption::new(ContextAction::Cut, "Scissors", "Cut", "Ctrl+X"));
    options.push(MenuOption::new(ContextAction::Delete, "Trash2", "Delete", "Delete"));
    options
}

/// What a dispatched action did, or what the presentation layer should do
/// next. The engine never opens URLs itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ActionOutcome {
    Navigated { folder: ItemId },
    ConfirmOpen { id: ItemId, url: String },
    OpenInNewTab { id: ItemId, url: String },
    RenameRequested { id: ItemId },
    Deleted { count: usize },
    Copied { count: usize },
    Cut { count: usize },
    Nothing,
}

impl Session {
    pub fn menu_options(&self, id: &str) -> StoreResult<Vec<MenuOption>> {
        let item = self
            .store()
            .get(id)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?;
        Ok(menu_options(item, self.selection().len()))
    }

    /// Runs a context-menu action against `target`, or against the
    /// selection for the bulk actions when anything is selected.
    #[instrument(skip(self))]
    pub fn dispatch(
        &mut self,
        action: ContextAction,
        target: Option<&str>,
    ) -> StoreResult<ActionOutcome> {
        let item = match target {
            Some(id) => Some(
                self.store()
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?,
            ),
            None => None,
        };

        if item.is_none() && self.selection().is_empty() {
            debug!("nothing to act on");
            return Ok(ActionOutcome::Nothing);
        }

        let outcome = match action {
            ContextAction::Open => match item {
                Some(item) if item.is_folder() => {
                    self.navigate_to(item.id.as_str())?;
                    ActionOutcome::Navigated { folder: item.id }
                }
                Some(Item {
                    id,
                    kind: ItemKind::Bookmark { url },
                    ..
                }) => ActionOutcome::ConfirmOpen { id, url },
                _ => ActionOutcome::Nothing,
            },
            ContextAction::OpenNewTab => match item {
                Some(Item {
                    id,
                    kind: ItemKind::Bookmark { url },
                    ..
                }) => ActionOutcome::OpenInNewTab { id, url },
                _ => ActionOutcome::Nothing,
            },
            ContextAction::Rename => match item {
                Some(item) => ActionOutcome::RenameRequested { id: item.id },
                None => ActionOutcome::Nothing,
            },
            ContextAction::Delete => {
                let ids = self.bulk_targets(item.as_ref());
                ActionOutcome::Deleted {
                    count: self.delete(&ids)?,
                }
            }
            ContextAction::Copy => {
                let ids = self.bulk_targets(item.as_ref());
                ActionOutcome::Copied {
                    count: self.copy_items(&ids),
                }
            }
            ContextAction::Cut => {
                let ids = self.bulk_targets(item.as_ref());
                ActionOutcome::Cut {
                    count: self.cut_items(&ids),
                }
            }
        };

        debug!(?outcome, "dispatched context action");
        Ok(outcome)
    }

    fn bulk_targets(&self, item: Option<&Item>) -> Vec<ItemId> {
        if !self.selection().is_empty() {
            return self.selection().ids();
        }
        item.map(|item| vec![item.id.clone()]).unwrap_or_default()
    }
}
