use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::clipboard::{Clipboard, ClipboardAction, Selection};
use crate::error::{StoreError, StoreResult};
use crate::hooks::StoreEvent;
use crate::item::{Item, ItemId};
use crate::link::{FaviconResolver, TemplateFavicons};
use crate::store::ItemStore;
use crate::view::{self, SearchFilter, SortDirection, SortMode};

/// Initial view preferences for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSettings {
    pub sort_mode: SortMode,
    pub sort_direction: SortDirection,
    pub search_filter: SearchFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteOutcome {
    pub action: ClipboardAction,
    /// Moved ids for a cut, ids of the new top-level copies for a copy.
    pub ids: Vec<ItemId>,
}

/// One UI session over an [`ItemStore`]: where the user is, what is
/// selected, what sits on the clipboard and how the listing is shown.
#[derive(Debug)]
pub struct Session {
    store: ItemStore,
    current: ItemId,
    selection: Selection,
    clipboard: Clipboard,
    search_query: String,
    search_filter: SearchFilter,
    sort_mode: SortMode,
    sort_direction: SortDirection,
    favicons: Box<dyn FaviconResolver>,
}

impl Session {
    pub fn new(store: ItemStore) -> Self {
        Self::with_settings(store, ViewSettings::default(), Box::new(TemplateFavicons::default()))
    }

    pub fn with_settings(
        store: ItemStore,
        settings: ViewSettings,
        favicons: Box<dyn FaviconResolver>,
    ) -> Self {
        Self {
            store,
            current: ItemId::root(),
            selection: Selection::default(),
            clipboard: Clipboard::default(),
            search_query: String::new(),
            search_filter: settings.search_filter,
            sort_mode: settings.sort_mode,
            sort_direction: settings.sort_direction,
            favicons,
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.store.subscribe(listener);
    }

    // navigation

    pub fn current_folder_id(&self) -> &ItemId {
        &self.current
    }

    pub fn current_folder(&self) -> Option<&Item> {
        self.store.get(self.current.as_str())
    }

    /// Names of the folders from the root down to the current one.
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.store
            .path(self.current.as_str())
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    pub fn navigate_to(&mut self, folder: &str) -> StoreResult<()> {
        let item = self
            .store
            .get(folder)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(folder)))?;
        if !item.is_folder() {
            return Err(StoreError::NotAFolder(ItemId::from(folder)));
        }
        self.current = item.id.clone();
        self.selection.clear();
        debug!(folder, "navigated");
        Ok(())
    }

    /// Goes to the parent folder; a no-op at the root.
    pub fn navigate_up(&mut self) -> StoreResult<()> {
        let parent = self
            .current_folder()
            .and_then(|folder| folder.parent_id.clone());
        match parent {
            Some(parent) => self.navigate_to(parent.as_str()),
            None => Ok(()),
        }
    }

    pub fn can_navigate_up(&self) -> bool {
        !self.current.is_root() && !self.is_searching()
    }

    // items

    pub fn create_folder(&mut self, name: &str) -> StoreResult<Item> {
        let parent = self.current.clone();
        self.store.create_folder(parent.as_str(), name)
    }

    pub fn create_bookmark(&mut self, name: &str, url: &str) -> StoreResult<Item> {
        let parent = self.current.clone();
        self.store.create_bookmark(parent.as_str(), name, url)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> StoreResult<()> {
        self.store.rename(id, new_name)
    }

    /// Recursive delete; clears the selection and falls back to the root if
    /// the current folder went away.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn delete(&mut self, ids: &[ItemId]) -> StoreResult<usize> {
        let removed = self.store.delete(ids)?;
        self.selection.clear();
        if !self.store.contains(self.current.as_str()) {
            info!(folder = %self.current, "current folder deleted; returning to root");
            self.current = ItemId::root();
        }
        Ok(removed)
    }

    pub fn move_item(&mut self, id: &str, new_parent: &str) -> StoreResult<()> {
        self.store.move_item(id, new_parent)
    }

    pub fn copy_item(&mut self, id: &str, new_parent: &str) -> StoreResult<ItemId> {
        self.store.copy_item(id, new_parent)
    }

    /// What the main pane shows: search hits while a query is active,
    /// otherwise the sorted children of the current folder.
    pub fn current_items(&self) -> Vec<&Item> {
        if self.is_searching() {
            return self.search_results();
        }
        view::listing(
            &self.store,
            self.current.as_str(),
            self.sort_mode,
            self.sort_direction,
        )
        .unwrap_or_default()
    }

    pub fn favicon_url(&self, id: &str) -> String {
        self.store
            .get(id)
            .and_then(Item::url)
            .map(|url| self.favicons.favicon_url(url))
            .unwrap_or_default()
    }

    // selection

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Only items in [`Session::current_items`] can be selected.
    pub fn toggle_selection(&mut self, id: &str) -> StoreResult<bool> {
        if !self.store.contains(id) {
            return Err(StoreError::NotFound(ItemId::from(id)));
        }
        let visible = self
            .current_items()
            .into_iter()
            .find(|item| item.id.as_str() == id)
            .map(|item| item.id.clone())
            .ok_or_else(|| StoreError::NotVisible(ItemId::from(id)))?;
        Ok(self.selection.toggle(&visible))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selects every direct child of the current folder.
    pub fn select_all(&mut self) {
        let ids: Vec<ItemId> = self
            .store
            .children(self.current.as_str())
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        self.selection.replace(ids);
    }

    // clipboard

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn copy_items(&mut self, ids: &[ItemId]) -> usize {
        let snapshots: Vec<_> = ids
            .iter()
            .filter_map(|id| self.store.snapshot(id.as_str()).ok())
            .collect();
        let count = snapshots.len();
        self.clipboard = if snapshots.is_empty() {
            Clipboard::Empty
        } else {
            Clipboard::Copy(snapshots)
        };
        self.selection.clear();
        debug!(count, "copied to clipboard");
        count
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn cut_items(&mut self, ids: &[ItemId]) -> usize {
        let live: Vec<ItemId> = ids
            .iter()
            .filter(|id| self.store.contains(id.as_str()))
            .cloned()
            .collect();
        let count = live.len();
        self.clipboard = if live.is_empty() {
            Clipboard::Empty
        } else {
            Clipboard::Cut(live)
        };
        self.selection.clear();
        debug!(count, "cut to clipboard");
        count
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = Clipboard::Empty;
    }

    /// Applies the clipboard to the current folder. Returns `None` when the
    /// clipboard is empty. On error nothing changes, clipboard included.
    #[instrument(skip(self))]
    pub fn paste(&mut self) -> StoreResult<Option<PasteOutcome>> {
        if self.clipboard.is_empty() {
            return Ok(None);
        }

        let target = self.current.clone();
        let outcome = match &self.clipboard {
            Clipboard::Empty => return Ok(None),
            Clipboard::Cut(ids) => {
                let live: Vec<ItemId> = ids
                    .iter()
                    .filter(|id| self.store.contains(id.as_str()))
                    .cloned()
                    .collect();
                if live.len() < ids.len() {
                    warn!(
                        skipped = ids.len() - live.len(),
                        "cut items deleted before paste"
                    );
                }
                for id in &live {
                    self.store.check_move(id.as_str(), target.as_str())?;
                }
                for id in &live {
                    self.store.move_item(id.as_str(), target.as_str())?;
                }
                PasteOutcome {
                    action: ClipboardAction::Cut,
                    ids: live,
                }
            }
            Clipboard::Copy(snapshots) => {
                if let Some(folder) = self.store.get(target.as_str()) {
                    if !folder.is_folder() {
                        return Err(StoreError::NotAFolder(target));
                    }
                } else {
                    return Err(StoreError::NotFound(target));
                }
                let mut copies = Vec::with_capacity(snapshots.len());
                for snapshot in snapshots {
                    copies.push(self.store.insert_snapshot(snapshot, target.as_str())?);
                }
                PasteOutcome {
                    action: ClipboardAction::Copy,
                    ids: copies,
                }
            }
        };

        self.clipboard = Clipboard::Empty;
        info!(
            action = outcome.action.as_str(),
            count = outcome.ids.len(),
            into = %target,
            "pasted"
        );
        Ok(Some(outcome))
    }

    // search and sort

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn is_searching(&self) -> bool {
        !self.search_query.trim().is_empty()
    }

    pub fn search_filter(&self) -> SearchFilter {
        self.search_filter
    }

    pub fn set_search_filter(&mut self, filter: SearchFilter) {
        self.search_filter = filter;
    }

    pub fn search_results(&self) -> Vec<&Item> {
        view::search(&self.store, &self.search_query, self.search_filter)
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn toggle_sort_direction(&mut self) -> SortDirection {
        self.sort_direction = self.sort_direction.toggle();
        self.sort_direction
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::clipboard::ClipboardAction;
    use crate::error::StoreError;
    use crate::item::ItemId;
    use crate::test_support::seeded_store;
    use crate::view::{SearchFilter, SortMode};

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|id| ItemId::from(*id)).collect()
    }

    fn names(session: &Session) -> Vec<String> {
        session
            .current_items()
            .into_iter()
            .map(|item| item.name.clone())
            .collect()
    }

    #[test]
    fn navigation_clears_selection() {
        let mut session = Session::new(seeded_store());
        session.toggle_selection("music").expect("select");
        session.navigate_to("docs").expect("navigate");

        assert!(session.selection().is_empty());
        assert_eq!(session.breadcrumbs(), vec!["Documents"]);
        assert!(session.can_navigate_up());

        session.navigate_up().expect("up");
        assert_eq!(session.current_folder_id().as_str(), "root");
        assert!(!session.can_navigate_up());
        session.navigate_up().expect("up at root is a no-op");

        assert_eq!(
            session.navigate_to("github_bm"),
            Err(StoreError::NotAFolder(ItemId::new("github_bm")))
        );
    }

    #[test]
    fn creates_into_current_folder() {
        let mut session = Session::new(seeded_store());
        session.navigate_to("docs").expect("navigate");
        let bookmark = session
            .create_bookmark("Handbook", "handbook.test")
            .expect("create");
        assert_eq!(bookmark.parent_id, Some(ItemId::new("docs")));
        assert_eq!(names(&session), vec!["Work Projects", "Handbook"]);
    }

    #[test]
    fn cut_paste_moves_with_descendants() {
        let mut session = Session::new(seeded_store());
        assert_eq!(session.cut_items(&ids(&["docs"])), 1);
        session.navigate_to("music").expect("navigate");

        let outcome = session.paste().expect("paste").expect("non-empty clipboard");
        assert_eq!(outcome.action, ClipboardAction::Cut);
        assert_eq!(outcome.ids, ids(&["docs"]));

        let store = session.store();
        assert_eq!(
            store.get("docs").and_then(|i| i.parent_id.clone()),
            Some(ItemId::new("music"))
        );
        assert_eq!(
            store.get("work_docs").and_then(|i| i.parent_id.clone()),
            Some(ItemId::new("docs"))
        );
        assert!(session.clipboard().is_empty());
        store.validate().expect("valid");
    }

    #[test]
    fn cut_paste_into_own_subtree_is_rejected() {
        let mut session = Session::new(seeded_store());
        session.cut_items(&ids(&["music", "docs"]));
        session.navigate_to("work_docs").expect("navigate");

        let revision = session.store().revision();
        assert_eq!(
            session.paste(),
            Err(StoreError::CycleRejected {
                id: ItemId::new("docs"),
                target: ItemId::new("work_docs"),
            })
        );
        assert_eq!(session.store().revision(), revision);
        assert_eq!(
            session.store().get("music").and_then(|i| i.parent_id.clone()),
            Some(ItemId::root())
        );
        assert_eq!(session.clipboard().len(), 2);
    }

    #[test]
    fn cut_paste_into_origin_is_a_noop_move() {
        let mut session = Session::new(seeded_store());
        session.cut_items(&ids(&["music"]));
        let revision = session.store().revision();
        let outcome = session.paste().expect("paste").expect("outcome");
        assert_eq!(outcome.ids, ids(&["music"]));
        assert_eq!(session.store().revision(), revision);
    }

    #[test]
    fn selection_is_limited_to_visible_items() {
        let mut session = Session::new(seeded_store());
        assert_eq!(
            session.toggle_selection("work_docs"),
            Err(StoreError::NotVisible(ItemId::new("work_docs")))
        );
        assert_eq!(
            session.toggle_selection("ghost"),
            Err(StoreError::NotFound(ItemId::new("ghost")))
        );
        assert!(session.selection().is_empty());

        session.set_search_query("work");
        assert_eq!(session.toggle_selection("work_docs"), Ok(true));
        assert_eq!(session.toggle_selection("work_docs"), Ok(false));
    }

    #[test]
    fn clear_clipboard_drops_pending_cut() {
        let mut session = Session::new(seeded_store());
        session.cut_items(&ids(&["music"]));
        session.clear_clipboard();
        assert!(session.clipboard().is_empty());
        assert_eq!(session.paste(), Ok(None));
    }

    #[test]
    fn deep_folder_chain_copies_and_pastes() {
        let mut session = Session::new(seeded_store());
        session.navigate_to("music").expect("navigate");
        let top = session.create_folder("Chain").expect("top").id;
        let mut parent = top.clone();
        for level in 0..5_000 {
            parent = session
                .store
                .create_folder(parent.as_str(), &format!("Link {level}"))
                .expect("nested folder")
                .id;
        }

        assert_eq!(session.copy_items(&[top.clone()]), 1);
        session.navigate_to("dcim").expect("navigate");
        let outcome = session.paste().expect("paste").expect("outcome");
        assert_eq!(outcome.ids.len(), 1);
        assert_eq!(
            session.store().descendants(outcome.ids[0].as_str()).len(),
            5_000
        );
        assert_eq!(session.store().descendants(top.as_str()).len(), 5_000);
        session.store().validate().expect("consistent");
    }

    #[test]
    fn copy_paste_uses_snapshot_from_copy_time() {
        let mut session = Session::new(seeded_store());
        session.copy_items(&ids(&["docs"]));
        session.rename("work_docs", "Renamed Later").expect("rename");
        session.navigate_to("music").expect("navigate");

        let outcome = session.paste().expect("paste").expect("outcome");
        assert_eq!(outcome.action, ClipboardAction::Copy);
        let copy = outcome.ids[0].clone();
        assert_ne!(copy.as_str(), "docs");

        let store = session.store();
        let copied_children: Vec<String> = store
            .children(copy.as_str())
            .into_iter()
            .map(|i| i.name.clone())
            .collect();
        assert_eq!(copied_children, vec!["Work Projects"]);
        assert_eq!(
            store.get("docs").and_then(|i| i.parent_id.clone()),
            Some(ItemId::root())
        );
        assert!(session.clipboard().is_empty());
    }

    #[test]
    fn copy_paste_survives_source_deletion() {
        let mut session = Session::new(seeded_store());
        session.copy_items(&ids(&["docs"]));
        session.delete(&ids(&["docs"])).expect("delete");
        let outcome = session.paste().expect("paste").expect("outcome");
        assert_eq!(session.store().descendants(outcome.ids[0].as_str()).len(), 1);
    }

    #[test]
    fn paste_with_empty_clipboard_is_noop() {
        let mut session = Session::new(seeded_store());
        assert_eq!(session.paste(), Ok(None));
        assert_eq!(session.copy_items(&ids(&["ghost"])), 0);
        assert_eq!(session.paste(), Ok(None));
    }

    #[test]
    fn deleting_current_folder_returns_to_root() {
        let mut session = Session::new(seeded_store());
        session.navigate_to("work_docs").expect("navigate");
        session.delete(&ids(&["docs"])).expect("delete");
        assert_eq!(session.current_folder_id().as_str(), "root");
    }

    #[test]
    fn search_replaces_listing() {
        let mut session = Session::new(seeded_store());
        session.navigate_to("docs").expect("navigate");
        session.set_search_query("g");
        assert!(session.is_searching());
        assert!(!session.can_navigate_up());
        assert_eq!(names(&session), vec!["Google Search", "GitHub"]);

        session.set_search_filter(SearchFilter::Folder);
        assert!(names(&session).is_empty());

        session.set_search_query("  ");
        assert_eq!(names(&session), vec!["Work Projects"]);
    }

    #[test]
    fn select_all_and_sort_controls() {
        let mut session = Session::new(seeded_store());
        session.select_all();
        assert_eq!(session.selection().len(), 5);

        session.set_sort_mode(SortMode::Date);
        session.toggle_sort_direction();
        assert_eq!(names(&session).first().map(String::as_str), Some("Music"));
    }

    #[test]
    fn favicon_for_bookmarks_only() {
        let session = Session::new(seeded_store());
        assert!(session.favicon_url("github_bm").contains("domain=github.com"));
        assert_eq!(session.favicon_url("docs"), "");
    }
}
