use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::datetime::{Clock, SystemClock};
use crate::error::{StoreError, StoreResult};
use crate::hooks::{ChangeHooks, StoreEvent};
use crate::ids::{IdSource, TimestampIds};
use crate::item::{Item, ItemId, ROOT_ID, Subtree};
use crate::link::normalize_url;
use crate::seed::seed_items;

const NEW_FOLDER_OVERLAY: &str = "Folder";

#[derive(Debug, Clone)]
struct Node {
    item: Item,
    children: Vec<ItemId>,
    seq: u64,
}

/// The folder/bookmark tree.
///
/// Items live in an id-keyed map; every node also keeps its ordered child
/// ids, so child lookups and subtree walks never scan the whole store.
/// Every mutation either applies completely or returns an error with the
/// store untouched.
#[derive(Debug)]
pub struct ItemStore {
    nodes: HashMap<ItemId, Node>,
    next_seq: u64,
    revision: u64,
    ids: Box<dyn IdSource>,
    clock: Box<dyn Clock>,
    hooks: ChangeHooks,
}

impl ItemStore {
    /// A store holding nothing but the root folder.
    pub fn new(root_name: &str, ids: Box<dyn IdSource>, clock: Box<dyn Clock>) -> Self {
        let root = Item::folder(ItemId::root(), root_name, None, clock.today());
        let mut store = Self::empty(ids, clock);
        store.attach(root);
        store
    }

    /// Builds a store from a flat item list. Children keep the relative
    /// order in which they appear in `items`.
    #[tracing::instrument(skip_all, fields(count = items.len()))]
    pub fn from_items(
        items: Vec<Item>,
        ids: Box<dyn IdSource>,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let mut store = Self::empty(ids, clock);
        let mut order = Vec::with_capacity(items.len());

        for item in items {
            if store.nodes.contains_key(&item.id) {
                return Err(StoreError::DuplicateId(item.id));
            }
            order.push((item.id.clone(), item.parent_id.clone()));
            let seq = store.bump_seq();
            store.nodes.insert(
                item.id.clone(),
                Node {
                    item,
                    children: vec![],
                    seq,
                },
            );
        }

        for (id, parent) in order {
            let Some(parent) = parent else {
                if id.is_root() {
                    continue;
                }
                return Err(StoreError::Orphan(id));
            };
            let Some(parent_node) = store.nodes.get_mut(&parent) else {
                return Err(StoreError::Orphan(id));
            };
            if !parent_node.item.is_folder() {
                return Err(StoreError::NotAFolder(parent));
            }
            parent_node.children.push(id);
        }

        store.validate()?;
        debug!(items = store.nodes.len(), "built item store");
        Ok(store)
    }

    /// The demo tree every fresh session starts with.
    pub fn seeded(
        root_name: &str,
        ids: Box<dyn IdSource>,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let items = seed_items(root_name, clock.today());
        Self::from_items(items, ids, clock)
    }

    pub fn with_defaults(root_name: &str) -> StoreResult<Self> {
        Self::seeded(
            root_name,
            Box::new(TimestampIds::default()),
            Box::new(SystemClock),
        )
    }

    fn empty(ids: Box<dyn IdSource>, clock: Box<dyn Clock>) -> Self {
        Self {
            nodes: HashMap::new(),
            next_seq: 0,
            revision: 0,
            ids,
            clock,
            hooks: ChangeHooks::default(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.nodes.get(id).map(|node| &node.item)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: the root cannot be removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of successful mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.hooks.register(listener);
    }

    /// All items in insertion order.
    pub fn items(&self) -> Vec<&Item> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by_key(|node| node.seq);
        nodes.into_iter().map(|node| &node.item).collect()
    }

    /// Direct children in insertion order. Unknown parents have none.
    pub fn children(&self, parent: &str) -> Vec<&Item> {
        self.nodes
            .get(parent)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.get(child.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn child_count(&self, id: &str) -> usize {
        self.nodes.get(id).map_or(0, |node| node.children.len())
    }

    /// Every transitive descendant of `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: &str) -> Vec<&Item> {
        self.subtree_ids(id)
            .iter()
            .skip(1)
            .filter_map(|child| self.get(child.as_str()))
            .collect()
    }

    /// True when `ancestor` appears on the parent chain of `candidate`.
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = self.get(candidate).and_then(|item| item.parent_id.as_ref());
        let mut steps = 0;
        while let Some(parent) = current {
            if parent.as_str() == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                warn!(candidate, "parent chain longer than the store; giving up");
                return false;
            }
            current = self.get(parent.as_str()).and_then(|item| item.parent_id.as_ref());
        }
        false
    }

    /// Names from just below the root down to `id`; empty for the root.
    pub fn path(&self, id: &str) -> StoreResult<Vec<String>> {
        let mut item = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?;
        let mut names = Vec::new();
        while let Some(parent) = &item.parent_id {
            names.push(item.name.clone());
            match self.get(parent.as_str()) {
                Some(next) => item = next,
                None => break,
            }
        }
        names.reverse();
        Ok(names)
    }

    #[tracing::instrument(skip(self))]
    pub fn create_folder(&mut self, parent: &str, name: &str) -> StoreResult<Item> {
        let name = valid_name(name)?;
        self.require_folder(parent)?;

        let id = self.fresh_id(name);
        let item = Item::folder(id.clone(), name, Some(ItemId::from(parent)), self.today())
            .with_icon_overlay(NEW_FOLDER_OVERLAY);
        self.attach(item.clone());

        info!(id = %id, parent, "created folder");
        self.touch(StoreEvent::Created {
            id,
            parent: ItemId::from(parent),
        });
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub fn create_bookmark(&mut self, parent: &str, name: &str, url: &str) -> StoreResult<Item> {
        let name = valid_name(name)?;
        let url = normalize_url(url)?;
        self.require_folder(parent)?;

        let id = self.fresh_id(name);
        let item = Item::bookmark(id.clone(), name, url, ItemId::from(parent), self.today());
        self.attach(item.clone());

        info!(id = %id, parent, "created bookmark");
        self.touch(StoreEvent::Created {
            id,
            parent: ItemId::from(parent),
        });
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub fn rename(&mut self, id: &str, new_name: &str) -> StoreResult<()> {
        let new_name = valid_name(new_name)?;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?;
        node.item.name = new_name.to_string();

        debug!(id, name = new_name, "renamed item");
        self.touch(StoreEvent::Renamed {
            id: ItemId::from(id),
            name: new_name.to_string(),
        });
        Ok(())
    }

    /// Removes every listed item together with all of its descendants and
    /// returns how many items went away. Unknown ids are skipped.
    #[tracing::instrument(skip(self, ids), fields(requested = ids.len()))]
    pub fn delete(&mut self, ids: &[ItemId]) -> StoreResult<usize> {
        if ids.iter().any(ItemId::is_root) {
            return Err(StoreError::RootImmutable);
        }

        let mut removed = Vec::new();
        for id in ids {
            if !self.nodes.contains_key(id) {
                debug!(id = %id, "delete target already gone");
                continue;
            }

            let doomed = self.subtree_ids(id.as_str());
            self.detach(id.as_str());
            for victim in doomed {
                if self.nodes.remove(&victim).is_some() {
                    removed.push(victim);
                }
            }
        }

        if removed.is_empty() {
            return Ok(0);
        }

        info!(removed = removed.len(), "deleted items");
        let count = removed.len();
        self.touch(StoreEvent::Deleted { ids: removed });
        Ok(count)
    }

    /// Checks that `id` may be reparented under `new_parent` without
    /// touching the store.
    pub fn check_move(&self, id: &str, new_parent: &str) -> StoreResult<()> {
        if id == ROOT_ID {
            return Err(StoreError::RootImmutable);
        }
        if !self.contains(id) {
            return Err(StoreError::NotFound(ItemId::from(id)));
        }
        if !self.contains(new_parent) {
            return Err(StoreError::NotFound(ItemId::from(new_parent)));
        }
        if id == new_parent || self.is_descendant(new_parent, id) {
            return Err(StoreError::CycleRejected {
                id: ItemId::from(id),
                target: ItemId::from(new_parent),
            });
        }
        self.require_folder(new_parent)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn move_item(&mut self, id: &str, new_parent: &str) -> StoreResult<()> {
        self.check_move(id, new_parent)?;

        let from = self
            .get(id)
            .and_then(|item| item.parent_id.clone())
            .ok_or(StoreError::RootImmutable)?;
        if from.as_str() == new_parent {
            debug!(id, "move into current parent is a no-op");
            return Ok(());
        }

        self.detach(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.item.parent_id = Some(ItemId::from(new_parent));
        }
        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.push(ItemId::from(id));
        }

        info!(id, from = %from, to = new_parent, "moved item");
        self.touch(StoreEvent::Moved {
            id: ItemId::from(id),
            from,
            to: ItemId::from(new_parent),
        });
        Ok(())
    }

    /// Deep-copies `id` under `new_parent`; every clone gets a fresh id and
    /// today's date. Returns the id of the top clone.
    #[tracing::instrument(skip(self))]
    pub fn copy_item(&mut self, id: &str, new_parent: &str) -> StoreResult<ItemId> {
        let snapshot = self.snapshot(id)?;
        self.insert_snapshot(&snapshot, new_parent)
    }

    /// Detached deep copy of `id` and its descendants, taken in one walk.
    pub fn snapshot(&self, id: &str) -> StoreResult<Subtree> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?;

        let mut snapshot = Subtree::leaf(node.item.clone());
        let mut stack: Vec<(&ItemId, usize)> =
            node.children.iter().rev().map(|child| (child, 0)).collect();
        while let Some((child, parent)) = stack.pop() {
            let node = self
                .nodes
                .get(child)
                .ok_or_else(|| StoreError::Orphan(child.clone()))?;
            let position = snapshot
                .push(parent, node.item.clone())
                .ok_or_else(|| StoreError::Orphan(child.clone()))?;
            if snapshot.len() > self.nodes.len() {
                warn!(id, "cycle detected while taking snapshot");
                return Err(StoreError::CycleRejected {
                    id: ItemId::from(id),
                    target: child.clone(),
                });
            }
            stack.extend(node.children.iter().rev().map(|grandchild| (grandchild, position)));
        }
        Ok(snapshot)
    }

    /// Inserts clones of every item in `snapshot` under `parent`.
    #[tracing::instrument(skip(self, snapshot), fields(source = %snapshot.item().id))]
    pub fn insert_snapshot(&mut self, snapshot: &Subtree, parent: &str) -> StoreResult<ItemId> {
        self.require_folder(parent)?;

        let today = self.today();
        let top = self.attach_clone(snapshot.item(), ItemId::from(parent), today);
        let mut created = Vec::with_capacity(snapshot.len());
        created.push(top.clone());
        for (item, position) in snapshot.descendants() {
            // push() only accepts parents that are already in the snapshot
            let parent_id = created[*position].clone();
            created.push(self.attach_clone(item, parent_id, today));
        }

        let count = created.len();
        info!(copy = %top, parent, count, "copied items");
        self.touch(StoreEvent::Copied {
            source: snapshot.item().id.clone(),
            copy: top.clone(),
            parent: ItemId::from(parent),
            count,
        });
        Ok(top)
    }

    /// Verifies every tree invariant: a parentless folder root, parents
    /// that exist and are folders, and every item reachable from the root.
    pub fn validate(&self) -> StoreResult<()> {
        let root = self
            .nodes
            .get(ROOT_ID)
            .ok_or_else(|| StoreError::NotFound(ItemId::root()))?;
        if !root.item.is_folder() {
            return Err(StoreError::NotAFolder(ItemId::root()));
        }
        if root.item.parent_id.is_some() {
            return Err(StoreError::Orphan(ItemId::root()));
        }

        let mut ordered: Vec<&Node> = self.nodes.values().collect();
        ordered.sort_by_key(|node| node.seq);

        for node in &ordered {
            let item = &node.item;
            if item.id.is_root() {
                continue;
            }
            let parent_id = item
                .parent_id
                .as_ref()
                .ok_or_else(|| StoreError::Orphan(item.id.clone()))?;
            let parent = self
                .nodes
                .get(parent_id)
                .ok_or_else(|| StoreError::Orphan(item.id.clone()))?;
            if !parent.item.is_folder() {
                return Err(StoreError::NotAFolder(parent_id.clone()));
            }
            if !parent.children.contains(&item.id) {
                return Err(StoreError::Orphan(item.id.clone()));
            }
        }

        let reachable = self.subtree_ids(ROOT_ID);
        if reachable.len() != self.nodes.len() {
            if let Some(node) = ordered
                .iter()
                .find(|node| !reachable.contains(&node.item.id))
            {
                return Err(StoreError::Orphan(node.item.id.clone()));
            }
        }
        Ok(())
    }

    fn require_folder(&self, id: &str) -> StoreResult<&Item> {
        let item = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(ItemId::from(id)))?;
        if !item.is_folder() {
            return Err(StoreError::NotAFolder(ItemId::from(id)));
        }
        Ok(item)
    }

    /// Pre-order ids of `id` and everything below it.
    fn subtree_ids(&self, id: &str) -> Vec<ItemId> {
        let Some(start) = self.nodes.get_key_value(id).map(|(key, _)| key.clone()) else {
            return vec![];
        };

        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().cloned());
            }
            if out.len() > self.nodes.len() {
                warn!(id, "cycle detected while walking subtree");
                break;
            }
            out.push(current);
        }
        out
    }

    fn attach(&mut self, item: Item) {
        if let Some(parent) = item.parent_id.as_ref().and_then(|p| self.nodes.get_mut(p)) {
            parent.children.push(item.id.clone());
        }
        let seq = self.bump_seq();
        self.nodes.insert(
            item.id.clone(),
            Node {
                item,
                children: vec![],
                seq,
            },
        );
    }

    fn attach_clone(&mut self, source: &Item, parent: ItemId, today: chrono::NaiveDate) -> ItemId {
        let id = self.fresh_id(&source.name);
        let mut item = source.clone();
        item.id = id.clone();
        item.parent_id = Some(parent);
        item.date = today;
        self.attach(item);
        id
    }

    fn detach(&mut self, id: &str) {
        let parent = self.get(id).and_then(|item| item.parent_id.clone());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| child.as_str() != id);
        }
    }

    fn fresh_id(&mut self, name: &str) -> ItemId {
        let candidate = self.ids.generate(name);
        if !self.nodes.contains_key(&candidate) {
            return candidate;
        }

        let mut attempt = 1_u32;
        loop {
            let suffixed = ItemId::new(format!("{candidate}_{attempt}"));
            if !self.nodes.contains_key(&suffixed) {
                warn!(taken = %candidate, id = %suffixed, "generated id collided; suffixed it");
                return suffixed;
            }
            attempt += 1;
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn touch(&mut self, event: StoreEvent) {
        self.revision += 1;
        self.hooks.emit(&event);
    }
}

fn valid_name(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidName);
    }
    Ok(trimmed)
}
