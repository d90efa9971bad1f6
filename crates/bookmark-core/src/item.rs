use std::borrow::Borrow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime::display_date_serde;

pub const ROOT_ID: &str = "root";

/// Opaque item identifier. Folders and bookmarks share one id space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Folder,
    Bookmark,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Folder => "folder",
            ItemType::Bookmark => "bookmark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Folder {
        #[serde(
            default,
            rename = "iconOverlay",
            skip_serializing_if = "Option::is_none"
        )]
        icon_overlay: Option<String>,
    },
    Bookmark {
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,

    pub name: String,

    #[serde(default)]
    pub parent_id: Option<ItemId>,

    #[serde(with = "display_date_serde")]
    pub date: NaiveDate,

    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn folder(
        id: ItemId,
        name: impl Into<String>,
        parent_id: Option<ItemId>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            date,
            kind: ItemKind::Folder { icon_overlay: None },
        }
    }

    pub fn bookmark(
        id: ItemId,
        name: impl Into<String>,
        url: impl Into<String>,
        parent_id: ItemId,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: Some(parent_id),
            date,
            kind: ItemKind::Bookmark { url: url.into() },
        }
    }

    #[must_use]
    pub fn with_icon_overlay(mut self, overlay: impl Into<String>) -> Self {
        if let ItemKind::Folder { icon_overlay } = &mut self.kind {
            *icon_overlay = Some(overlay.into());
        }
        self
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Folder { .. } => ItemType::Folder,
            ItemKind::Bookmark { .. } => ItemType::Bookmark,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { .. })
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Bookmark { url } => Some(url),
            ItemKind::Folder { .. } => None,
        }
    }

    pub fn icon_overlay(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Folder { icon_overlay } => icon_overlay.as_deref(),
            ItemKind::Bookmark { .. } => None,
        }
    }
}

/// Deep, store-independent copy of an item and everything below it.
///
/// Nodes are kept flat in pre-order so that arbitrarily deep trees never
/// recurse when built, measured or dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtree {
    item: Item,
    /// `(item, parent)` where `parent` is a node position, 0 being the top.
    descendants: Vec<(Item, usize)>,
}

impl Subtree {
    pub fn leaf(item: Item) -> Self {
        Self {
            item,
            descendants: vec![],
        }
    }

    /// The top item.
    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn descendants(&self) -> &[(Item, usize)] {
        &self.descendants
    }

    /// Appends `item` below the node at position `parent` and returns the
    /// new node's position. `None` when `parent` is not in the snapshot yet.
    pub fn push(&mut self, parent: usize, item: Item) -> Option<usize> {
        if parent > self.descendants.len() {
            return None;
        }
        self.descendants.push((item, parent));
        Some(self.descendants.len())
    }

    /// Number of items in the snapshot, the top item included.
    pub fn len(&self) -> usize {
        1 + self.descendants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{Item, ItemId, ItemType, Subtree};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[test]
    fn serializes_with_type_tag_and_display_date() {
        let folder = Item::folder(ItemId::new("docs"), "Documents", Some(ItemId::root()), day())
            .with_icon_overlay("Briefcase");

        let value = serde_json::to_value(&folder).expect("serialize folder");
        assert_eq!(
            value,
            json!({
                "id": "docs",
                "name": "Documents",
                "parentId": "root",
                "date": "14/03/2026",
                "type": "folder",
                "iconOverlay": "Briefcase"
            })
        );
    }

    #[test]
    fn deserializes_bookmark() {
        let item: Item = serde_json::from_value(json!({
            "id": "github_bm",
            "name": "GitHub",
            "parentId": "root",
            "date": "01/02/2026",
            "type": "bookmark",
            "url": "https://github.com"
        }))
        .expect("deserialize bookmark");

        assert_eq!(item.item_type(), ItemType::Bookmark);
        assert_eq!(item.url(), Some("https://github.com"));
        assert_eq!(item.icon_overlay(), None);
    }

    #[test]
    fn icon_overlay_is_ignored_on_bookmarks() {
        let bookmark = Item::bookmark(
            ItemId::new("b"),
            "B",
            "https://b.example",
            ItemId::root(),
            day(),
        )
        .with_icon_overlay("Camera");
        assert_eq!(bookmark.icon_overlay(), None);
    }

    #[test]
    fn subtree_push_keeps_parents_ahead_of_children() {
        let folder = |id: &str| Item::folder(ItemId::new(id), id, Some(ItemId::root()), day());
        let mut top = Subtree::leaf(folder("a"));
        let b = top.push(0, folder("b")).expect("top exists");
        assert_eq!(top.push(b, folder("c")), Some(2));
        assert_eq!(top.push(0, folder("d")), Some(3));
        assert_eq!(top.push(9, folder("e")), None);

        assert_eq!(top.len(), 4);
        assert_eq!(top.item().id.as_str(), "a");
        let parents: Vec<(&str, usize)> = top
            .descendants()
            .iter()
            .map(|(item, parent)| (item.id.as_str(), *parent))
            .collect();
        assert_eq!(parents, vec![("b", 0), ("c", 1), ("d", 0)]);
    }
}
