use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use deunicode::deunicode;
use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::error::{
  ParseNameError,
  StoreError,
  StoreResult
};
use crate::item::{
  Item,
  ItemId,
  ItemType
};
use crate::store::ItemStore;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
  #[default]
  #[serde(rename = "sort-by-name")]
  Name,
  #[serde(rename = "sort-by-date")]
  Date,
  #[serde(rename = "sort-by-type")]
  Type,
  #[serde(rename = "sort-by-size")]
  Size
}

impl SortMode {
  pub fn as_str(self) -> &'static str {
    match self {
      | SortMode::Name => "sort-by-name",
      | SortMode::Date => "sort-by-date",
      | SortMode::Type => "sort-by-type",
      | SortMode::Size => "sort-by-size"
    }
  }
}

impl fmt::Display for SortMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortMode {
  type Err = ParseNameError;

  /// Accepts `sort-by-name`, `by-name`
  /// and bare `name`.
  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let key = s.trim().to_ascii_lowercase();
    let key = key
      .strip_prefix("sort-")
      .unwrap_or(&key);
    let key =
      key.strip_prefix("by-").unwrap_or(key);
    match key {
      | "name" => Ok(SortMode::Name),
      | "date" => Ok(SortMode::Date),
      | "type" => Ok(SortMode::Type),
      | "size" => Ok(SortMode::Size),
      | _ => Err(ParseNameError::new(
        "sort mode",
        s
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc
}

impl SortDirection {
  #[must_use]
  pub fn toggle(self) -> Self {
    match self {
      | SortDirection::Asc => {
        SortDirection::Desc
      }
      | SortDirection::Desc => {
        SortDirection::Asc
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | SortDirection::Asc => "asc",
      | SortDirection::Desc => "desc"
    }
  }

  fn apply(
    self,
    ordering: Ordering
  ) -> Ordering {
    match self {
      | SortDirection::Asc => ordering,
      | SortDirection::Desc => {
        ordering.reverse()
      }
    }
  }
}

impl FromStr for SortDirection {
  type Err = ParseNameError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "asc" | "ascending" => {
        Ok(SortDirection::Asc)
      }
      | "desc" | "descending" => {
        Ok(SortDirection::Desc)
      }
      | _ => Err(ParseNameError::new(
        "sort direction",
        s
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
  #[default]
  All,
  Folder,
  Bookmark
}

impl SearchFilter {
  pub fn admits(
    self,
    item_type: ItemType
  ) -> bool {
    match self {
      | SearchFilter::All => true,
      | SearchFilter::Folder => {
        item_type == ItemType::Folder
      }
      | SearchFilter::Bookmark => {
        item_type == ItemType::Bookmark
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | SearchFilter::All => "all",
      | SearchFilter::Folder => "folder",
      | SearchFilter::Bookmark => {
        "bookmark"
      }
    }
  }
}

impl FromStr for SearchFilter {
  type Err = ParseNameError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(SearchFilter::All),
      | "folder" | "folders" => {
        Ok(SearchFilter::Folder)
      }
      | "bookmark" | "bookmarks" => {
        Ok(SearchFilter::Bookmark)
      }
      | _ => Err(ParseNameError::new(
        "search filter",
        s
      ))
    }
  }
}

/// Direct children of `folder`, ordered
/// for display. Ties keep insertion order.
#[tracing::instrument(skip(store))]
pub fn listing<'a>(
  store: &'a ItemStore,
  folder: &str,
  mode: SortMode,
  direction: SortDirection
) -> StoreResult<Vec<&'a Item>> {
  let parent =
    store.get(folder).ok_or_else(|| {
      StoreError::NotFound(ItemId::from(
        folder
      ))
    })?;
  if !parent.is_folder() {
    return Err(StoreError::NotAFolder(
      ItemId::from(folder)
    ));
  }

  let mut items = store.children(folder);
  match mode {
    | SortMode::Name => {
      // folders lead in both directions
      items.sort_by(|a, b| {
        type_rank(a)
          .cmp(&type_rank(b))
          .then_with(|| {
            direction.apply(
              compare_names(
                &a.name, &b.name
              )
            )
          })
      });
    }
    | SortMode::Date => {
      items.sort_by(|a, b| {
        direction
          .apply(b.date.cmp(&a.date))
      });
    }
    | SortMode::Type => {
      items.sort_by(|a, b| {
        direction.apply(
          type_rank(a)
            .cmp(&type_rank(b))
        )
      });
    }
    | SortMode::Size => {
      items.sort_by(|a, b| {
        direction.apply(
          size_of(store, b)
            .cmp(&size_of(store, a))
        )
      });
    }
  }

  trace!(
    count = items.len(),
    "sorted listing"
  );
  Ok(items)
}

/// Case-insensitive substring search over
/// every item but the root. A blank query
/// means no search, so nothing matches; any
/// other query is matched untrimmed.
#[tracing::instrument(skip(store))]
pub fn search<'a>(
  store: &'a ItemStore,
  query: &str,
  filter: SearchFilter
) -> Vec<&'a Item> {
  if query.trim().is_empty() {
    return vec![];
  }
  // surrounding spaces are part of the needle
  let needle = query.to_lowercase();

  store
    .items()
    .into_iter()
    .filter(|item| !item.is_root())
    .filter(|item| {
      filter.admits(item.item_type())
    })
    .filter(|item| {
      item
        .name
        .to_lowercase()
        .contains(&needle)
    })
    .collect()
}

/// Accent- and case-folded comparison first
/// (`Éclair` sorts with the e's), then the
/// caseless names, then the raw strings with
/// lowercase ahead of uppercase.
pub fn compare_names(
  a: &str,
  b: &str
) -> Ordering {
  deunicode(a)
    .to_lowercase()
    .cmp(&deunicode(b).to_lowercase())
    .then_with(|| {
      a.to_lowercase()
        .cmp(&b.to_lowercase())
    })
    .then_with(|| b.cmp(a))
}

fn type_rank(item: &Item) -> u8 {
  match item.item_type() {
    | ItemType::Folder => 0,
    | ItemType::Bookmark => 1
  }
}

fn size_of(
  store: &ItemStore,
  item: &Item
) -> usize {
  if item.is_folder() {
    store.child_count(item.id.as_str())
  } else {
    0
  }
}
