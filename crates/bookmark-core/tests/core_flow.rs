use std::cell::RefCell;
use std::rc::Rc;

use bookmark_core::datetime::FixedClock;
use bookmark_core::hooks::StoreEvent;
use bookmark_core::ids::SequentialIds;
use bookmark_core::session::Session;
use bookmark_core::store::ItemStore;
use bookmark_core::view::{SearchFilter, SortDirection, SortMode, listing, search};
use bookmark_core::{ItemId, StoreError};
use chrono::NaiveDate;

fn clock() -> Box<FixedClock> {
    Box::new(FixedClock(
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date"),
    ))
}

fn seeded() -> ItemStore {
    ItemStore::seeded("Bookmark Pro", Box::new(SequentialIds::new()), clock())
        .expect("seed tree")
}

fn empty() -> ItemStore {
    ItemStore::new("Bookmark Pro", Box::new(SequentialIds::new()), clock())
}

fn names(items: &[&bookmark_core::Item]) -> Vec<String> {
    items.iter().map(|item| item.name.clone()).collect()
}

#[test]
fn folders_sort_before_bookmarks_by_name() {
    let mut store = empty();
    store.create_folder("root", "B").expect("folder B");
    store
        .create_bookmark("root", "A", "a.example")
        .expect("bookmark A");
    store.create_folder("root", "C").expect("folder C");

    let items = listing(&store, "root", SortMode::Name, SortDirection::Asc).expect("listing");
    assert_eq!(names(&items), vec!["B", "C", "A"]);
}

#[test]
fn search_matches_names_and_never_returns_root() {
    let mut store = empty();
    store.create_folder("root", "My Folder").expect("folder");
    store
        .create_bookmark("root", "Example Bookmark", "example.com")
        .expect("bookmark");

    let hits = search(&store, "exam", SearchFilter::All);
    assert_eq!(names(&hits), vec!["Example Bookmark"]);
    assert!(search(&store, "", SearchFilter::All).is_empty());
    assert!(search(&store, "bookmark pro", SearchFilter::All).is_empty());
}

#[test]
fn moving_a_folder_under_its_descendant_is_rejected() {
    let mut store = seeded();
    let before = store.revision();

    let err = store
        .move_item("docs", "work_docs")
        .expect_err("cycle must be rejected");
    assert_eq!(
        err,
        StoreError::CycleRejected {
            id: ItemId::from("docs"),
            target: ItemId::from("work_docs"),
        }
    );
    assert_eq!(store.revision(), before);
    assert_eq!(
        store
            .get("work_docs")
            .and_then(|item| item.parent_id.clone()),
        Some(ItemId::from("docs"))
    );
    store.validate().expect("tree still consistent");
}

#[test]
fn copy_then_delete_restores_structure() {
    let mut store = seeded();
    let before: Vec<ItemId> = store.items().iter().map(|item| item.id.clone()).collect();

    let copy = store.copy_item("docs", "music").expect("copy");
    let copied = store.get(copy.as_str()).expect("copy exists");
    assert_eq!(copied.name, "Documents");
    assert_eq!(store.descendants(copy.as_str()).len(), 1);

    let removed = store.delete(&[copy]).expect("delete copy");
    assert_eq!(removed, 2);
    let after: Vec<ItemId> = store.items().iter().map(|item| item.id.clone()).collect();
    assert_eq!(before, after);

    assert_eq!(store.delete(&[ItemId::from("docs")]).expect("delete"), 2);
    assert_eq!(store.delete(&[ItemId::from("docs")]).expect("again"), 0);
    assert!(store.get("work_docs").is_none());
}

#[test]
fn session_clipboard_round_trip() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut session = Session::new(seeded());
    let sink = Rc::clone(&events);
    session.subscribe(move |event: &StoreEvent| sink.borrow_mut().push(event.name()));

    assert_eq!(session.cut_items(&[ItemId::from("github_bm")]), 1);
    session.navigate_to("music").expect("enter music");
    let outcome = session.paste().expect("paste").expect("clipboard had items");
    assert_eq!(outcome.ids, vec![ItemId::from("github_bm")]);
    assert_eq!(
        session
            .store()
            .get("github_bm")
            .and_then(|item| item.parent_id.clone()),
        Some(ItemId::from("music"))
    );
    assert!(session.clipboard().is_empty());

    assert_eq!(session.copy_items(&[ItemId::from("github_bm")]), 1);
    let outcome = session.paste().expect("paste").expect("clipboard had items");
    assert_eq!(outcome.ids.len(), 1);
    assert_ne!(outcome.ids[0], ItemId::from("github_bm"));
    assert_eq!(session.store().children("music").len(), 2);

    assert_eq!(*events.borrow(), vec!["moved", "copied"]);
}
