use chrono::NaiveDate;

use crate::datetime::days_before;
use crate::item::{Item, ItemId};

/// The starter tree a new session opens on, dated relative to `today`.
pub fn seed_items(root_name: &str, today: NaiveDate) -> Vec<Item> {
    let root = || Some(ItemId::root());

    vec![
        Item::folder(ItemId::root(), root_name, None, today),
        Item::folder(ItemId::new("dcim"), "DCIM", root(), days_before(today, 5))
            .with_icon_overlay("Camera"),
        Item::folder(ItemId::new("docs"), "Documents", root(), days_before(today, 3))
            .with_icon_overlay("Briefcase"),
        Item::folder(
            ItemId::new("work_docs"),
            "Work Projects",
            Some(ItemId::new("docs")),
            days_before(today, 2),
        )
        .with_icon_overlay("Building2"),
        Item::bookmark(
            ItemId::new("google_bm"),
            "Google Search",
            "https://google.com",
            ItemId::root(),
            days_before(today, 1),
        ),
        Item::bookmark(
            ItemId::new("github_bm"),
            "GitHub",
            "https://github.com",
            ItemId::root(),
            today,
        ),
        Item::folder(ItemId::new("music"), "Music", root(), days_before(today, 7))
            .with_icon_overlay("Headphones"),
    ]
}
