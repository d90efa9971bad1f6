use chrono::NaiveDate;

use crate::datetime::FixedClock;
use crate::ids::SequentialIds;
use crate::store::ItemStore;

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
}

pub(crate) fn seeded_store() -> ItemStore {
    ItemStore::seeded(
        "Bookmark Pro",
        Box::new(SequentialIds::new()),
        Box::new(FixedClock(today())),
    )
    .expect("seed tree is consistent")
}

pub(crate) fn empty_store() -> ItemStore {
    ItemStore::new(
        "Bookmark Pro",
        Box::new(SequentialIds::new()),
        Box::new(FixedClock(today())),
    )
}
