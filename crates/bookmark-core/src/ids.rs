use std::fmt;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::item::ItemId;

/// Hands out ids for newly created or cloned items.
///
/// Implementations only need to be unique in practice; the store re-asks
/// (with a suffix) when a generated id is already taken.
pub trait IdSource: fmt::Debug {
    fn generate(&mut self, name: &str) -> ItemId;
}

/// `<slug>_<unix millis>_<counter><tie-break>`, e.g. `work_1760000000000_3417`.
#[derive(Debug, Default)]
pub struct TimestampIds {
    counter: u64,
}

impl IdSource for TimestampIds {
    fn generate(&mut self, name: &str) -> ItemId {
        self.counter += 1;
        let tie_break = Uuid::new_v4().as_u128() % 1000;
        ItemId::new(format!(
            "{}_{}_{}{:03}",
            slugify(name),
            Utc::now().timestamp_millis(),
            self.counter,
            tie_break
        ))
    }
}

/// Deterministic `<slug>_<n>` ids.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn generate(&mut self, name: &str) -> ItemId {
        self.next += 1;
        ItemId::new(format!("{}_{}", slugify(name), self.next))
    }
}

/// Lowercases `name` and replaces every character outside `[a-z0-9]` with `_`.
pub fn slugify(name: &str) -> String {
    static NON_SLUG: OnceLock<Regex> = OnceLock::new();
    let re = NON_SLUG.get_or_init(|| Regex::new("[^a-z0-9]").expect("static slug pattern"));
    re.replace_all(&name.to_lowercase(), "_").into_owned()
}
