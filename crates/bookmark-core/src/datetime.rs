use std::fmt;

use chrono::{
  Days,
  Local,
  NaiveDate
};

/// en-GB calendar date, the way items
/// show their `date`.
pub const DISPLAY_DATE_FORMAT: &str =
  "%d/%m/%Y";

/// Source of "today" for date stamping.
pub trait Clock: fmt::Debug {
  fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate {
    Local::now().date_naive()
  }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate {
    self.0
  }
}

#[must_use]
pub fn format_display_date(
  date: NaiveDate
) -> String {
  date
    .format(DISPLAY_DATE_FORMAT)
    .to_string()
}

pub fn parse_display_date(
  raw: &str
) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    DISPLAY_DATE_FORMAT
  )
  .ok()
}

#[must_use]
pub fn days_before(
  today: NaiveDate,
  days: u64
) -> NaiveDate {
  today
    .checked_sub_days(Days::new(days))
    .unwrap_or(today)
}

pub mod display_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &NaiveDate,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_str(
      &super::format_display_date(
        *date
      )
    )
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<NaiveDate, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = String::deserialize(
      deserializer
    )?;
    super::parse_display_date(&raw)
      .ok_or_else(|| {
        serde::de::Error::custom(
          format!(
            "invalid date {raw:?}, \
             expected dd/mm/yyyy"
          )
        )
      })
  }
}
