//! Lenient wire scalars.
//!
//! The upstream API is not consistent about how it encodes dates, times and
//! some integers. These types accept every encoding seen in the wild and always
//! re-encode in one canonical form. Re-encoding is lossy: the original layout
//! and UTC offset are not preserved.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_LAYOUT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {kind} {input:?}: must be {expected}")]
pub struct ScalarError {
  kind: &'static str,
  input: String,
  expected: &'static str,
}

/// Point in time sent either as `"YYYY-MM-DD HH:MM:SS"` or RFC 3339.
///
/// Empty strings and `null` decode to the zero value, which encodes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp(Option<DateTime<FixedOffset>>);

impl Timestamp {
  pub fn new(time: DateTime<FixedOffset>) -> Self {
    Self(Some(time))
  }

  pub fn parse(s: &str) -> Result<Self, ScalarError> {
    let s = s.trim_matches('"');
    if is_empty_literal(s) {
      return Ok(Self::default());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, TIMESTAMP_LAYOUT) {
      return Ok(Self::new(naive.and_utc().fixed_offset()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
      return Ok(Self::new(parsed));
    }

    Err(ScalarError {
      kind: "Timestamp",
      input: s.to_string(),
      expected: "\"YYYY-MM-DD HH:MM:SS\" or RFC 3339",
    })
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_none()
  }

  pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
    self.0.as_ref()
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Some(time) => write!(f, "{}", time.format(TIMESTAMP_LAYOUT)),
      None => Ok(()),
    }
  }
}

impl Serialize for Timestamp {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match &self.0 {
      Some(_) => serializer.collect_str(self),
      None => serializer.serialize_none(),
    }
  }
}

impl<'de> Deserialize<'de> for Timestamp {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(LayoutVisitor::new("a timestamp string", Timestamp::parse))
  }
}

/// Calendar date sent as `"YYYY-MM-DD"`, as a timestamp or as RFC 3339.
///
/// Only the date component survives decoding. Empty strings and `null`
/// decode to the zero value, which encodes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Date(Option<NaiveDate>);

impl Date {
  pub fn new(date: NaiveDate) -> Self {
    Self(Some(date))
  }

  pub fn parse(s: &str) -> Result<Self, ScalarError> {
    let s = s.trim_matches('"');
    if is_empty_literal(s) {
      return Ok(Self::default());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_LAYOUT) {
      return Ok(Self::new(date));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, TIMESTAMP_LAYOUT) {
      return Ok(Self::new(naive.date()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
      return Ok(Self::new(parsed.date_naive()));
    }

    Err(ScalarError {
      kind: "Date",
      input: s.to_string(),
      expected: "\"YYYY-MM-DD\", \"YYYY-MM-DD HH:MM:SS\" or RFC 3339",
    })
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_none()
  }

  pub fn as_date(&self) -> Option<NaiveDate> {
    self.0
  }
}

impl fmt::Display for Date {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.0 {
      Some(date) => write!(f, "{}", date.format(DATE_LAYOUT)),
      None => Ok(()),
    }
  }
}

impl Serialize for Date {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match &self.0 {
      Some(_) => serializer.collect_str(self),
      None => serializer.serialize_none(),
    }
  }
}

impl<'de> Deserialize<'de> for Date {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(LayoutVisitor::new("a date string", Date::parse))
  }
}

/// Field deserializer that reads an explicit `null` as the type's default.
///
/// Pair with `#[serde(default)]` so a missing field behaves the same.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_empty_literal(s: &str) -> bool {
  s.is_empty() || s == "null"
}

/// Shared visitor for the string-encoded time types.
struct LayoutVisitor<T> {
  expecting: &'static str,
  parse: fn(&str) -> Result<T, ScalarError>,
}

impl<T> LayoutVisitor<T> {
  fn new(expecting: &'static str, parse: fn(&str) -> Result<T, ScalarError>) -> Self {
    Self { expecting, parse }
  }
}

impl<'de, T: Default> Visitor<'de> for LayoutVisitor<T> {
  type Value = T;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.expecting)
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
    (self.parse)(v).map_err(E::custom)
  }

  fn visit_unit<E: de::Error>(self) -> Result<T, E> {
    Ok(T::default())
  }

  fn visit_none<E: de::Error>(self) -> Result<T, E> {
    Ok(T::default())
  }
}

/// Unsigned integer the API sometimes sends as a JSON string.
///
/// Always encodes as a bare number. `null` and `""` decode to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Count(pub u64);

impl Count {
  pub fn get(self) -> u64 {
    self.0
  }
}

impl From<u64> for Count {
  fn from(value: u64) -> Self {
    Self(value)
  }
}

impl fmt::Display for Count {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Serialize for Count {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(self.0)
  }
}

impl<'de> Deserialize<'de> for Count {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(CountVisitor)
  }
}

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
  type Value = Count;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("an unsigned integer or a string containing one")
  }

  fn visit_u64<E: de::Error>(self, v: u64) -> Result<Count, E> {
    Ok(Count(v))
  }

  fn visit_i64<E: de::Error>(self, v: i64) -> Result<Count, E> {
    u64::try_from(v)
      .map(Count)
      .map_err(|_| E::custom(format!("parsing count from number {}: negative value", v)))
  }

  fn visit_f64<E: de::Error>(self, v: f64) -> Result<Count, E> {
    Err(E::custom(format!(
      "parsing count from number {}: not an unsigned integer",
      v
    )))
  }

  fn visit_str<E: de::Error>(self, v: &str) -> Result<Count, E> {
    if v.is_empty() {
      return Ok(Count::default());
    }
    v.parse::<u64>()
      .map(Count)
      .map_err(|e| E::custom(format!("parsing count from string {:?}: {}", v, e)))
  }

  fn visit_unit<E: de::Error>(self) -> Result<Count, E> {
    Ok(Count::default())
  }

  fn visit_none<E: de::Error>(self) -> Result<Count, E> {
    Ok(Count::default())
  }
}
