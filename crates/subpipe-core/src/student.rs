//! Student rows: raw shape, decoders for the semi-structured columns, and the
//! student cleanser.
//!
//! Pipeline per row:
//!   RawStudent
//!     └─ required numerics present?   → else quarantine (missing data)
//!          └─ decode contact_info     → ContactInfo
//!               └─ split address      → Address
//!                    └─ derive age    → CleansedStudent

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::cell::Cell;

// ─── Raw row ─────────────────────────────────────────────────────────────────

/// A row of the source student table, exactly as read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStudent {
  pub uuid:                   i64,
  pub name:                   Cell,
  pub dob:                    Cell,
  pub sex:                    Cell,
  pub contact_info:           Cell,
  pub job_id:                 Cell,
  pub num_course_taken:       Cell,
  pub current_career_path_id: Cell,
  pub time_spent_hrs:         Cell,
}

impl RawStudent {
  /// Column names of the raw table, in storage order.
  pub const COLUMNS: [&'static str; 9] = [
    "uuid",
    "name",
    "dob",
    "sex",
    "contact_info",
    "job_id",
    "num_course_taken",
    "current_career_path_id",
    "time_spent_hrs",
  ];

  /// The row's cells in [`Self::COLUMNS`] order.
  pub fn cells(&self) -> [Cell; 9] {
    [
      Cell::Integer(self.uuid),
      self.name.clone(),
      self.dob.clone(),
      self.sex.clone(),
      self.contact_info.clone(),
      self.job_id.clone(),
      self.num_course_taken.clone(),
      self.current_career_path_id.clone(),
      self.time_spent_hrs.clone(),
    ]
  }
}

// ─── Decoders ────────────────────────────────────────────────────────────────

/// A recoverable input-shape problem. Rows that fail to decode are routed to
/// quarantine, never aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
  #[error("malformed contact_info: {0}")]
  MalformedContactInfo(String),

  #[error("contact_info has no `{0}` field")]
  MissingContactField(&'static str),

  #[error("mailing address has {parts} comma-separated parts, expected 4: {address:?}")]
  MalformedAddress { parts: usize, address: String },

  #[error("invalid date of birth: {0:?}")]
  InvalidDateOfBirth(String),
}

/// The named fields carried inside `contact_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
  pub mailing_address: String,
  pub email:           String,
}

/// Decode `contact_info`, accepting a JSON object or a `{'key': 'value'}`
/// mapping literal with single-quoted strings.
pub fn decode_contact_info(raw: &str) -> Result<ContactInfo, DecodeError> {
  let fields = match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(raw) {
    Ok(map) => map
      .into_iter()
      .filter_map(|(k, v)| match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some((k, s)),
        other => Some((k, other.to_string())),
      })
      .collect(),
    Err(_) => parse_dict_literal(raw)?,
  };

  let take = |key: &'static str| {
    fields
      .get(key)
      .cloned()
      .ok_or(DecodeError::MissingContactField(key))
  };

  Ok(ContactInfo {
    mailing_address: take("mailing_address")?,
    email:           take("email")?,
  })
}

/// Parse `{'k': 'v', "k2": 3}` into string pairs. Bare numbers are kept as
/// their literal text; a bare `None` or `null` leaves the key absent.
fn parse_dict_literal(raw: &str) -> Result<BTreeMap<String, String>, DecodeError> {
  let malformed = |why: &str| DecodeError::MalformedContactInfo(why.to_owned());

  let body = raw
    .trim()
    .strip_prefix('{')
    .and_then(|s| s.strip_suffix('}'))
    .ok_or_else(|| malformed("expected a {...} mapping"))?;

  let mut chars = body.chars().peekable();
  let mut fields = BTreeMap::new();

  loop {
    skip_ws(&mut chars);
    if chars.peek().is_none() {
      break;
    }

    let key = read_quoted(&mut chars).ok_or_else(|| malformed("expected a quoted key"))?;
    skip_ws(&mut chars);
    if chars.next() != Some(':') {
      return Err(malformed("expected `:` after key"));
    }
    skip_ws(&mut chars);

    let value = match chars.peek() {
      Some('\'' | '"') => {
        Some(read_quoted(&mut chars).ok_or_else(|| malformed("unterminated string"))?)
      }
      _ => {
        let mut bare = String::new();
        while let Some(&c) = chars.peek() {
          if c == ',' {
            break;
          }
          bare.push(c);
          chars.next();
        }
        match bare.trim() {
          "" => return Err(malformed("empty value")),
          "None" | "null" => None,
          other => Some(other.to_owned()),
        }
      }
    };
    if let Some(value) = value {
      fields.insert(key, value);
    }

    skip_ws(&mut chars);
    match chars.next() {
      Some(',') => continue,
      None => break,
      Some(_) => return Err(malformed("expected `,` between entries")),
    }
  }

  Ok(fields)
}

fn skip_ws(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
  while chars.peek().is_some_and(|c| c.is_whitespace()) {
    chars.next();
  }
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
  let quote = chars.next().filter(|c| *c == '\'' || *c == '"')?;
  let mut out = String::new();
  loop {
    match chars.next()? {
      '\\' => out.push(chars.next()?),
      c if c == quote => return Some(out),
      c => out.push(c),
    }
  }
}

/// A mailing address split into its four positional parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
  pub street:   String,
  pub city:     String,
  pub state:    String,
  pub zip_code: String,
}

/// Split `"street, city, state, zip"` on commas. Exactly four parts are
/// required.
pub fn split_address(raw: &str) -> Result<Address, DecodeError> {
  let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
  match parts.as_slice() {
    [street, city, state, zip_code] => Ok(Address {
      street:   (*street).to_owned(),
      city:     (*city).to_owned(),
      state:    (*state).to_owned(),
      zip_code: (*zip_code).to_owned(),
    }),
    _ => Err(DecodeError::MalformedAddress {
      parts:   parts.len(),
      address: raw.to_owned(),
    }),
  }
}

/// Whole calendar years from `dob` to `as_of`.
pub fn age_on(dob: NaiveDate, as_of: NaiveDate) -> Option<u32> { as_of.years_since(dob) }

/// Floor an age to its decade: 27 → 20, 30 → 30.
pub fn age_group(age: u32) -> u32 { age / 10 * 10 }

fn decode_dob(cell: &Cell) -> Result<NaiveDate, DecodeError> {
  let text = cell
    .as_text()
    .ok_or_else(|| DecodeError::InvalidDateOfBirth(cell.to_string()))?;
  NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
    .map_err(|_| DecodeError::InvalidDateOfBirth(text.to_owned()))
}

// ─── Cleansed row ────────────────────────────────────────────────────────────

/// A student row after normalisation. `name` and `sex` stay optional here;
/// the completeness check rejects them later if absent.
#[derive(Debug, Clone, PartialEq)]
pub struct CleansedStudent {
  pub uuid:                   i64,
  pub name:                   Option<String>,
  pub dob:                    NaiveDate,
  pub sex:                    Option<String>,
  pub job_id:                 i64,
  pub num_course_taken:       f64,
  pub current_career_path_id: i64,
  pub time_spent_hrs:         f64,
  pub age:                    u32,
  pub age_group:              u32,
  pub email:                  String,
  pub street:                 String,
  pub city:                   String,
  pub state:                  String,
  pub zip_code:               String,
}

/// Why a raw row was excluded from the aggregated batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuarantineReason {
  #[error("missing num_course_taken")]
  MissingCourseCount,
  #[error("missing job_id")]
  MissingJobId,
  #[error(transparent)]
  Malformed(#[from] DecodeError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quarantined {
  pub raw:    RawStudent,
  pub reason: QuarantineReason,
}

/// Output of [`cleanse_students`].
#[derive(Debug, Clone, Default)]
pub struct StudentCleanse {
  pub cleansed:    Vec<CleansedStudent>,
  pub quarantined: Vec<Quarantined>,
}

/// Cleanse one raw student row relative to the run date `as_of`.
pub fn cleanse_student(
  raw: &RawStudent,
  as_of: NaiveDate,
) -> Result<CleansedStudent, QuarantineReason> {
  let num_course_taken = raw
    .num_course_taken
    .as_f64()
    .ok_or(QuarantineReason::MissingCourseCount)?;
  let job_id = raw.job_id.as_id().ok_or(QuarantineReason::MissingJobId)?;

  let contact = raw
    .contact_info
    .as_text()
    .ok_or_else(|| DecodeError::MalformedContactInfo("missing".into()))
    .and_then(decode_contact_info)?;
  let address = split_address(&contact.mailing_address)?;

  let dob = decode_dob(&raw.dob)?;
  let age = age_on(dob, as_of)
    .ok_or_else(|| DecodeError::InvalidDateOfBirth(dob.to_string()))?;

  Ok(CleansedStudent {
    uuid: raw.uuid,
    name: raw.name.as_text().map(str::to_owned),
    dob,
    sex: raw.sex.as_text().map(str::to_owned),
    job_id,
    num_course_taken,
    current_career_path_id: raw.current_career_path_id.as_id().unwrap_or(0),
    time_spent_hrs: raw.time_spent_hrs.as_f64().unwrap_or(0.0),
    age,
    age_group: age_group(age),
    email: contact.email,
    street: address.street,
    city: address.city,
    state: address.state,
    zip_code: address.zip_code,
  })
}

/// Cleanse a batch of raw student rows, splitting them into cleansed rows and
/// quarantined rows. Input order is preserved on both sides.
pub fn cleanse_students(rows: &[RawStudent], as_of: NaiveDate) -> StudentCleanse {
  let mut out = StudentCleanse::default();
  for raw in rows {
    match cleanse_student(raw, as_of) {
      Ok(student) => out.cleansed.push(student),
      Err(reason) => {
        tracing::debug!(uuid = raw.uuid, %reason, "quarantining student row");
        out.quarantined.push(Quarantined { raw: raw.clone(), reason });
      }
    }
  }
  out
}
