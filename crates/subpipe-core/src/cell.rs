//! Loosely-typed cell values as they arrive from the source tables.
//!
//! The source columns carry no reliable type: an id can be stored as an
//! integer, a real, a numeric string, or NULL. [`Cell`] keeps the original
//! value so quarantined rows can be written back verbatim, and offers the
//! numeric coercions the cleanser needs.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Cell {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Coerce to a real number. Unparseable text, NaN and NULL are missing.
  pub fn as_f64(&self) -> Option<f64> {
    let v = match self {
      Self::Null => return None,
      Self::Integer(i) => *i as f64,
      Self::Real(r) => *r,
      Self::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    v.is_finite().then_some(v)
  }

  /// Coerce to an integer key. Values with a fractional part are missing.
  pub fn as_id(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      Self::Text(s) if s.trim().parse::<i64>().is_ok() => s.trim().parse().ok(),
      _ => {
        let v = self.as_f64()?;
        (v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64)
          .then_some(v as i64)
      }
    }
  }

  /// Borrow the text content. Only NULL and non-text cells are missing; an
  /// empty string is a value.
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl From<i64> for Cell {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<f64> for Cell {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<&str> for Cell {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Cell {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

impl fmt::Display for Cell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => Ok(()),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Real(r) => write!(f, "{r:?}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_text_coerces() {
    assert_eq!(Cell::from("12").as_id(), Some(12));
    assert_eq!(Cell::from(" 3.0 ").as_f64(), Some(3.0));
    assert_eq!(Cell::from("3.0").as_id(), Some(3));
  }

  #[test]
  fn garbage_and_null_are_missing() {
    assert_eq!(Cell::from("n/a").as_f64(), None);
    assert_eq!(Cell::Null.as_id(), None);
    assert_eq!(Cell::Real(f64::NAN).as_f64(), None);
  }

  #[test]
  fn fractional_id_is_missing() {
    assert_eq!(Cell::Real(2.5).as_id(), None);
    assert_eq!(Cell::Real(7.0).as_id(), Some(7));
  }

  #[test]
  fn real_display_keeps_decimal_point() {
    assert_eq!(Cell::Real(4.0).to_string(), "4.0");
    assert_eq!(Cell::Null.to_string(), "");
  }
}
