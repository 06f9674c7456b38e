//! Delta detection: which source rows are not yet persisted.
//!
//! The persisted key set is re-read from the output store on every run; there
//! is no cursor carried between runs.

use std::collections::HashSet;
use std::hash::Hash;

/// Keep the rows whose key is absent from `persisted`.
pub fn new_rows<T, K, F>(rows: Vec<T>, persisted: &HashSet<K>, key: F) -> Vec<T>
where
  K: Eq + Hash,
  F: Fn(&T) -> K,
{
  if persisted.is_empty() {
    return rows;
  }
  rows.into_iter().filter(|r| !persisted.contains(&key(r))).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_persisted_set_keeps_everything() {
    let out = new_rows(vec![1, 2, 3], &HashSet::new(), |r| *r);
    assert_eq!(out, vec![1, 2, 3]);
  }

  #[test]
  fn persisted_keys_are_filtered_out() {
    let persisted: HashSet<i64> = [2, 3].into();
    let out = new_rows(vec![(1, "a"), (2, "b"), (3, "c"), (4, "d")], &persisted, |r| r.0);
    assert_eq!(out, vec![(1, "a"), (4, "d")]);
  }

  #[test]
  fn fully_persisted_source_yields_nothing() {
    let persisted: HashSet<i64> = [1, 2].into();
    assert!(new_rows(vec![1, 2], &persisted, |r| *r).is_empty());
  }
}
