//! Human-readable changelog, newest entry first.
//!
//! ```text
//! ## 0.0.3
//! ### Added
//! - 12 more data to database of raw data
//! - 2 new missing data to incomplete_data table
//! ```

use std::{io, path::Path};

/// The revision after the newest numbered entry in `contents`; 1 if there is
/// none. Headings without a revision number (`## Unreleased`) are skipped.
pub fn next_revision(contents: &str) -> u32 {
  contents
    .lines()
    .filter_map(|l| l.strip_prefix("## "))
    .find_map(|v| v.trim().rsplit('.').next()?.parse::<u32>().ok())
    .map_or(1, |n| n + 1)
}

pub fn render_entry(revision: u32, aggregated: usize, quarantined: usize) -> String {
  format!(
    "## 0.0.{revision}\n\
     ### Added\n\
     - {aggregated} more data to database of raw data\n\
     - {quarantined} new missing data to incomplete_data table\n\
     \n"
  )
}

/// Put a new entry at the top of the changelog, keeping every prior entry.
/// Returns the revision written.
pub fn prepend_entry(path: &Path, aggregated: usize, quarantined: usize) -> io::Result<u32> {
  let existing = match std::fs::read_to_string(path) {
    Ok(s) => s,
    Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
    Err(e) => return Err(e),
  };

  let revision = next_revision(&existing);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, render_entry(revision, aggregated, quarantined) + &existing)?;
  Ok(revision)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_changelog_starts_at_one() {
    assert_eq!(next_revision(""), 1);
    assert_eq!(next_revision("# Changelog\n"), 1);
  }

  #[test]
  fn revision_uses_full_number() {
    assert_eq!(next_revision("## 0.0.9\n### Added\n"), 10);
    assert_eq!(next_revision("## 0.0.12\n"), 13);
  }

  #[test]
  fn newest_heading_wins() {
    assert_eq!(next_revision("## 0.0.4\n- x\n\n## 0.0.3\n- y\n"), 5);
  }

  #[test]
  fn unnumbered_heading_is_skipped() {
    assert_eq!(next_revision("## Unreleased\n- wip\n\n## 0.0.7\n- y\n"), 8);
  }

  #[test]
  fn entries_are_prepended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("changelog.md");

    assert_eq!(prepend_entry(&path, 10, 2).unwrap(), 1);
    assert_eq!(prepend_entry(&path, 3, 0).unwrap(), 2);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("## 0.0.2\n### Added\n- 3 more data"));
    assert!(text.contains("## 0.0.1\n### Added\n- 10 more data to database of raw data\n- 2 new missing"));
  }
}
