//! Pipeline configuration, layered from an optional TOML file and
//! `SUBPIPE_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
  /// Raw source database (opened read-only).
  pub source_path:    PathBuf,
  /// Output database holding the aggregated and quarantine tables.
  pub output_path:    PathBuf,
  /// CSV snapshot of the aggregated table, rewritten after each append.
  pub export_path:    PathBuf,
  pub changelog_path: PathBuf,
}

impl PipelineConfig {
  /// Load from `file` (if it exists) overlaid with the environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("source_path", "dev/cademycode.db")?
      .set_default("output_path", "prod/cademycode_cleansed.db")?
      .set_default("export_path", "prod/cademycode_cleansed.csv")?
      .set_default("changelog_path", "prod/changelog.md")?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("SUBPIPE"))
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise PipelineConfig")?;

    Ok(Self {
      source_path:    expand_tilde(&cfg.source_path),
      output_path:    expand_tilde(&cfg.output_path),
      export_path:    expand_tilde(&cfg.export_path),
      changelog_path: expand_tilde(&cfg.changelog_path),
    })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.source_path, PathBuf::from("dev/cademycode.db"));
    assert_eq!(cfg.output_path, PathBuf::from("prod/cademycode_cleansed.db"));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("subpipe.toml");
    std::fs::write(&file, "source_path = \"/data/raw.db\"\nexport_path = \"/data/out.csv\"\n")
      .unwrap();

    let cfg = PipelineConfig::load(&file).unwrap();
    assert_eq!(cfg.source_path, PathBuf::from("/data/raw.db"));
    assert_eq!(cfg.export_path, PathBuf::from("/data/out.csv"));
    assert_eq!(cfg.changelog_path, PathBuf::from("prod/changelog.md"));
  }

  #[test]
  fn relative_paths_are_left_alone() {
    assert_eq!(expand_tilde(Path::new("a/b.db")), PathBuf::from("a/b.db"));
  }
}
