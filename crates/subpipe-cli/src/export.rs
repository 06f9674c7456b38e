//! CSV snapshot of the aggregated table. Overwritten on every export; it is a
//! convenience copy, not authoritative state.

use std::path::Path;

use anyhow::Context as _;
use subpipe_core::merge::{AGGREGATED_COLUMNS, AggregatedRecord};

pub fn write_snapshot(path: &Path, records: &[AggregatedRecord]) -> anyhow::Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let mut writer = csv::Writer::from_path(path)
    .with_context(|| format!("failed to open {}", path.display()))?;
  writer.write_record(AGGREGATED_COLUMNS.iter().map(|(name, _)| *name))?;
  for record in records {
    writer.write_record(record.cells().iter().map(ToString::to_string))?;
  }
  writer.flush()?;

  tracing::info!(path = %path.display(), rows = records.len(), "wrote csv snapshot");
  Ok(())
}
