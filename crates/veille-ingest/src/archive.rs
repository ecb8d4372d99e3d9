//! Post-run archiving of consumed snapshot files.

use std::{
  fs, io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

/// Move a consumed snapshot into `archive_dir` under a timestamped name.
///
/// `clp_annex_vi.json` archived at 2024-03-01 06:00 UTC becomes
/// `clp_annex_vi_20240301_060000.json`. Falls back to copy-and-remove when a
/// plain rename crosses filesystems.
pub fn archive_snapshot(
  source: &Path,
  archive_dir: &Path,
  list: &str,
  run_at: DateTime<Utc>,
) -> io::Result<PathBuf> {
  fs::create_dir_all(archive_dir)?;

  let stamp = run_at.format("%Y%m%d_%H%M%S");
  let extension =
    source.extension().and_then(|e| e.to_str()).unwrap_or("json");
  let dest = archive_dir.join(format!("{list}_{stamp}.{extension}"));

  match fs::rename(source, &dest) {
    Ok(()) => Ok(dest),
    Err(_) => {
      fs::copy(source, &dest)?;
      fs::remove_file(source)?;
      Ok(dest)
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
