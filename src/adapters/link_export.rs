use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// `<account>-<n>dev-<YYYY-MM-DD>.txt`
pub fn export_file_name(account: &str, device_count: usize, date: NaiveDate) -> String {
    format!("{account}-{device_count}dev-{}.txt", date.format("%Y-%m-%d"))
}

/// Writes the rendered link listing into `dir`, replacing an export from the same day.
pub fn write_export(
    dir: &Path,
    account: &str,
    device_count: usize,
    date: NaiveDate,
    content: &str,
) -> std::io::Result<PathBuf> {
    let path = dir.join(export_file_name(account, device_count, date));
    std::fs::write(&path, content)?;

    tracing::info!(path = %path.display(), device_count, "saved device links");
    Ok(path)
}
