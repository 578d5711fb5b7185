//! Watch directory discovery.
//!
//! Expected layout: `<watch_dir>/<Series Name>/<disc>` where `<disc>` is either
//! a disc folder (BDMV / VIDEO_TS backup) or an `.iso` image. The disc entry
//! name doubles as its volume label.

use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::types::DiscoveredDisc;
use crate::volume_label;

/// Derive a filesystem-safe series key from a display name.
///
/// `"The Office (US)"` becomes `"the-office-us"`.
pub fn series_key(series_name: &str) -> String {
    let mut key = String::with_capacity(series_name.len());
    for c in series_name.chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('-') {
            key.push('-');
        }
    }
    while key.ends_with('-') {
        key.pop();
    }
    key
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_disc_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("iso"))
        .unwrap_or(false)
}

/// Walk the watch directory and list every disc, grouped by series directory.
///
/// Results are ordered by series name, then disc name.
pub async fn discover_discs(watch_dir: &Path) -> std::io::Result<Vec<DiscoveredDisc>> {
    let mut discs = Vec::new();
    let mut series_dirs = fs::read_dir(watch_dir).await?;

    while let Some(series_entry) = series_dirs.next_entry().await? {
        let series_name = series_entry.file_name().to_string_lossy().to_string();
        if is_hidden(&series_name) || !series_entry.file_type().await?.is_dir() {
            continue;
        }

        let key = series_key(&series_name);
        if key.is_empty() {
            continue;
        }

        let mut disc_entries = fs::read_dir(series_entry.path()).await?;
        while let Some(disc_entry) = disc_entries.next_entry().await? {
            let file_name = disc_entry.file_name().to_string_lossy().to_string();
            if is_hidden(&file_name) {
                continue;
            }

            let path = disc_entry.path();
            let file_type = disc_entry.file_type().await?;
            let name = if file_type.is_dir() {
                file_name
            } else if is_disc_image(&path) {
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or(file_name)
            } else {
                continue;
            };

            debug!("Discovered disc '{}' for series '{}'", name, series_name);
            discs.push(DiscoveredDisc {
                series_key: key.clone(),
                series_name: series_name.clone(),
                hint: volume_label::parse(&name),
                name,
                path,
            });
        }
    }

    discs.sort_by(|a, b| {
        a.series_name
            .cmp(&b.series_name)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(discs)
}
