use crate::index::PageIndex;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persist the full index (pages, postings, incoming-link graph, in that
/// order) as one bincode blob. Crash-consistent: the bytes go to a sibling
/// temp file, are fsynced, and then atomically renamed over the target, so a
/// crash mid-write never leaves a half-written snapshot behind.
pub fn save(index: &PageIndex, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp = tmp_path(path);
    let bytes = bincode::serialize(index).context("encode snapshot")?;
    let mut file = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

/// Restore a snapshot, or start empty. A missing file is a normal first
/// start. A truncated or undecodable file is removed and logged; losing the
/// window since the last good snapshot is accepted, a dead replica is not.
pub fn load_or_default(path: &Path) -> PageIndex {
    if !path.exists() {
        return PageIndex::new();
    }
    match try_load(path) {
        Ok(index) => index,
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "snapshot unreadable, discarding and starting empty");
            let _ = fs::remove_file(path);
            PageIndex::new()
        }
    }
}

fn try_load(path: &Path) -> Result<PageIndex> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    bincode::deserialize(&bytes).context("decode snapshot")
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}
