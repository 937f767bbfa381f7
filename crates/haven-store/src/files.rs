//! Filesystem helpers shared by the store and the backup manager

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Temp files older than this are left over from a crashed write.
pub(crate) const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to `path` via a sibling temp file, fsync, then rename, so
/// readers see either the old content or the new content in full.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    let result = write_synced(&tmp, bytes).and_then(|_| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()
}

/// `<name>.tmp.<pid>.<n>`: unique per write, so concurrent writers of the
/// same target never share a temp file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    name.push(format!(".tmp.{}.{}", std::process::id(), n));
    path.with_file_name(name)
}

fn is_temp_name(name: &str) -> bool {
    name.contains(".tmp.") || name.ends_with(".tmp")
}

/// Delete temp files in `dir` last modified more than `older_than` ago.
/// Returns how many were removed. A missing directory has none.
pub(crate) fn remove_stale_temps(dir: &Path, older_than: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    for file in list_files(dir, is_temp_name)? {
        let age = now.duration_since(file.modified).unwrap_or_default();
        if age < older_than {
            continue;
        }
        match fs::remove_file(&file.path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

/// File metadata for one directory entry.
pub(crate) struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: std::time::SystemTime,
}

/// Regular files in `dir` whose name satisfies `keep`. A missing directory
/// is an empty listing.
pub(crate) fn list_files<F>(dir: &Path, keep: F) -> io::Result<Vec<DirEntryInfo>>
where
    F: Fn(&str) -> bool,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !keep(&name) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        files.push(DirEntryInfo {
            name,
            path: entry.path(),
            size: metadata.len(),
            modified: metadata.modified()?,
        });
    }
    Ok(files)
}

/// Newest first: modification time, then name (names embed the timestamp).
pub(crate) fn sort_newest_first(files: &mut [DirEntryInfo]) {
    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
}
