//! Where the browser keeps its settings database and logs.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const LATEST_LOG: &str = "latest.log";

/// Archived logs kept next to `latest.log`.
const KEPT_LOGS: usize = 25;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "datagrid", "datagrid")
}

/// Settings database holding column widths, under the platform data dir
/// (`~/.local/share/datagrid` on Linux).
pub fn settings_db() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("settings.db"))
}

/// Log file for this run, under the platform cache dir (`~/.cache/datagrid`
/// on Linux).
pub fn log_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join(LATEST_LOG))
}

/// Creates the directory `path` lives in.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir),
        None => Ok(()),
    }
}

/// Moves the previous run's log aside and drops the oldest archives.
///
/// Must run before the new log file is created.
pub fn rotate_logs() {
    let Some(latest) = log_file() else { return };
    let Some(dir) = latest.parent() else { return };

    if latest.exists() {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        if let Err(e) = fs::rename(&latest, dir.join(format!("{}.log", stamp))) {
            eprintln!("warning: cannot archive {}: {}", latest.display(), e);
        }
    }

    prune_logs(dir, KEPT_LOGS);
}

/// Deletes archived logs in `dir` until at most `keep` remain.
///
/// Archive names are timestamps, so name order is age order.
fn prune_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut archived: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && path.file_name().is_some_and(|name| name != LATEST_LOG)
        })
        .collect();
    archived.sort();

    let excess = archived.len().saturating_sub(keep);
    for path in &archived[..excess] {
        let _ = fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_newest_archives() {
        let dir = std::env::temp_dir().join(format!("datagrid-prune-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["20240101_000000.log", "20240102_000000.log", "20240103_000000.log", LATEST_LOG, "notes.txt"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        prune_logs(&dir, 2);

        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["20240102_000000.log", "20240103_000000.log", LATEST_LOG, "notes.txt"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_ensure_parent_reports_failure() {
        let dir = std::env::temp_dir().join(format!("datagrid-parent-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("blocker");
        fs::write(&blocker, b"").unwrap();

        assert!(ensure_parent(&dir.join("nested").join("settings.db")).is_ok());
        assert!(dir.join("nested").is_dir());
        // A regular file where a directory is needed.
        assert!(ensure_parent(&blocker.join("settings.db")).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
