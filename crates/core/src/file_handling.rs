//! Reading and writing the bookmark store.
//!
//! Every save first copies the current file to a timestamped backup next to
//! it, then replaces the file through a temporary sibling and a rename.
//! Backups are pruned to the newest [`MAX_BACKUPS`] by file name.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info, warn};

use crate::bookmarks::Bookmarks;
use crate::config::{BACKUP_SUFFIX, BACKUP_TIMESTAMP_FORMAT, MAX_BACKUPS};
use crate::error::{Error, Result};

const STORE_DESCRIPTION: &str = "bookmarks";
const BACKUP_DESCRIPTION: &str = "backup";

fn parse_bookmarks(content: &str, path: &str, file_description: &str) -> Result<Bookmarks> {
    if content.trim().is_empty() {
        return Ok(Bookmarks::new());
    }

    serde_yaml::from_str(content)
        .map_err(|e| Error::yaml_error("reading", file_description, path, e))
}

/// Loads the store from `path`.
///
/// A missing file yields an empty store. Commands without an ID are given
/// one.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not a valid
/// bookmark document.
pub fn load_bookmarks(path: &str) -> Result<Bookmarks> {
    if !Path::new(path).exists() {
        debug!("No bookmark file at `{path}`, starting empty");
        return Ok(Bookmarks::new());
    }

    let content =
        fs::read_to_string(path).map_err(|e| Error::io_error(STORE_DESCRIPTION, path, e))?;
    let mut bookmarks = parse_bookmarks(&content, path, STORE_DESCRIPTION)?;
    bookmarks.migrate_ids();

    debug!(
        "Loaded {} groups from `{path}` (next id {})",
        bookmarks.groups.len(),
        bookmarks.next_id
    );
    Ok(bookmarks)
}

/// Saves the store to `path`, keeping up to [`MAX_BACKUPS`] backups.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the backup cannot be
/// written, or the new content cannot be written.
pub fn save_bookmarks(path: &str, bookmarks: &Bookmarks) -> Result<()> {
    save_bookmarks_keeping(path, bookmarks, MAX_BACKUPS)
}

/// [`save_bookmarks`] with an explicit backup retention count.
///
/// # Errors
///
/// See [`save_bookmarks`].
pub fn save_bookmarks_keeping(path: &str, bookmarks: &Bookmarks, max_backups: usize) -> Result<()> {
    let content = serde_yaml::to_string(bookmarks)
        .map_err(|e| Error::yaml_error("writing", STORE_DESCRIPTION, path, e))?;

    ensure_parent_dir(path)?;
    if Path::new(path).exists() {
        create_backup(path, max_backups)?;
    }
    write_replacing(path, &content)?;

    info!("Saved bookmarks to `{path}`");
    Ok(())
}

fn ensure_parent_dir(path: &str) -> Result<()> {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| Error::io_error("config directory", &parent.to_string_lossy(), e)),
        _ => Ok(()),
    }
}

fn write_replacing(path: &str, content: &str) -> Result<()> {
    let temp_path = format!("{path}.tmp");
    fs::write(&temp_path, content).map_err(|e| Error::io_error(STORE_DESCRIPTION, &temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io_error(STORE_DESCRIPTION, path, e));
    }
    Ok(())
}

fn backup_prefix(path: &str) -> String {
    let base = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{base}{BACKUP_SUFFIX}")
}

fn backup_dir(path: &str) -> PathBuf {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn next_backup_path(path: &str) -> PathBuf {
    let stamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);
    let candidate = PathBuf::from(format!("{path}{BACKUP_SUFFIX}{stamp}"));
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|n| PathBuf::from(format!("{path}{BACKUP_SUFFIX}{stamp}-{n}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

fn create_backup(path: &str, max_backups: usize) -> Result<()> {
    let backup_path = next_backup_path(path);
    fs::copy(path, &backup_path)
        .map_err(|e| Error::io_error(BACKUP_DESCRIPTION, &backup_path.to_string_lossy(), e))?;
    debug!("Backed up `{path}` to `{}`", backup_path.display());

    prune_backups(path, max_backups)
}

fn prune_backups(path: &str, max_backups: usize) -> Result<()> {
    let backups = list_backups(path)?;
    if backups.len() <= max_backups {
        return Ok(());
    }

    let excess = backups.len() - max_backups;
    for old in &backups[..excess] {
        fs::remove_file(old)
            .map_err(|e| Error::io_error(BACKUP_DESCRIPTION, &old.to_string_lossy(), e))?;
    }
    debug!("Pruned {excess} old backups of `{path}`");
    Ok(())
}

/// Lists the backups of the store at `path`, oldest first.
///
/// # Errors
///
/// Returns an error if the containing directory cannot be read.
pub fn list_backups(path: &str) -> Result<Vec<PathBuf>> {
    let dir = backup_dir(path);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = backup_prefix(path);
    let entries =
        fs::read_dir(&dir).map_err(|e| Error::io_error("config directory", &dir.to_string_lossy(), e))?;

    let mut backups: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        .map(|entry| entry.path())
        .collect();
    backups.sort();
    Ok(backups)
}

/// Replaces the store at `path` with the content of `backup_path`.
///
/// The backup must belong to `path` and hold a valid bookmark document. The
/// current file is itself backed up first.
///
/// # Errors
///
/// Returns [`Error::InvalidBackup`] for a foreign or malformed backup, or an
/// IO error when reading or writing fails.
pub fn restore_backup(path: &str, backup_path: &str) -> Result<()> {
    let prefix = backup_prefix(path);
    let belongs = Path::new(backup_path)
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(&prefix));
    if !belongs {
        return Err(Error::InvalidBackup(backup_path.to_string()));
    }

    let content = fs::read_to_string(backup_path)
        .map_err(|e| Error::io_error(BACKUP_DESCRIPTION, backup_path, e))?;
    if let Err(e) = parse_bookmarks(&content, backup_path, BACKUP_DESCRIPTION) {
        warn!("Refusing to restore `{backup_path}`: {e}");
        return Err(Error::InvalidBackup(backup_path.to_string()));
    }

    ensure_parent_dir(path)?;
    if Path::new(path).exists() {
        create_backup(path, MAX_BACKUPS)?;
    }
    write_replacing(path, &content)?;

    info!("Restored `{path}` from `{backup_path}`");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::ActionType;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn store_path(dir: &TempDir) -> String {
        dir.path().join("config.yaml").to_string_lossy().into_owned()
    }

    fn sample_store() -> Bookmarks {
        let mut store = Bookmarks::new();
        store.add_group("docker").unwrap();
        store
            .add_command(
                "docker",
                "ps",
                "docker ps -a",
                Some("List containers".to_string()),
                ActionType::Copy,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_load_missing_file_is_empty_store() {
        let store = load_bookmarks("/this/path/does/not/exist.yaml").unwrap();
        assert!(store.groups.is_empty());
        assert_eq!(store.next_id, 1);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "groups: [").unwrap();
        let result = load_bookmarks(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(Error::Yaml { .. })));
    }

    #[test]
    fn test_load_migrates_missing_ids() {
        let yaml_content = r"
groups:
  - name: git
    commands:
      - name: st
        command: git status
      - id: 4
        name: lg
        command: git log --oneline
";
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{yaml_content}").unwrap();

        let store = load_bookmarks(temp_file.path().to_str().unwrap()).unwrap();
        let commands = &store.group("git").unwrap().commands;
        assert_eq!(commands[0].id, 5);
        assert_eq!(commands[1].id, 4);
        assert_eq!(store.next_id, 6);
    }

    #[test]
    fn test_save_omits_empty_fields() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let mut store = Bookmarks::new();
        store.add_group("git").unwrap();
        store
            .add_command("git", "st", "git status", None, ActionType::None)
            .unwrap();

        save_bookmarks(&path, &store).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("next_id: 2"));
        assert!(!content.contains("description"));
        assert!(!content.contains("default_action"));
        assert!(!content.contains("editor"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = sample_store();

        save_bookmarks(&path, &store).unwrap();

        assert_eq!(load_bookmarks(&path).unwrap(), store);
        assert!(list_backups(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir
            .path()
            .join("nested/deeper/config.yaml")
            .to_string_lossy()
            .into_owned();

        save_bookmarks(&path, &Bookmarks::new()).unwrap();
        assert!(Path::new(&path).exists());
    }

    #[test]
    fn test_second_save_backs_up_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let mut store = sample_store();
        save_bookmarks(&path, &store).unwrap();
        let first_content = fs::read_to_string(&path).unwrap();

        store.add_group("git").unwrap();
        save_bookmarks(&path, &store).unwrap();

        let backups = list_backups(&path).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), first_content);
        assert!(backups[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("config.yaml.bak."));
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = sample_store();

        for _ in 0..6 {
            save_bookmarks_keeping(&path, &store, 3).unwrap();
        }

        assert_eq!(list_backups(&path).unwrap().len(), 3);
    }

    #[test]
    fn test_restore_backup() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let mut store = sample_store();
        save_bookmarks(&path, &store).unwrap();
        store.remove_group("docker").unwrap();
        save_bookmarks(&path, &store).unwrap();

        let backup = list_backups(&path).unwrap().remove(0);
        restore_backup(&path, &backup.to_string_lossy()).unwrap();

        let restored = load_bookmarks(&path).unwrap();
        assert!(restored.group("docker").is_some());
        assert_eq!(list_backups(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_restore_rejects_foreign_file() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let other = dir.path().join("other.yaml");
        fs::write(&other, "groups: []").unwrap();

        let result = restore_backup(&path, &other.to_string_lossy());
        assert!(matches!(result, Err(Error::InvalidBackup(_))));
    }

    #[test]
    fn test_restore_rejects_invalid_content() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let bad = dir.path().join("config.yaml.bak.20240101-000000.000000");
        fs::write(&bad, "groups: [").unwrap();

        let result = restore_backup(&path, &bad.to_string_lossy());
        assert!(matches!(result, Err(Error::InvalidBackup(_))));
        assert!(!Path::new(&path).exists());
    }
}
