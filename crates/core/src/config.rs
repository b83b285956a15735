//! Configuration path utilities for bkmk.
//!
//! This module resolves the bookmark file path, the shell used to run
//! commands and the naming constants shared by the backup rotation.

use std::env;

/// Default path for the bookmark store
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/bkmk/config.yaml";

/// Default shell to use for command execution when `$SHELL` is unset
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Editor used when neither the store nor `$EDITOR` names one
pub const DEFAULT_EDITOR: &str = "vi";

/// Number of backups kept next to the store file
pub const MAX_BACKUPS: usize = 20;

/// Infix between the store file name and the backup timestamp
pub const BACKUP_SUFFIX: &str = ".bak.";

/// `chrono` format of the backup timestamp; sorts lexically by time.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";

/// Display format for history timestamps in the interactive session.
pub const HISTORY_TIME_FORMAT: &str = "%d %b %H:%M";

/// Resolves the configuration file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// configuration path. Shell expansions like `~` are resolved.
///
/// # Examples
///
/// ```
/// use bkmk_core::config::get_config_path;
///
/// let custom_path = get_config_path(&Some("/path/to/config.yaml".to_string()));
/// assert_eq!(custom_path, "/path/to/config.yaml");
/// ```
pub fn get_config_path(config_path_arg: &Option<String>) -> String {
    let config_path = match config_path_arg {
        Some(config_path) => config_path,
        None => DEFAULT_CONFIG_PATH,
    };

    shellexpand::tilde(config_path).to_string()
}

/// The user's shell, falling back to [`DEFAULT_SHELL`].
#[must_use]
pub fn shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

/// Picks the editor: the configured one, then `$EDITOR`, then [`DEFAULT_EDITOR`].
#[must_use]
pub fn resolve_editor(configured: Option<&str>) -> String {
    resolve_editor_from(configured, env::var("EDITOR").ok().as_deref())
}

pub(crate) fn resolve_editor_from(configured: Option<&str>, environment: Option<&str>) -> String {
    configured
        .filter(|e| !e.is_empty())
        .or(environment.filter(|e| !e.is_empty()))
        .unwrap_or(DEFAULT_EDITOR)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_path_with_custom_path() {
        let custom_path = Some("/custom/path/config.yaml".to_string());
        let result = get_config_path(&custom_path);
        assert_eq!(result, "/custom/path/config.yaml");
    }

    #[test]
    fn test_get_config_path_with_none() {
        let result = get_config_path(&None);
        assert!(result.ends_with("bkmk/config.yaml"));
        assert!(!result.starts_with('~'));
    }

    #[test]
    fn test_get_config_path_with_tilde() {
        let result = get_config_path(&Some("~/bookmarks.yaml".to_string()));
        assert!(!result.starts_with('~'));
        assert!(result.ends_with("bookmarks.yaml"));
    }

    #[test]
    fn test_resolve_editor_precedence() {
        assert_eq!(resolve_editor_from(Some("nvim"), Some("nano")), "nvim");
        assert_eq!(resolve_editor_from(None, Some("nano")), "nano");
        assert_eq!(resolve_editor_from(Some(""), None), "vi");
        assert_eq!(resolve_editor_from(None, Some("")), "vi");
    }

    #[test]
    fn test_backup_timestamp_sorts_lexically() {
        use chrono::TimeZone;

        let earlier = chrono::Local
            .with_ymd_and_hms(2024, 1, 9, 23, 59, 59)
            .unwrap()
            .format(BACKUP_TIMESTAMP_FORMAT)
            .to_string();
        let later = chrono::Local
            .with_ymd_and_hms(2024, 1, 10, 0, 0, 0)
            .unwrap()
            .format(BACKUP_TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(earlier, "20240109-235959.000000");
        assert!(earlier < later);
    }
}
