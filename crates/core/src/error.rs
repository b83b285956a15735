use thiserror::Error;

use crate::bookmarks::CommandId;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`], used by callers that only care
/// whether a failure was a lookup miss, a collision, bad input, storage or
/// a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    Validation,
    Io,
    Process,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("group {:?} not found", .0)]
    GroupNotFound(String),

    #[error("command {:?} not found in group {:?}", .command, .group)]
    CommandNotFound { group: String, command: String },

    #[error("command with ID {} not found", .0)]
    CommandIdNotFound(CommandId),

    #[error("no shell history file found (checked $HISTFILE, ~/.zsh_history, ~/.bash_history, ~/.history)")]
    HistoryNotFound,

    #[error("no commands found in shell history (excluding bkmk commands)")]
    NoRecentCommand,

    #[error("group {:?} already exists", .0)]
    DuplicateGroup(String),

    #[error("command {:?} already exists in group {:?}", .command, .group)]
    DuplicateCommand { group: String, command: String },

    #[error("{} name cannot be empty", .0)]
    EmptyName(&'static str),

    #[error("unknown default action {:?} (expected none, copy or run)", .0)]
    InvalidAction(String),

    #[error("io error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("error {} {} file at `{}`: {}", .action, .file_description, .path, .original)]
    Yaml {
        action: String,
        file_description: String,
        path: String,
        original: serde_yaml::Error,
    },

    #[error("invalid backup file: {}", .0)]
    InvalidBackup(String),

    #[error("sub process exited with a non-success code")]
    SubProcessExit,

    #[error("error with sub process: {}", _0)]
    SubProcess(#[from] std::io::Error),

    #[error("no clipboard utility found (install wl-clipboard, xclip or xsel)")]
    NoClipboardUtility,

    #[error("clipboard not supported on {}", .0)]
    ClipboardUnsupported(String),

    #[error("terminal error: {}", .0)]
    Terminal(std::io::Error),
}

impl Error {
    pub fn io_error(file_description: &str, path: &str, original: std::io::Error) -> Self {
        Self::Io {
            file_description: file_description.to_string(),
            path: path.to_string(),
            original,
        }
    }

    pub fn yaml_error(
        action: &str,
        file_description: &str,
        path: &str,
        original: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action: action.to_string(),
            file_description: file_description.to_string(),
            path: path.to_string(),
            original,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::GroupNotFound(_)
            | Error::CommandNotFound { .. }
            | Error::CommandIdNotFound(_)
            | Error::HistoryNotFound
            | Error::NoRecentCommand => ErrorKind::NotFound,
            Error::DuplicateGroup(_) | Error::DuplicateCommand { .. } => ErrorKind::Duplicate,
            Error::EmptyName(_) | Error::InvalidAction(_) | Error::InvalidBackup(_) => {
                ErrorKind::Validation
            }
            Error::Io { .. } | Error::Yaml { .. } | Error::Terminal(_) => ErrorKind::Io,
            Error::SubProcessExit
            | Error::SubProcess(_)
            | Error::NoClipboardUtility
            | Error::ClipboardUnsupported(_) => ErrorKind::Process,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::GroupNotFound("docker".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::HistoryNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::DuplicateCommand {
                group: "g".to_string(),
                command: "c".to_string()
            }
            .kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(Error::EmptyName("group").kind(), ErrorKind::Validation);
        assert_eq!(Error::NoClipboardUtility.kind(), ErrorKind::Process);
        assert_eq!(Error::SubProcessExit.kind(), ErrorKind::Process);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::DuplicateGroup("docker".to_string()).to_string(),
            "group \"docker\" already exists"
        );
        assert_eq!(
            Error::EmptyName("command").to_string(),
            "command name cannot be empty"
        );
        assert_eq!(
            Error::SubProcessExit.to_string(),
            "sub process exited with a non-success code"
        );
        assert!(Error::HistoryNotFound
            .to_string()
            .starts_with("no shell history file found"));
        assert!(Error::InvalidAction("often".to_string())
            .to_string()
            .starts_with("unknown default action \"often\""));
    }
}
