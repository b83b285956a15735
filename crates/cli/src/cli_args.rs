//! Command-line argument parsing.
//!
//! This module defines the command-line interface structure using the
//! `clap` crate. Running `bkmk` without a subcommand opens the interactive
//! session.

use clap::{Parser, Subcommand};

const AFTER_HELP: &str = "\
Session keys:
  j/k, up/down   Navigate
  enter, tab     Select group / run or copy command
  /              Search all commands (fuzzy)
  s              Show all bookmarks
  h              Browse shell history
  a / e / d      Add, edit or delete
  o              Open the bookmark file in your editor
  esc            Go back
  q, ctrl+c      Quit

Examples:
  bkmk add-group docker
  bkmk add docker ps \"docker ps -a\" List all containers
  bkmk last";

/// Command-line arguments for the bkmk tool.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use bkmk_cli::cli_args::Args;
///
/// let args = Args::parse_from(["bkmk", "list"]);
/// assert!(args.command.is_some());
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(name = "bkmk", about = "Command bookmark manager", after_help = AFTER_HELP)]
#[command(term_width = 0)] // Just to make testing across clap features easier
pub struct Args {
    /// Path to the bookmark YAML file.
    ///
    /// If not provided, defaults to `~/.config/bkmk/config.yaml`.
    #[arg(long, short = 'c', global = true)]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Action>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Action {
    /// Create a new group
    #[command(visible_alias = "ag")]
    AddGroup { name: String },

    /// Add a command to a group
    #[command(visible_alias = "a")]
    Add {
        group: String,
        name: String,
        command: String,
        /// Optional description; remaining words are joined with spaces
        #[arg(trailing_var_arg = true)]
        description: Vec<String>,
    },

    /// Remove a group and all its commands
    #[command(visible_alias = "rg")]
    RemoveGroup { name: String },

    /// Remove a command by name or ID
    #[command(visible_alias = "rm")]
    Remove { group: String, name_or_id: String },

    /// List all groups and commands
    #[command(visible_alias = "ls")]
    List,

    /// Browse shell history to add commands
    #[command(visible_alias = "hist")]
    History,

    /// Bookmark the last command from shell history
    Last,

    /// Show frequently used commands worth bookmarking
    #[command(visible_alias = "freq")]
    Suggest,

    /// List backups of the bookmark file, oldest first
    Backups,

    /// Restore the bookmark file from a backup
    Restore { backup_file: String },

    /// Show version information
    Version,
}

impl Action {
    /// Description words joined into one optional string.
    #[must_use]
    pub fn joined_description(words: &[String]) -> Option<String> {
        let joined = words.join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["bkmk"]);

        assert!(args.config_path.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_config_path_is_global() {
        let args = Args::parse_from(["bkmk", "list", "-c", "/custom/config.yaml"]);
        assert_eq!(args.config_path, Some("/custom/config.yaml".to_string()));
        assert_eq!(args.command, Some(Action::List));

        let args = Args::parse_from(["bkmk", "--config-path", "/other.yaml"]);
        assert_eq!(args.config_path, Some("/other.yaml".to_string()));
    }

    #[test]
    fn test_args_aliases() {
        for (alias, expected) in [
            ("ls", Action::List),
            ("hist", Action::History),
            ("freq", Action::Suggest),
        ] {
            let args = Args::parse_from(["bkmk", alias]);
            assert_eq!(args.command, Some(expected));
        }

        let args = Args::parse_from(["bkmk", "ag", "docker"]);
        assert_eq!(
            args.command,
            Some(Action::AddGroup {
                name: "docker".to_string()
            })
        );

        let args = Args::parse_from(["bkmk", "rm", "docker", "3"]);
        assert_eq!(
            args.command,
            Some(Action::Remove {
                group: "docker".to_string(),
                name_or_id: "3".to_string()
            })
        );
    }

    #[test]
    fn test_args_add_with_description_words() {
        let args = Args::parse_from([
            "bkmk",
            "add",
            "docker",
            "ps",
            "docker ps -a",
            "List",
            "all",
            "containers",
        ]);

        let Some(Action::Add {
            group,
            name,
            command,
            description,
        }) = args.command
        else {
            panic!("Expected add action");
        };
        assert_eq!(group, "docker");
        assert_eq!(name, "ps");
        assert_eq!(command, "docker ps -a");
        assert_eq!(
            Action::joined_description(&description),
            Some("List all containers".to_string())
        );
        assert_eq!(Action::joined_description(&[]), None);
    }

    #[test]
    fn test_args_missing_required() {
        assert!(Args::try_parse_from(["bkmk", "add", "docker"]).is_err());
        assert!(Args::try_parse_from(["bkmk", "remove-group"]).is_err());
        assert!(Args::try_parse_from(["bkmk", "bogus"]).is_err());
    }
}
