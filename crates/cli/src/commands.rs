//! Subcommand dispatch.
//!
//! Each [`Action`] is handled here. Output is built by small formatting
//! functions so it can be checked without a terminal.

use std::fmt::Write as _;
use std::path::PathBuf;

use log::{debug, info};

use bkmk_core::bookmarks::{ActionType, Bookmarks, FlatCommand};
use bkmk_core::config::get_config_path;
use bkmk_core::error::{Error, Result};
use bkmk_core::execution::run_shell_command;
use bkmk_core::file_handling::{list_backups, load_bookmarks, restore_backup, save_bookmarks};
use bkmk_core::frequency::{analyze_frequency, FrequentCommand};
use bkmk_core::history::{read_history, HistoryEntry};

use crate::cli_args::{Action, Args};
use crate::session::ui::run_session;
use crate::session::{ActionResult, Session, SystemBackend};

/// Analysis window of `suggest`, in days.
pub const SUGGEST_DAYS: i64 = 60;
pub const SUGGEST_MIN_ARGS: usize = 2;
pub const SUGGEST_LIMIT: usize = 20;

/// History entries scanned by `last` for a command that is not ours.
pub const LAST_SCAN_LIMIT: usize = 20;

const OWN_COMMAND_PREFIX: &str = "bkmk";

/// How an interactive session starts.
enum Launch {
    Browse,
    History,
    LastCommand(String),
}

/// Runs the requested subcommand, or the interactive session when none is
/// given.
///
/// # Errors
///
/// Returns an error when the store or history cannot be read or written,
/// the requested group or command does not exist, or a command fails.
pub fn dispatch(args: Args) -> Result<()> {
    let config_path = get_config_path(&args.config_path);
    debug!("Config path: `{config_path}`");

    let Some(action) = args.command else {
        return interactive(&config_path, Launch::Browse);
    };

    match action {
        Action::AddGroup { name } => {
            modify_store(&config_path, |bookmarks| bookmarks.add_group(&name))?;
            println!("Group {name:?} created");
        }
        Action::Add {
            group,
            name,
            command,
            description,
        } => {
            let description = Action::joined_description(&description);
            modify_store(&config_path, |bookmarks| {
                bookmarks
                    .add_command(&group, &name, &command, description, ActionType::None)
                    .map(|_| ())
            })?;
            println!("Command {name:?} added to group {group:?}");
        }
        Action::RemoveGroup { name } => {
            modify_store(&config_path, |bookmarks| bookmarks.remove_group(&name))?;
            println!("Group {name:?} removed");
        }
        Action::Remove { group, name_or_id } => {
            modify_store(&config_path, |bookmarks| {
                bookmarks.remove_command(&group, &name_or_id)
            })?;
            println!("Command {name_or_id:?} removed from group {group:?}");
        }
        Action::List => print!("{}", format_list(&load_bookmarks(&config_path)?)),
        Action::History => interactive(&config_path, Launch::History)?,
        Action::Last => {
            let entries = read_history(LAST_SCAN_LIMIT)?;
            let command = pick_last_command(&entries).ok_or(Error::NoRecentCommand)?;
            info!("Bookmarking last command `{command}`");
            interactive(&config_path, Launch::LastCommand(command))?;
        }
        Action::Suggest => {
            let commands = analyze_frequency(SUGGEST_DAYS, SUGGEST_MIN_ARGS, SUGGEST_LIMIT)?;
            print!("{}", format_suggestions(&commands));
        }
        Action::Backups => print!("{}", format_backups(&config_path, &list_backups(&config_path)?)),
        Action::Restore { backup_file } => {
            restore_backup(&config_path, &backup_file)?;
            println!("Restored {config_path} from {backup_file}");
        }
        Action::Version => println!("bkmk {}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

/// Loads the store, applies `change` and saves it.
fn modify_store(config_path: &str, change: impl FnOnce(&mut Bookmarks) -> Result<()>) -> Result<()> {
    let mut bookmarks = load_bookmarks(config_path)?;
    change(&mut bookmarks)?;
    save_bookmarks(config_path, &bookmarks)
}

fn interactive(config_path: &str, launch: Launch) -> Result<()> {
    let bookmarks = load_bookmarks(config_path)?;
    let backend = Box::new(SystemBackend::new(config_path.to_string()));

    let mut session = match launch {
        Launch::Browse => Session::new(bookmarks, backend),
        Launch::History => Session::with_history(bookmarks, backend),
        Launch::LastCommand(command) => Session::with_last_command(bookmarks, backend, command),
    };

    run_session(&mut session)?;

    let Some(selected) = session.selected() else {
        return Ok(());
    };
    if let Some(message) = outcome_message(selected, session.action_result()) {
        println!("{message}");
    }
    match session.action_result() {
        ActionResult::Run => run_shell_command(&selected.command),
        ActionResult::Copy | ActionResult::None => Ok(()),
    }
}

/// What to tell the user about the command chosen in the session.
#[must_use]
pub fn outcome_message(selected: &FlatCommand, result: ActionResult) -> Option<String> {
    match result {
        ActionResult::Run => Some(format!("Running: {}", selected.command)),
        ActionResult::Copy => Some(format!("Copied to clipboard: {}", selected.command)),
        ActionResult::None => None,
    }
}

/// The most recent history command that is not a bkmk invocation.
#[must_use]
pub fn pick_last_command(entries: &[HistoryEntry]) -> Option<String> {
    entries
        .iter()
        .find(|entry| !entry.command.starts_with(OWN_COMMAND_PREFIX))
        .map(|entry| entry.command.clone())
}

#[must_use]
pub fn format_list(bookmarks: &Bookmarks) -> String {
    if bookmarks.groups.is_empty() {
        return "No groups configured.\n".to_string();
    }

    let mut output = String::new();
    for group in &bookmarks.groups {
        let _ = writeln!(output, "\n[{}]", group.name);
        if group.commands.is_empty() {
            output.push_str("  (no commands)\n");
            continue;
        }
        for command in &group.commands {
            let _ = writeln!(output, "  {command}");
            if let Some(description) = &command.description {
                let _ = writeln!(output, "      # {description}");
            }
        }
    }
    output.push('\n');
    output
}

#[must_use]
pub fn format_suggestions(commands: &[FrequentCommand]) -> String {
    if commands.is_empty() {
        return format!(
            "No frequently used commands found matching criteria.\n\
             (Looking for commands with {SUGGEST_MIN_ARGS}+ arguments from the last {SUGGEST_DAYS} days)\n"
        );
    }

    let mut output = String::from("Frequently used commands (good candidates for bookmarking):\n\n");
    for (i, command) in commands.iter().enumerate() {
        let _ = writeln!(output, "{:2}. [{}x] {}", i + 1, command.count, command.command);
    }
    output.push_str("\nAdd one with: bkmk add <group> \"<name>\" \"<command>\"\n");
    output
}

#[must_use]
pub fn format_backups(config_path: &str, backups: &[PathBuf]) -> String {
    if backups.is_empty() {
        return format!("No backups of {config_path} found.\n");
    }

    backups
        .iter()
        .map(|path| format!("{}\n", path.display()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(command: &str, index: usize) -> HistoryEntry {
        HistoryEntry {
            command: command.to_string(),
            index,
            timestamp: None,
        }
    }

    #[test]
    fn test_format_list() {
        let mut store = Bookmarks::new();
        assert_eq!(format_list(&store), "No groups configured.\n");

        store.add_group("docker").unwrap();
        store.add_group("empty").unwrap();
        store
            .add_command(
                "docker",
                "ps",
                "docker ps -a",
                Some("List containers".to_string()),
                ActionType::None,
            )
            .unwrap();

        assert_eq!(
            format_list(&store),
            "\n[docker]\n  [1] ps: docker ps -a\n      # List containers\n\n[empty]\n  (no commands)\n\n"
        );
    }

    #[test]
    fn test_format_suggestions() {
        let empty = format_suggestions(&[]);
        assert!(empty.starts_with("No frequently used commands found matching criteria."));
        assert!(empty.contains("2+ arguments from the last 60 days"));

        let output = format_suggestions(&[FrequentCommand {
            command: "docker ps --all".to_string(),
            count: 3,
        }]);
        assert!(output.contains("\n 1. [3x] docker ps --all\n"));
        assert!(output.ends_with("Add one with: bkmk add <group> \"<name>\" \"<command>\"\n"));
    }

    #[test]
    fn test_pick_last_command_skips_own_invocations() {
        let entries = [entry("bkmk last", 0), entry("bkmk ls", 1), entry("make test", 2)];
        assert_eq!(pick_last_command(&entries), Some("make test".to_string()));
        assert_eq!(pick_last_command(&entries[..2]), None);
    }

    #[test]
    fn test_outcome_message() {
        let selected = FlatCommand {
            id: 1,
            group_name: "docker".to_string(),
            name: "ps".to_string(),
            command: "docker ps -a".to_string(),
            description: String::new(),
            default_action: ActionType::None,
        };
        assert_eq!(
            outcome_message(&selected, ActionResult::Run).as_deref(),
            Some("Running: docker ps -a")
        );
        assert_eq!(
            outcome_message(&selected, ActionResult::Copy).as_deref(),
            Some("Copied to clipboard: docker ps -a")
        );
        assert_eq!(outcome_message(&selected, ActionResult::None), None);
    }

    #[test]
    fn test_format_backups() {
        assert_eq!(
            format_backups("/tmp/c.yaml", &[]),
            "No backups of /tmp/c.yaml found.\n"
        );
        assert_eq!(
            format_backups("/tmp/c.yaml", &[PathBuf::from("/tmp/c.yaml.bak.1")]),
            "/tmp/c.yaml.bak.1\n"
        );
    }
}
