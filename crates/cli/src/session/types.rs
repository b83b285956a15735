//! Type definitions for the interactive session.
//!
//! This module defines the session's modes, the effects a key press can
//! request from the terminal loop, and the final outcome of a session.

use std::path::PathBuf;

use bkmk_core::bookmarks::{ActionType, CommandId, FlatCommand};

use super::input::Form;

/// What a finished session asks the caller to do with the selected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionResult {
    #[default]
    None,
    Run,
    Copy,
}

impl ActionResult {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionResult::None => "",
            ActionResult::Run => "run",
            ActionResult::Copy => "copy",
        }
    }
}

/// Follow-up requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Leave without a selection.
    Quit,
    /// Leave with [`super::Session::selected`] and its action result set.
    Finish,
    /// Suspend the terminal, edit `path`, then reload the store.
    OpenEditor {
        path: PathBuf,
        editor: Option<String>,
    },
}

/// Where an added group leads once it is saved.
#[derive(Debug, Clone, PartialEq)]
pub enum AfterGroupAdd {
    Groups,
    /// Continue bookmarking a history command into the new group.
    HistoryDetails { command: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Group(String),
    Command {
        group: String,
        id: CommandId,
        name: String,
    },
}

/// The session state machine. Each mode carries only its own data; the
/// list cursor and the derived caches live on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Groups,
    Commands,
    Search,
    AllCommands,
    AddGroup {
        form: Form,
        after: AfterGroupAdd,
    },
    EditGroup {
        form: Form,
        original: String,
    },
    AddCommand {
        form: Form,
    },
    EditCommand {
        form: Form,
        command_id: CommandId,
    },
    DeleteConfirm {
        target: DeleteTarget,
        error: Option<String>,
    },
    History,
    HistorySelectGroup {
        command: String,
    },
    HistoryAddDetails {
        form: Form,
        command: String,
        group: String,
    },
    ActionSelect {
        command: FlatCommand,
        cursor: usize,
        error: Option<String>,
    },
}

/// Fieldless mirror of [`Mode`], used to key the handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Groups,
    Commands,
    Search,
    AllCommands,
    AddGroup,
    EditGroup,
    AddCommand,
    EditCommand,
    DeleteConfirm,
    History,
    HistorySelectGroup,
    HistoryAddDetails,
    ActionSelect,
}

impl Mode {
    #[must_use]
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Groups => ModeKind::Groups,
            Mode::Commands => ModeKind::Commands,
            Mode::Search => ModeKind::Search,
            Mode::AllCommands => ModeKind::AllCommands,
            Mode::AddGroup { .. } => ModeKind::AddGroup,
            Mode::EditGroup { .. } => ModeKind::EditGroup,
            Mode::AddCommand { .. } => ModeKind::AddCommand,
            Mode::EditCommand { .. } => ModeKind::EditCommand,
            Mode::DeleteConfirm { .. } => ModeKind::DeleteConfirm,
            Mode::History => ModeKind::History,
            Mode::HistorySelectGroup { .. } => ModeKind::HistorySelectGroup,
            Mode::HistoryAddDetails { .. } => ModeKind::HistoryAddDetails,
            Mode::ActionSelect { .. } => ModeKind::ActionSelect,
        }
    }

    /// The form of a form-driven mode.
    #[must_use]
    pub fn form(&self) -> Option<&Form> {
        match self {
            Mode::AddGroup { form, .. }
            | Mode::EditGroup { form, .. }
            | Mode::AddCommand { form }
            | Mode::EditCommand { form, .. }
            | Mode::HistoryAddDetails { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Mutable access to the form of a form-driven mode.
    pub fn form_mut(&mut self) -> Option<&mut Form> {
        match self {
            Mode::AddGroup { form, .. }
            | Mode::EditGroup { form, .. }
            | Mode::AddCommand { form }
            | Mode::EditCommand { form, .. }
            | Mode::HistoryAddDetails { form, .. } => Some(form),
            _ => None,
        }
    }
}

/// Entries of the action menu, in display order.
pub const ACTION_MENU: [MenuAction; 3] = [MenuAction::Run, MenuAction::Copy, MenuAction::Cancel];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Run,
    Copy,
    Cancel,
}

/// How choosing a command proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The command's default action fires without asking.
    Immediate(MenuAction),
    /// The action menu is shown.
    Menu,
}

/// Decides between a command's default action and the action menu.
#[must_use]
pub fn resolve_selection(command: &FlatCommand) -> Selection {
    match command.default_action {
        ActionType::Run => Selection::Immediate(MenuAction::Run),
        ActionType::Copy => Selection::Immediate(MenuAction::Copy),
        ActionType::None => Selection::Menu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(action: ActionType) -> FlatCommand {
        FlatCommand {
            id: 1,
            group_name: "g".to_string(),
            name: "n".to_string(),
            command: "echo".to_string(),
            description: String::new(),
            default_action: action,
        }
    }

    #[test]
    fn test_resolve_selection() {
        assert_eq!(
            resolve_selection(&flat(ActionType::Run)),
            Selection::Immediate(MenuAction::Run)
        );
        assert_eq!(
            resolve_selection(&flat(ActionType::Copy)),
            Selection::Immediate(MenuAction::Copy)
        );
        assert_eq!(resolve_selection(&flat(ActionType::None)), Selection::Menu);
    }

    #[test]
    fn test_action_result_strings() {
        assert_eq!(ActionResult::Run.as_str(), "run");
        assert_eq!(ActionResult::Copy.as_str(), "copy");
        assert_eq!(ActionResult::None.as_str(), "");
    }
}
