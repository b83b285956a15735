//! Key handlers, one per session mode.
//!
//! [`handler_for`] is the dispatch table. Each handler consumes one key and
//! either mutates the session in place or returns an [`Effect`] for the
//! terminal loop.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::info;

use bkmk_core::bookmarks::{ActionType, CommandUpdate, FlatCommand};
use bkmk_core::error::Error;

use super::input::{Form, FormStep};
use super::types::{
    resolve_selection, AfterGroupAdd, DeleteTarget, MenuAction, Selection, ACTION_MENU,
};
use super::{ActionResult, Effect, Mode, ModeKind, Session};

type Handler = fn(&mut Session, KeyEvent) -> Effect;

/// Form fields as `(label, placeholder)` pairs.
pub(super) const GROUP_FIELDS: [(&str, &str); 1] = [("Name:", "Group name")];

pub(super) const COMMAND_FIELDS: [(&str, &str); 4] = [
    ("Name:", "Command name"),
    ("Command:", "Command to run"),
    ("Description:", "Description (optional)"),
    ("Default action:", "none, copy or run"),
];

pub(super) const HISTORY_COMMAND_FIELDS: [(&str, &str); 2] = [
    ("Name:", "Command name"),
    ("Description:", "Description (optional)"),
];

pub(super) fn handler_for(kind: ModeKind) -> Handler {
    match kind {
        ModeKind::Groups => handle_groups,
        ModeKind::Commands => handle_commands,
        ModeKind::Search => handle_search,
        ModeKind::AllCommands => handle_all_commands,
        ModeKind::AddGroup => handle_add_group,
        ModeKind::EditGroup => handle_edit_group,
        ModeKind::AddCommand => handle_add_command,
        ModeKind::EditCommand => handle_edit_command,
        ModeKind::DeleteConfirm => handle_delete_confirm,
        ModeKind::History => handle_history,
        ModeKind::HistorySelectGroup => handle_history_select_group,
        ModeKind::HistoryAddDetails => handle_history_add_details,
        ModeKind::ActionSelect => handle_action_select,
    }
}

fn has_ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Arrow keys plus `j`/`k`, for lists without a text input.
fn vertical_step(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') if !has_ctrl(key) => Some(false),
        KeyCode::Down | KeyCode::Char('j') if !has_ctrl(key) => Some(true),
        _ => None,
    }
}

/// Arrow keys plus `ctrl+p`/`ctrl+n`, for lists under a text input.
fn filtered_step(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Up if !has_ctrl(key) => Some(false),
        KeyCode::Down if !has_ctrl(key) => Some(true),
        KeyCode::Char('p') if has_ctrl(key) => Some(false),
        KeyCode::Char('n') if has_ctrl(key) => Some(true),
        _ => None,
    }
}

/// Page keys, also reachable as `ctrl+up`/`ctrl+down`.
fn page_step(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::PageUp => Some(false),
        KeyCode::PageDown => Some(true),
        KeyCode::Up if has_ctrl(key) => Some(false),
        KeyCode::Down if has_ctrl(key) => Some(true),
        _ => None,
    }
}

impl Session {
    fn step_cursor(&mut self, forward: bool, by: usize) {
        if forward {
            self.move_cursor_down(by);
        } else {
            self.move_cursor_up(by);
        }
    }

    /// Switches to `mode`, remembering the listing to come back to.
    fn enter_mode(&mut self, mode: Mode) {
        if matches!(
            self.mode,
            Mode::Groups | Mode::Commands | Mode::Search | Mode::AllCommands
        ) {
            self.previous = self.mode.clone();
        }
        self.mode = mode;
    }

    fn leave_mode(&mut self) {
        self.mode = self.previous.clone();
        self.clamp_cursor();
    }

    fn set_form_error(&mut self, message: String) {
        if let Some(form) = self.mode.form_mut() {
            form.error = Some(message);
        }
    }

    fn enter_search(&mut self) {
        self.enter_mode(Mode::Search);
        self.cursor = 0;
        self.update_search_filter();
    }

    fn leave_search(&mut self) {
        self.search.clear();
        self.update_search_filter();
        self.mode = Mode::Groups;
        self.cursor = 0;
    }

    fn open_group(&mut self, index: usize) {
        if index < self.bookmarks.groups.len() {
            self.selected_group = index;
            self.mode = Mode::Commands;
            self.cursor = 0;
        }
    }

    fn open_editor(&self) -> Effect {
        Effect::OpenEditor {
            path: PathBuf::from(self.backend.config_path()),
            editor: self.bookmarks.editor.clone(),
        }
    }

    fn finish(&mut self, command: FlatCommand, result: ActionResult) -> Effect {
        info!("Selected command {} for {}", command.id, result.as_str());
        self.selected = Some(command);
        self.action_result = result;
        Effect::Finish
    }

    /// Runs the default action of `command`, or opens the action menu.
    fn select_command(&mut self, command: FlatCommand) -> Effect {
        match resolve_selection(&command) {
            Selection::Immediate(action) => self.perform_action(command, action),
            Selection::Menu => {
                self.enter_mode(Mode::ActionSelect {
                    command,
                    cursor: 0,
                    error: None,
                });
                Effect::None
            }
        }
    }

    fn perform_action(&mut self, command: FlatCommand, action: MenuAction) -> Effect {
        match action {
            MenuAction::Run => self.finish(command, ActionResult::Run),
            MenuAction::Copy => match self.backend.copy_to_clipboard(&command.command) {
                Ok(()) => self.finish(command, ActionResult::Copy),
                Err(e) => {
                    let message = e.to_string();
                    if let Mode::ActionSelect { error, .. } = &mut self.mode {
                        *error = Some(message);
                    } else {
                        self.enter_mode(Mode::ActionSelect {
                            command,
                            cursor: 1,
                            error: Some(message),
                        });
                    }
                    Effect::None
                }
            },
            MenuAction::Cancel => {
                self.leave_mode();
                Effect::None
            }
        }
    }

    fn history_form() -> Form {
        Form::new(&HISTORY_COMMAND_FIELDS, &[])
    }
}

/// Keys shared by the group and command listings. Returns `None` when the
/// key is not one of them.
fn handle_listing_key(session: &mut Session, key: &KeyEvent) -> Option<Effect> {
    if let Some(forward) = vertical_step(key) {
        session.step_cursor(forward, 1);
        return Some(Effect::None);
    }

    match key.code {
        KeyCode::Char('q') => return Some(Effect::Quit),
        KeyCode::Char('/') => session.enter_search(),
        KeyCode::Char('s') => {
            session.enter_mode(Mode::AllCommands);
            session.cursor = 0;
        }
        KeyCode::Char('h') => session.enter_history(),
        KeyCode::Char('o') => return Some(session.open_editor()),
        _ => return None,
    }
    Some(Effect::None)
}

fn handle_groups(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(effect) = handle_listing_key(session, &key) {
        return effect;
    }

    match key.code {
        KeyCode::Enter | KeyCode::Tab => session.open_group(session.cursor),
        KeyCode::Char('a') => session.enter_mode(Mode::AddGroup {
            form: Form::new(&GROUP_FIELDS, &[]),
            after: AfterGroupAdd::Groups,
        }),
        KeyCode::Char('e') => {
            if let Some(group) = session.bookmarks.groups.get(session.cursor) {
                let original = group.name.clone();
                session.enter_mode(Mode::EditGroup {
                    form: Form::new(&GROUP_FIELDS, &[original.as_str()]),
                    original,
                });
            }
        }
        KeyCode::Char('d') | KeyCode::Backspace | KeyCode::Delete => {
            if let Some(group) = session.bookmarks.groups.get(session.cursor) {
                let target = DeleteTarget::Group(group.name.clone());
                session.enter_mode(Mode::DeleteConfirm {
                    target,
                    error: None,
                });
            }
        }
        _ => {}
    }
    Effect::None
}

fn handle_commands(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(effect) = handle_listing_key(session, &key) {
        return effect;
    }

    let Some(group_name) = session.selected_group_name().map(str::to_string) else {
        session.mode = Mode::Groups;
        session.cursor = 0;
        return Effect::None;
    };
    let current = session.current_commands().get(session.cursor).cloned();

    match key.code {
        KeyCode::Esc => {
            session.mode = Mode::Groups;
            session.cursor = session.selected_group;
        }
        KeyCode::Enter => {
            if let Some(command) = current {
                return session.select_command(FlatCommand::from_command(&group_name, &command));
            }
        }
        KeyCode::Char('a') => session.enter_mode(Mode::AddCommand {
            form: Form::new(&COMMAND_FIELDS, &[]),
        }),
        KeyCode::Char('e') => {
            if let Some(command) = current {
                let action = if command.default_action.is_none() {
                    String::new()
                } else {
                    command.default_action.to_string()
                };
                let values = [
                    command.name.as_str(),
                    command.command.as_str(),
                    command.description_text(),
                    action.as_str(),
                ];
                session.enter_mode(Mode::EditCommand {
                    form: Form::new(&COMMAND_FIELDS, &values),
                    command_id: command.id,
                });
            }
        }
        KeyCode::Char('d') | KeyCode::Backspace | KeyCode::Delete => {
            if let Some(command) = current {
                session.enter_mode(Mode::DeleteConfirm {
                    target: DeleteTarget::Command {
                        group: group_name,
                        id: command.id,
                        name: command.name,
                    },
                    error: None,
                });
            }
        }
        _ => {}
    }
    Effect::None
}

fn handle_search(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(forward) = filtered_step(&key) {
        session.step_cursor(forward, 1);
        return Effect::None;
    }

    match key.code {
        KeyCode::Esc => session.leave_search(),
        KeyCode::Enter => {
            if let Some(command) = session.filtered.get(session.cursor).cloned() {
                return session.select_command(command);
            }
        }
        _ => {
            if session.search.handle_key(&key) {
                session.update_search_filter();
            }
        }
    }
    Effect::None
}

fn handle_all_commands(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(forward) = vertical_step(&key) {
        session.step_cursor(forward, 1);
        return Effect::None;
    }
    if let Some(forward) = page_step(&key) {
        let page = session.all_commands_page_size();
        session.step_cursor(forward, page);
        return Effect::None;
    }

    match key.code {
        KeyCode::Char('q') => return Effect::Quit,
        KeyCode::Esc => {
            session.mode = Mode::Groups;
            session.cursor = 0;
        }
        KeyCode::Char('/') => session.enter_search(),
        KeyCode::Enter => {
            if let Some(command) = session.flat_commands.get(session.cursor).cloned() {
                return session.select_command(command);
            }
        }
        _ => {}
    }
    Effect::None
}

/// Feeds a key to the current form. Returns whether the form asked to be
/// submitted.
fn feed_form(session: &mut Session, key: &KeyEvent) -> bool {
    session
        .mode
        .form_mut()
        .is_some_and(|form| form.handle_key(key) == FormStep::Submit)
}

/// Values of the four-field command form.
struct CommandFields {
    name: String,
    command: String,
    description: String,
    action: ActionType,
}

impl CommandFields {
    fn read(form: &Form) -> Result<Self, String> {
        let name = form.value(0);
        if name.is_empty() {
            return Err("Command name cannot be empty".to_string());
        }
        let command = form.value(1);
        if command.is_empty() {
            return Err("Command cannot be empty".to_string());
        }
        let action: ActionType = form.value(3).parse().map_err(|e: Error| e.to_string())?;

        Ok(Self {
            name: name.to_string(),
            command: command.to_string(),
            description: form.value(2).to_string(),
            action,
        })
    }
}

fn handle_add_group(session: &mut Session, key: KeyEvent) -> Effect {
    if key.code == KeyCode::Esc {
        match &session.mode {
            Mode::AddGroup {
                after: AfterGroupAdd::HistoryDetails { command },
                ..
            } => {
                session.mode = Mode::HistorySelectGroup {
                    command: command.clone(),
                };
                session.cursor = session.bookmarks.groups.len();
            }
            _ => session.leave_mode(),
        }
        return Effect::None;
    }

    if !feed_form(session, &key) {
        return Effect::None;
    }

    let Mode::AddGroup { form, after } = &session.mode else {
        return Effect::None;
    };
    let name = form.value(0).to_string();
    let after = after.clone();
    if name.is_empty() {
        session.set_form_error("Group name cannot be empty".to_string());
        return Effect::None;
    }

    match session.persist(|bookmarks| bookmarks.add_group(&name)) {
        Ok(()) => {
            let last = session.bookmarks.groups.len().saturating_sub(1);
            match after {
                AfterGroupAdd::Groups => {
                    session.mode = Mode::Groups;
                    session.cursor = last;
                }
                AfterGroupAdd::HistoryDetails { command } => {
                    session.selected_group = last;
                    session.mode = Mode::HistoryAddDetails {
                        form: Session::history_form(),
                        command,
                        group: name,
                    };
                }
            }
        }
        Err(message) => session.set_form_error(message),
    }
    Effect::None
}

fn handle_edit_group(session: &mut Session, key: KeyEvent) -> Effect {
    if key.code == KeyCode::Esc {
        session.leave_mode();
        return Effect::None;
    }

    if !feed_form(session, &key) {
        return Effect::None;
    }

    let Mode::EditGroup { form, original } = &session.mode else {
        return Effect::None;
    };
    let name = form.value(0).to_string();
    let original = original.clone();
    if name.is_empty() {
        session.set_form_error("Group name cannot be empty".to_string());
        return Effect::None;
    }

    match session.persist(|bookmarks| bookmarks.rename_group(&original, &name)) {
        Ok(()) => session.mode = Mode::Groups,
        Err(message) => session.set_form_error(message),
    }
    Effect::None
}

fn handle_add_command(session: &mut Session, key: KeyEvent) -> Effect {
    if key.code == KeyCode::Esc {
        session.leave_mode();
        return Effect::None;
    }

    if !feed_form(session, &key) {
        return Effect::None;
    }

    let Mode::AddCommand { form } = &session.mode else {
        return Effect::None;
    };
    let fields = match CommandFields::read(form) {
        Ok(fields) => fields,
        Err(message) => {
            session.set_form_error(message);
            return Effect::None;
        }
    };
    let Some(group) = session.selected_group_name().map(str::to_string) else {
        session.set_form_error("No group selected".to_string());
        return Effect::None;
    };

    let result = session.persist(|bookmarks| {
        bookmarks.add_command(
            &group,
            &fields.name,
            &fields.command,
            Some(fields.description),
            fields.action,
        )
    });
    match result {
        Ok(_) => {
            session.mode = Mode::Commands;
            session.cursor = session.current_commands().len().saturating_sub(1);
        }
        Err(message) => session.set_form_error(message),
    }
    Effect::None
}

fn handle_edit_command(session: &mut Session, key: KeyEvent) -> Effect {
    if key.code == KeyCode::Esc {
        session.leave_mode();
        return Effect::None;
    }

    if !feed_form(session, &key) {
        return Effect::None;
    }

    let Mode::EditCommand { form, command_id } = &session.mode else {
        return Effect::None;
    };
    let command_id = *command_id;
    let fields = match CommandFields::read(form) {
        Ok(fields) => fields,
        Err(message) => {
            session.set_form_error(message);
            return Effect::None;
        }
    };
    let update = CommandUpdate {
        name: fields.name,
        command: fields.command,
        description: Some(fields.description),
        default_action: Some(fields.action),
    };
    match session.persist(|bookmarks| bookmarks.update_command_by_id(command_id, update)) {
        Ok(()) => {
            session.mode = Mode::Commands;
            session.clamp_cursor();
        }
        Err(message) => session.set_form_error(message),
    }
    Effect::None
}

fn handle_delete_confirm(session: &mut Session, key: KeyEvent) -> Effect {
    let Mode::DeleteConfirm { target, .. } = &session.mode else {
        return Effect::None;
    };
    let target = target.clone();

    match key.code {
        KeyCode::Esc | KeyCode::Char('n' | 'N') => session.leave_mode(),
        KeyCode::Enter | KeyCode::Char('y' | 'Y') => {
            let result = match &target {
                DeleteTarget::Group(name) => session.persist(|b| b.remove_group(name)),
                DeleteTarget::Command { id, .. } => {
                    session.persist(|b| b.remove_command_by_id(*id))
                }
            };

            match result {
                Ok(()) => {
                    session.mode = match target {
                        DeleteTarget::Group(_) => Mode::Groups,
                        DeleteTarget::Command { .. } => Mode::Commands,
                    };
                    session.clamp_cursor();
                }
                Err(message) => {
                    if let Mode::DeleteConfirm { error, .. } = &mut session.mode {
                        *error = Some(message);
                    }
                }
            }
        }
        _ => {}
    }
    Effect::None
}

fn handle_history(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(forward) = filtered_step(&key) {
        session.step_cursor(forward, 1);
        return Effect::None;
    }
    if let Some(forward) = page_step(&key) {
        let page = session.history_page_size();
        session.step_cursor(forward, page);
        return Effect::None;
    }

    match key.code {
        KeyCode::Esc => {
            session.history.query.clear();
            session.update_history_filter();
            session.mode = session.previous.clone();
            session.cursor = 0;
        }
        KeyCode::Enter => {
            if let Some(entry) = session.history.filtered.get(session.cursor) {
                session.mode = Mode::HistorySelectGroup {
                    command: entry.command.clone(),
                };
                session.cursor = 0;
            }
        }
        _ => {
            if session.history.query.handle_key(&key) {
                session.update_history_filter();
            }
        }
    }
    Effect::None
}

fn handle_history_select_group(session: &mut Session, key: KeyEvent) -> Effect {
    if let Some(forward) = vertical_step(&key) {
        session.step_cursor(forward, 1);
        return Effect::None;
    }

    let Mode::HistorySelectGroup { command } = &session.mode else {
        return Effect::None;
    };
    let command = command.clone();

    match key.code {
        KeyCode::Esc => {
            session.mode = Mode::History;
            session.cursor = 0;
            if session.history.entries.is_empty() && session.history.error.is_none() {
                session.load_history();
            }
        }
        KeyCode::Enter => match session.bookmarks.groups.get(session.cursor) {
            Some(group) => {
                let group = group.name.clone();
                session.selected_group = session.cursor;
                session.mode = Mode::HistoryAddDetails {
                    form: Session::history_form(),
                    command,
                    group,
                };
            }
            None => {
                session.mode = Mode::AddGroup {
                    form: Form::new(&GROUP_FIELDS, &[]),
                    after: AfterGroupAdd::HistoryDetails { command },
                };
            }
        },
        _ => {}
    }
    Effect::None
}

fn handle_history_add_details(session: &mut Session, key: KeyEvent) -> Effect {
    let Mode::HistoryAddDetails { command, group, .. } = &session.mode else {
        return Effect::None;
    };
    let command = command.clone();
    let group = group.clone();
    let group_index = session.bookmarks.groups.iter().position(|g| g.name == group);

    if key.code == KeyCode::Esc {
        session.mode = Mode::HistorySelectGroup { command };
        session.cursor = group_index.unwrap_or(0);
        return Effect::None;
    }

    if !feed_form(session, &key) {
        return Effect::None;
    }

    let Some(form) = session.mode.form_mut() else {
        return Effect::None;
    };
    let name = form.value(0).to_string();
    let description = form.value(1).to_string();
    if name.is_empty() {
        session.set_form_error("Command name cannot be empty".to_string());
        return Effect::None;
    }
    let Some(group_index) = group_index else {
        session.set_form_error("No group selected".to_string());
        return Effect::None;
    };

    let result = session.persist(|bookmarks| {
        bookmarks.add_command(&group, &name, &command, Some(description), ActionType::None)
    });
    match result {
        Ok(_) => {
            session.selected_group = group_index;
            session.mode = Mode::Commands;
            session.cursor = session.current_commands().len().saturating_sub(1);
        }
        Err(message) => session.set_form_error(message),
    }
    Effect::None
}

fn handle_action_select(session: &mut Session, key: KeyEvent) -> Effect {
    let Mode::ActionSelect { command, cursor, .. } = &mut session.mode else {
        return Effect::None;
    };

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            *cursor = cursor.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            *cursor = (*cursor + 1).min(ACTION_MENU.len() - 1);
            None
        }
        KeyCode::Char('r') => Some(MenuAction::Run),
        KeyCode::Char('c') => Some(MenuAction::Copy),
        KeyCode::Enter => ACTION_MENU.get(*cursor).copied(),
        KeyCode::Esc => Some(MenuAction::Cancel),
        _ => None,
    };

    match action {
        Some(action) => {
            let command = command.clone();
            session.perform_action(command, action)
        }
        None => Effect::None,
    }
}
