//! View formatting for each session mode.
//!
//! Rendering is pure: [`render`] turns the session state into a [`Screen`]
//! of styled lines, and the terminal layer in [`super::ui`] paints it.

use chrono::Local;
use itertools::Itertools;

use bkmk_core::bookmarks::FlatCommand;
use bkmk_core::config::HISTORY_TIME_FORMAT;

use super::input::{Form, TextInput};
use super::types::{DeleteTarget, MenuAction, ACTION_MENU};
use super::{Mode, Session};

const MAX_SEARCH_RESULTS: usize = 10;
const ITEM_PADDING: &str = "  ";
const DETAIL_PADDING: &str = "      ";
const INPUT_PROMPT: &str = "> ";

const GROUPS_HELP: &str = "j/k navigate | enter select | a add | e edit | d delete | s show all | h history | o open config | / search | q quit";
const COMMANDS_HELP: &str = "j/k navigate | enter select | a add | e edit | d delete | s show all | h history | o open config | esc back | q quit";
const SEARCH_HELP: &str = "ctrl+n/p navigate | enter select | esc back";
const ALL_COMMANDS_HELP: &str = "j/k navigate | pgup/pgdn page | enter select | / search | esc back | q quit";
const HISTORY_HELP: &str = "↑/↓ navigate | pgup/pgdn page | enter select | esc back";
const SELECT_GROUP_HELP: &str = "j/k navigate | enter select | esc back";
const FORM_HELP: &str = "tab next field | enter submit | esc cancel";
const HISTORY_FORM_HELP: &str = "tab next field | enter submit | esc back";
const GROUP_FORM_HELP: &str = "enter submit | esc cancel";
const DELETE_HELP: &str = "y confirm | n/esc cancel";
const ACTION_HELP: &str = "j/k navigate | enter select | r run | c copy | esc cancel";

/// Visual role of a piece of text; [`super::colors`] maps it to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Title,
    Danger,
    Muted,
    Selected,
    Id,
    Group,
    Tag,
    Command,
    Description,
    Label,
    FocusedLabel,
    Placeholder,
    Time,
    NewGroup,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self::default().push(text, tone)
    }

    fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.spans.push(Span {
            text: text.into(),
            tone,
        });
        self
    }

    /// The line without styling.
    #[must_use]
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// A rendered frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub lines: Vec<Line>,
    /// Column and row of the text cursor, when an input has focus.
    pub caret: Option<(usize, usize)>,
}

impl Screen {
    fn line(&mut self, line: Line) {
        self.lines.push(line);
    }

    fn text(&mut self, text: impl Into<String>, tone: Tone) {
        self.line(Line::new(text, tone));
    }

    fn blank(&mut self) {
        self.lines.push(Line::default());
    }

    fn input(&mut self, input: &TextInput, focused: bool) {
        let line = if input.value().is_empty() {
            Line::new(INPUT_PROMPT, Tone::Normal).push(input.placeholder(), Tone::Placeholder)
        } else {
            Line::new(INPUT_PROMPT, Tone::Normal).push(input.value(), Tone::Normal)
        };
        if focused {
            self.caret = Some((INPUT_PROMPT.len() + input.caret(), self.lines.len()));
        }
        self.line(line);
    }

    fn error(&mut self, error: Option<&str>) {
        if let Some(error) = error {
            self.text(format!("Error: {error}"), Tone::Error);
        }
    }

    /// The whole frame without styling, one line per row.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.lines.iter().map(Line::text).join("\n")
    }
}

/// First and one-past-last index of the rows to show so that `cursor`
/// stays visible.
#[must_use]
pub fn visible_window(cursor: usize, visible: usize, total: usize) -> (usize, usize) {
    let count = visible.min(total);
    let mut offset = if cursor >= count { cursor + 1 - count } else { 0 };
    if offset + count > total {
        offset = total.saturating_sub(count);
    }
    (offset, (offset + count).min(total))
}

fn scroll_info(offset: usize, end: usize, total: usize) -> Option<String> {
    let mut parts = Vec::new();
    if offset > 0 {
        parts.push(format!("↑ {offset} more above"));
    }
    if end < total {
        parts.push(format!("↓ {} more below", total - end));
    }
    (!parts.is_empty()).then(|| parts.join(" | "))
}

/// Shortens `text` to `max` characters, ending in `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max.saturating_sub(3)).collect();
    shortened.push_str("...");
    shortened
}

fn preview(command: &str, width: usize) -> String {
    if width > 20 && command.chars().count() > width - 4 {
        truncate(command, width - 4)
    } else {
        command.to_string()
    }
}

fn cursor_marker(selected: bool) -> (&'static str, Tone) {
    if selected {
        ("> ", Tone::Selected)
    } else {
        ("  ", Tone::Normal)
    }
}

#[must_use]
pub fn render(session: &Session) -> Screen {
    let mut screen = Screen::default();
    let width = session.width as usize;

    match session.mode() {
        Mode::Groups => render_groups(session, &mut screen, width),
        Mode::Commands => render_commands(session, &mut screen, width),
        Mode::Search => render_search(session, &mut screen),
        Mode::AllCommands => render_all_commands(session, &mut screen),
        Mode::History => render_history(session, &mut screen, width),
        Mode::HistorySelectGroup { command } => {
            render_select_group(session, &mut screen, command, width);
        }
        Mode::HistoryAddDetails {
            form,
            command,
            group,
        } => {
            screen.text("bkmk: Add from History", Tone::Title);
            screen.text(format!("Group: {group}"), Tone::Group);
            screen.text(format!("Command: {}", preview(command, width)), Tone::Command);
            screen.blank();
            render_form(&mut screen, form);
            screen.text(HISTORY_FORM_HELP, Tone::Muted);
        }
        Mode::AddGroup { form, .. } => render_group_form(&mut screen, "bkmk: Add Group", form),
        Mode::EditGroup { form, .. } => {
            render_group_form(&mut screen, "bkmk: Rename Group", form);
        }
        Mode::AddCommand { form } => {
            render_command_form(session, &mut screen, "bkmk: Add Command", form);
        }
        Mode::EditCommand { form, .. } => {
            render_command_form(session, &mut screen, "bkmk: Edit Command", form);
        }
        Mode::DeleteConfirm { target, error } => {
            screen.text("bkmk: Confirm Delete", Tone::Danger);
            screen.blank();
            let message = match target {
                DeleteTarget::Group(name) => {
                    format!("Delete group '{name}' and all its commands?")
                }
                DeleteTarget::Command { group, name, .. } => {
                    format!("Delete command '{name}' from group '{group}'?")
                }
            };
            screen.text(message, Tone::Normal);
            screen.error(error.as_deref());
            screen.blank();
            screen.text(DELETE_HELP, Tone::Muted);
        }
        Mode::ActionSelect {
            command,
            cursor,
            error,
        } => render_action_select(&mut screen, command, *cursor, error.as_deref(), width),
    }

    screen
}

fn render_header(session: &Session, screen: &mut Screen, width: usize) {
    let left = "bkmk: Command Bookmarks";
    let right = format!("Config: {}", session.config_path());
    let gap = width as isize - left.chars().count() as isize - right.chars().count() as isize;

    if gap < 2 {
        screen.text(left, Tone::Title);
    } else {
        screen.line(
            Line::new(left, Tone::Title)
                .push(" ".repeat(gap as usize), Tone::Normal)
                .push(right, Tone::Muted),
        );
    }
}

fn render_notice(session: &Session, screen: &mut Screen) {
    if let Some(notice) = session.notice() {
        screen.text(notice, Tone::Error);
    }
}

fn render_groups(session: &Session, screen: &mut Screen, width: usize) {
    render_header(session, screen, width);
    screen.blank();

    let groups = &session.bookmarks().groups;
    if groups.is_empty() {
        screen.text(
            format!("{ITEM_PADDING}No groups yet. Press 'a' to add one."),
            Tone::Normal,
        );
    }
    for (i, group) in groups.iter().enumerate() {
        let (marker, tone) = cursor_marker(session.cursor() == i);
        let count = group.commands.len();
        let plural = if count == 1 { "" } else { "s" };
        screen.line(
            Line::new(format!("{ITEM_PADDING}{marker}{}", group.name), tone)
                .push(format!(" ({count} cmd{plural})"), Tone::Muted),
        );
    }

    screen.blank();
    render_notice(session, screen);
    screen.text(GROUPS_HELP, Tone::Muted);
}

/// The two or three lines of one bookmark: marker, ID and name, then the
/// command line and the description.
fn command_rows(
    screen: &mut Screen,
    selected: bool,
    command: &FlatCommand,
    show_group: bool,
) {
    let (marker, tone) = cursor_marker(selected);
    let mut first = Line::new(format!("{ITEM_PADDING}{marker}"), tone)
        .push(format!("[{}] ", command.id), Tone::Id)
        .push(command.name.as_str(), tone);
    if show_group {
        first = first
            .push(" ", Tone::Normal)
            .push(format!(" {} ", command.group_name), Tone::Tag);
    }
    screen.line(first);
    screen.text(format!("{DETAIL_PADDING}{}", command.command), Tone::Command);
    if !command.description.is_empty() {
        screen.text(
            format!("{DETAIL_PADDING}{}", command.description),
            Tone::Description,
        );
    }
    screen.blank();
}

fn render_commands(session: &Session, screen: &mut Screen, width: usize) {
    render_header(session, screen, width);

    let Some(group) = session.selected_group_name() else {
        screen.text("No group selected", Tone::Group);
        return;
    };
    screen.text(format!("Group: {group}"), Tone::Group);
    screen.blank();

    let commands = session.current_commands();
    if commands.is_empty() {
        screen.text(
            format!("{ITEM_PADDING}No commands in this group. Press 'a' to add one."),
            Tone::Normal,
        );
        screen.blank();
    }
    for (i, command) in commands.iter().enumerate() {
        let flat = FlatCommand::from_command(group, command);
        command_rows(screen, session.cursor() == i, &flat, false);
    }

    render_notice(session, screen);
    screen.text(COMMANDS_HELP, Tone::Muted);
}

fn render_search(session: &Session, screen: &mut Screen) {
    screen.text("bkmk: Search Commands", Tone::Title);
    screen.blank();
    screen.input(&session.search, true);
    screen.blank();

    let filtered = session.filtered();
    if filtered.is_empty() {
        screen.text(format!("{ITEM_PADDING}No matching commands."), Tone::Normal);
    } else {
        let (offset, end) = visible_window(session.cursor(), MAX_SEARCH_RESULTS, filtered.len());
        for (i, command) in filtered.iter().enumerate().take(end).skip(offset) {
            command_rows(screen, session.cursor() == i, command, true);
        }
        if end < filtered.len() {
            screen.text(format!("{ITEM_PADDING}... and more results"), Tone::Normal);
        }
    }

    screen.text(SEARCH_HELP, Tone::Muted);
}

fn render_all_commands(session: &Session, screen: &mut Screen) {
    screen.text("bkmk: All Bookmarks", Tone::Title);
    screen.blank();

    let commands = session.flat_commands();
    if commands.is_empty() {
        screen.text(format!("{ITEM_PADDING}No bookmarks yet."), Tone::Normal);
    } else {
        let (offset, end) =
            visible_window(session.cursor(), session.all_commands_page_size(), commands.len());
        for (i, command) in commands.iter().enumerate().take(end).skip(offset) {
            command_rows(screen, session.cursor() == i, command, true);
        }
        if let Some(info) = scroll_info(offset, end, commands.len()) {
            screen.text(format!("{ITEM_PADDING}{info}"), Tone::Muted);
        }
    }

    screen.text(ALL_COMMANDS_HELP, Tone::Muted);
}

fn render_history(session: &Session, screen: &mut Screen, width: usize) {
    screen.text("bkmk: Shell History", Tone::Title);
    screen.blank();
    screen.input(&session.history.query, true);
    screen.blank();

    let entries = session.filtered_history();
    if let Some(error) = session.history_error() {
        screen.text(format!("Error: {error}"), Tone::Error);
    } else if entries.is_empty() {
        screen.text(
            format!("{ITEM_PADDING}No matching commands in history."),
            Tone::Normal,
        );
    } else {
        let (offset, end) =
            visible_window(session.cursor(), session.history_page_size(), entries.len());
        for (i, entry) in entries.iter().enumerate().take(end).skip(offset) {
            let selected = session.cursor() == i;
            let (marker, tone) = cursor_marker(selected);
            let time = entry
                .timestamp
                .map(|t| format!("{} ", t.with_timezone(&Local).format(HISTORY_TIME_FORMAT)))
                .unwrap_or_default();

            let max_width = width as isize - 10 - time.chars().count() as isize;
            let command = if max_width > 10 {
                truncate(&entry.command, max_width as usize)
            } else {
                entry.command.clone()
            };

            let (time_tone, command_tone) = if selected {
                (Tone::Selected, Tone::Selected)
            } else {
                (Tone::Time, Tone::Normal)
            };
            screen.line(
                Line::new(format!("{ITEM_PADDING}{marker}"), tone)
                    .push(time, time_tone)
                    .push(command, command_tone),
            );
        }
        if let Some(info) = scroll_info(offset, end, entries.len()) {
            screen.text(format!("{ITEM_PADDING}{info}"), Tone::Muted);
        }
    }

    screen.blank();
    screen.text(HISTORY_HELP, Tone::Muted);
}

fn render_select_group(session: &Session, screen: &mut Screen, command: &str, width: usize) {
    screen.text("bkmk: Select Group", Tone::Title);
    screen.blank();
    screen.text(format!("Command: {}", preview(command, width)), Tone::Command);
    screen.blank();

    let groups = &session.bookmarks().groups;
    for (i, group) in groups.iter().enumerate() {
        let (marker, tone) = cursor_marker(session.cursor() == i);
        screen.text(format!("{ITEM_PADDING}{marker}{}", group.name), tone);
    }
    let (marker, tone) = cursor_marker(session.cursor() == groups.len());
    let tone = if tone == Tone::Selected {
        tone
    } else {
        Tone::NewGroup
    };
    screen.text(format!("{ITEM_PADDING}{marker}+ Create new group"), tone);

    screen.blank();
    screen.text(SELECT_GROUP_HELP, Tone::Muted);
}

/// Labels and inputs of a form, followed by its error.
fn render_form(screen: &mut Screen, form: &Form) {
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let tone = if focused {
            Tone::FocusedLabel
        } else {
            Tone::Label
        };
        screen.text(field.label, tone);
        screen.input(&field.input, focused);
        screen.blank();
    }
    screen.error(form.error.as_deref());
}

fn render_group_form(screen: &mut Screen, title: &str, form: &Form) {
    screen.text(title, Tone::Title);
    screen.blank();
    render_form(screen, form);
    screen.text(GROUP_FORM_HELP, Tone::Muted);
}

fn render_command_form(session: &Session, screen: &mut Screen, title: &str, form: &Form) {
    screen.text(title, Tone::Title);
    screen.text(
        format!("Group: {}", session.selected_group_name().unwrap_or("Unknown")),
        Tone::Muted,
    );
    screen.blank();
    render_form(screen, form);
    screen.text(FORM_HELP, Tone::Muted);
}

fn render_action_select(
    screen: &mut Screen,
    command: &FlatCommand,
    cursor: usize,
    error: Option<&str>,
    width: usize,
) {
    screen.text("bkmk: Select Action", Tone::Title);
    screen.blank();
    screen.text(format!("Command: {}", preview(&command.command, width)), Tone::Command);
    screen.blank();

    for (i, action) in ACTION_MENU.iter().enumerate() {
        let (marker, tone) = cursor_marker(cursor == i);
        let label = match action {
            MenuAction::Run => "[r] Run command",
            MenuAction::Copy => "[c] Copy to clipboard",
            MenuAction::Cancel => "Cancel",
        };
        screen.text(format!("{ITEM_PADDING}{marker}{label}"), tone);
    }

    if error.is_some() {
        screen.blank();
        screen.error(error);
    }
    screen.blank();
    screen.text(ACTION_HELP, Tone::Muted);
}
