//! The interactive bookmark session.
//!
//! A [`Session`] is a key-driven state machine over the bookmark store. It
//! never touches the terminal itself: [`Session::handle_key`] consumes one
//! key event and returns an [`Effect`] for the terminal loop in [`ui`], and
//! [`views::render`] turns the current state into styled lines.
//!
//! # Key Features
//!
//! - **Browsing**: Groups, the commands of a group, and all bookmarks at once
//! - **Fuzzy Search**: Filter every bookmark by typing after `/`
//! - **History**: Pick commands from shell history and bookmark them
//! - **Editing**: Add, rename, edit and delete through inline forms
//! - **Actions**: Run or copy a command, directly via its default action or
//!   through the action menu
//!
//! Every store change is applied to a copy, saved through the [`Backend`],
//! and only then made visible. A failed save leaves the form open with the
//! error.

pub mod colors;
mod handlers;
pub mod input;
pub mod types;
pub mod ui;
pub mod views;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use log::{debug, warn};

use bkmk_core::bookmarks::{Bookmarks, Command, FlatCommand};
use bkmk_core::error::Result;
use bkmk_core::execution;
use bkmk_core::file_handling::{load_bookmarks, save_bookmarks};
use bkmk_core::history::{read_history, HistoryEntry};

use input::TextInput;
pub use types::{ActionResult, Effect, Mode, ModeKind};

/// Number of history entries loaded when browsing history.
pub const HISTORY_LIMIT: usize = 500;

/// Lines of the history screen not available to entries.
pub const HISTORY_RESERVED_LINES: usize = 8;

/// Lines of the all-bookmarks screen not available to entries.
pub const ALL_COMMANDS_RESERVED_LINES: usize = 6;

/// Smallest number of list rows shown, however small the terminal.
pub const MIN_VISIBLE_ROWS: usize = 5;

/// Everything the session needs from outside: storage, history and the
/// clipboard.
pub trait Backend {
    /// Reads the store from disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read or parsed.
    fn load(&self) -> Result<Bookmarks>;

    /// Writes the store to disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    fn save(&mut self, bookmarks: &Bookmarks) -> Result<()>;

    /// Reads up to `limit` distinct history commands, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error when no history file is found or it cannot be read.
    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Copies `text` to the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns an error when no clipboard utility works.
    fn copy_to_clipboard(&mut self, text: &str) -> Result<()>;

    fn config_path(&self) -> &str;
}

/// The real [`Backend`]: the YAML file at `config_path`, the user's shell
/// history and the platform clipboard.
pub struct SystemBackend {
    config_path: String,
}

impl SystemBackend {
    #[must_use]
    pub fn new(config_path: String) -> Self {
        Self { config_path }
    }
}

impl Backend for SystemBackend {
    fn load(&self) -> Result<Bookmarks> {
        load_bookmarks(&self.config_path)
    }

    fn save(&mut self, bookmarks: &Bookmarks) -> Result<()> {
        save_bookmarks(&self.config_path, bookmarks)
    }

    fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        read_history(limit)
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<()> {
        execution::copy_to_clipboard(text)
    }

    fn config_path(&self) -> &str {
        &self.config_path
    }
}

/// State of the history browser.
#[derive(Debug, Default)]
struct HistoryBrowser {
    entries: Vec<HistoryEntry>,
    filtered: Vec<HistoryEntry>,
    query: TextInput,
    error: Option<String>,
}

pub struct Session {
    bookmarks: Bookmarks,
    backend: Box<dyn Backend>,
    flat_commands: Vec<FlatCommand>,
    filtered: Vec<FlatCommand>,
    selected_group: usize,
    cursor: usize,
    mode: Mode,
    /// Listing mode that forms, menus and history return to.
    previous: Mode,
    search: TextInput,
    history: HistoryBrowser,
    width: u16,
    height: u16,
    notice: Option<String>,
    selected: Option<FlatCommand>,
    action_result: ActionResult,
}

/// Keeps items matching `query`, best match first. An empty query keeps
/// everything in order.
fn fuzzy_filter<T: Clone>(items: &[T], query: &str, text: impl Fn(&T) -> String) -> Vec<T> {
    if query.is_empty() {
        return items.to_vec();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &T)> = items
        .iter()
        .filter_map(|item| matcher.fuzzy_match(&text(item), query).map(|s| (s, item)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, item)| item.clone()).collect()
}

impl Session {
    #[must_use]
    pub fn new(bookmarks: Bookmarks, backend: Box<dyn Backend>) -> Self {
        let flat_commands = bookmarks.flat_commands();
        Self {
            filtered: flat_commands.clone(),
            flat_commands,
            bookmarks,
            backend,
            selected_group: 0,
            cursor: 0,
            mode: Mode::Groups,
            previous: Mode::Groups,
            search: TextInput::new("Search commands..."),
            history: HistoryBrowser {
                query: TextInput::new("Search history..."),
                ..HistoryBrowser::default()
            },
            width: 80,
            height: 24,
            notice: None,
            selected: None,
            action_result: ActionResult::None,
        }
    }

    /// A session that opens on the shell history browser.
    #[must_use]
    pub fn with_history(bookmarks: Bookmarks, backend: Box<dyn Backend>) -> Self {
        let mut session = Self::new(bookmarks, backend);
        session.enter_history();
        session
    }

    /// A session that starts by choosing a group for `command`.
    #[must_use]
    pub fn with_last_command(
        bookmarks: Bookmarks,
        backend: Box<dyn Backend>,
        command: String,
    ) -> Self {
        let mut session = Self::new(bookmarks, backend);
        session.mode = Mode::HistorySelectGroup { command };
        session
    }

    /// Feeds one key press to the state machine.
    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        if key.kind == KeyEventKind::Release {
            return Effect::None;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Effect::Quit;
        }

        let kind = self.mode.kind();
        let effect = handlers::handler_for(kind)(self, key);
        if self.mode.kind() != kind {
            debug!("Session mode {kind:?} -> {:?}", self.mode.kind());
        }
        effect
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Reloads the store after it was edited outside the session.
    pub fn editor_finished(&mut self, result: Result<()>) {
        self.notice = result.err().map(|e| format!("Editor failed: {e}"));

        match self.backend.load() {
            Ok(bookmarks) => {
                self.bookmarks = bookmarks;
                self.refresh();
            }
            Err(e) => {
                warn!("Reload after editing failed: {e}");
                self.notice = Some(format!("Failed to reload: {e}"));
            }
        }

        if self.mode == Mode::Commands && self.current_group().is_none() {
            self.mode = Mode::Groups;
        }
        self.clamp_cursor();
    }

    #[must_use]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    #[must_use]
    pub fn flat_commands(&self) -> &[FlatCommand] {
        &self.flat_commands
    }

    /// Bookmarks matching the current search query.
    #[must_use]
    pub fn filtered(&self) -> &[FlatCommand] {
        &self.filtered
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        self.search.value()
    }

    #[must_use]
    pub fn history_entries(&self) -> &[HistoryEntry] {
        &self.history.entries
    }

    #[must_use]
    pub fn filtered_history(&self) -> &[HistoryEntry] {
        &self.history.filtered
    }

    #[must_use]
    pub fn history_error(&self) -> Option<&str> {
        self.history.error.as_deref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn selected_group_name(&self) -> Option<&str> {
        self.current_group().map(|g| g.name.as_str())
    }

    /// Commands of the group being browsed.
    #[must_use]
    pub fn current_commands(&self) -> &[Command] {
        self.current_group().map_or(&[], |g| g.commands.as_slice())
    }

    /// The command chosen when the session finished.
    #[must_use]
    pub fn selected(&self) -> Option<&FlatCommand> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn action_result(&self) -> ActionResult {
        self.action_result
    }

    #[must_use]
    pub fn config_path(&self) -> &str {
        self.backend.config_path()
    }

    fn current_group(&self) -> Option<&bkmk_core::bookmarks::Group> {
        self.bookmarks.groups.get(self.selected_group)
    }

    /// Length of the list the cursor moves over in the current mode.
    fn list_len(&self) -> usize {
        match self.mode {
            Mode::Groups => self.bookmarks.groups.len(),
            Mode::Commands => self.current_commands().len(),
            Mode::Search => self.filtered.len(),
            Mode::AllCommands => self.flat_commands.len(),
            Mode::History => self.history.filtered.len(),
            Mode::HistorySelectGroup { .. } => self.bookmarks.groups.len() + 1,
            _ => 0,
        }
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.list_len().saturating_sub(1));
    }

    fn move_cursor_up(&mut self, by: usize) {
        self.cursor = self.cursor.saturating_sub(by);
    }

    fn move_cursor_down(&mut self, by: usize) {
        let max = self.list_len().saturating_sub(1);
        self.cursor = (self.cursor + by).min(max);
    }

    /// Rows of history visible at once, also the page-up/down step.
    #[must_use]
    pub fn history_page_size(&self) -> usize {
        (self.height as usize)
            .saturating_sub(HISTORY_RESERVED_LINES)
            .max(MIN_VISIBLE_ROWS)
    }

    /// Rows of the all-bookmarks listing visible at once.
    #[must_use]
    pub fn all_commands_page_size(&self) -> usize {
        (self.height as usize)
            .saturating_sub(ALL_COMMANDS_RESERVED_LINES)
            .max(MIN_VISIBLE_ROWS)
    }

    fn update_search_filter(&mut self) {
        self.filtered = fuzzy_filter(&self.flat_commands, self.search.value(), FlatCommand::search_text);
        if self.mode == Mode::Search {
            self.clamp_cursor();
        }
    }

    fn update_history_filter(&mut self) {
        self.history.filtered = fuzzy_filter(&self.history.entries, self.history.query.value(), |e| {
            e.command.clone()
        });
        if self.mode == Mode::History {
            self.clamp_cursor();
        }
    }

    /// Rebuilds the caches derived from the store.
    fn refresh(&mut self) {
        self.flat_commands = self.bookmarks.flat_commands();
        self.update_search_filter();
        if self.selected_group >= self.bookmarks.groups.len() {
            self.selected_group = self.bookmarks.groups.len().saturating_sub(1);
        }
    }

    /// Applies `change` to a copy of the store and saves it. The session
    /// only adopts the copy once the save succeeded.
    fn persist<T>(
        &mut self,
        change: impl FnOnce(&mut Bookmarks) -> Result<T>,
    ) -> std::result::Result<T, String> {
        let mut candidate = self.bookmarks.clone();
        let value = change(&mut candidate).map_err(|e| e.to_string())?;

        if let Err(e) = self.backend.save(&candidate) {
            warn!("Saving bookmarks failed: {e}");
            return Err(format!("Failed to save: {e}"));
        }

        self.bookmarks = candidate;
        self.refresh();
        Ok(value)
    }

    fn load_history(&mut self) {
        match self.backend.history(HISTORY_LIMIT) {
            Ok(entries) => {
                debug!("Loaded {} history entries", entries.len());
                self.history.entries = entries;
                self.history.error = None;
            }
            Err(e) => {
                self.history.entries.clear();
                self.history.error = Some(e.to_string());
            }
        }
        self.history.query.clear();
        self.update_history_filter();
    }

    fn enter_history(&mut self) {
        if matches!(self.mode, Mode::Groups | Mode::Commands) {
            self.previous = self.mode.clone();
        }
        self.mode = Mode::History;
        self.cursor = 0;
        self.load_history();
    }
}
