//! Shell history parsing.
//!
//! Understands plain one-command-per-line history as written by bash, and
//! zsh's extended format (`: <epoch>:<duration>;<command>`).

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use log::debug;

use crate::error::{Error, Result};

/// Commands too common to be worth bookmarking.
const SKIPPED_COMMANDS: [&str; 6] = ["ls", "cd", "pwd", "clear", "exit", "history"];

const EXTENDED_PREFIX: &str = ": ";

/// Large enough for pathological one-line history entries.
const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Candidate history files under the home directory, in precedence order.
const HOME_HISTORY_FILES: [&str; 3] = [".zsh_history", ".bash_history", ".history"];

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: String,
    /// Zero-based recency rank, 0 being the most recent.
    pub index: usize,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Parses one raw history line into its command text and optional timestamp.
///
/// Returns `None` for lines that are blank, shorter than two characters or
/// one of the trivially common commands (`ls`, `cd`, ...).
#[must_use]
pub fn parse_history_line(line: &str) -> Option<(String, Option<DateTime<Utc>>)> {
    let mut timestamp = None;
    let mut working = line;

    if let Some(rest) = line.strip_prefix(EXTENDED_PREFIX) {
        if let Some((meta, command)) = rest.split_once(';') {
            let epoch = meta.split_once(':').map_or(meta, |(epoch, _)| epoch);
            timestamp = epoch
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
            working = command;
        }
    }

    let command = working.trim();
    if command.chars().count() < 2 || SKIPPED_COMMANDS.contains(&command) {
        return None;
    }

    Some((command.to_string(), timestamp))
}

/// Finds the history file: `$HISTFILE`, then the usual shell files in `$HOME`.
///
/// # Errors
///
/// Returns [`Error::HistoryNotFound`] when no candidate exists.
pub fn resolve_history_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(Error::HistoryNotFound)?;
    let histfile = env::var("HISTFILE").ok();
    resolve_history_path_in(histfile.as_deref(), &home)
}

/// [`resolve_history_path`] with the environment supplied explicitly.
///
/// # Errors
///
/// Returns [`Error::HistoryNotFound`] when no candidate exists.
pub fn resolve_history_path_in(histfile: Option<&str>, home: &Path) -> Result<PathBuf> {
    if let Some(histfile) = histfile.filter(|h| !h.is_empty()) {
        let expanded = PathBuf::from(shellexpand::tilde(histfile).as_ref());
        if expanded.exists() {
            debug!("Using $HISTFILE `{}`", expanded.display());
            return Ok(expanded);
        }
    }

    HOME_HISTORY_FILES
        .iter()
        .map(|name| home.join(name))
        .find(|candidate| candidate.exists())
        .inspect(|found| debug!("Using history file `{}`", found.display()))
        .ok_or(Error::HistoryNotFound)
}

/// Reads the non-empty lines of a history file, tolerating invalid UTF-8.
pub(crate) fn read_history_lines(path: &Path) -> Result<Vec<String>> {
    let path_text = path.to_string_lossy();
    let file = File::open(path).map_err(|e| Error::io_error("history", &path_text, e))?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);

    let mut lines = Vec::new();
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| Error::io_error("history", &path_text, e))?;
        if read == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\n', '\r']);
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }

    Ok(lines)
}

/// Reads up to `limit` distinct commands from the user's history file,
/// most recent first. A `limit` of 0 reads everything.
///
/// # Errors
///
/// Returns [`Error::HistoryNotFound`] when no history file exists, or an IO
/// error when it cannot be read.
pub fn read_history(limit: usize) -> Result<Vec<HistoryEntry>> {
    read_history_from(&resolve_history_path()?, limit)
}

/// [`read_history`] for an explicit file.
///
/// # Errors
///
/// Returns an IO error when the file cannot be read.
pub fn read_history_from(path: &Path, limit: usize) -> Result<Vec<HistoryEntry>> {
    let lines = read_history_lines(path)?;
    let entries = collect_recent(lines.iter().rev().map(String::as_str), limit);
    debug!(
        "Read {} history entries from {} lines of `{}`",
        entries.len(),
        lines.len(),
        path.display()
    );
    Ok(entries)
}

fn collect_recent<'a>(lines: impl Iterator<Item = &'a str>, limit: usize) -> Vec<HistoryEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();

    for (command, timestamp) in lines.filter_map(parse_history_line) {
        if !seen.insert(command.clone()) {
            continue;
        }

        entries.push(HistoryEntry {
            command,
            index: entries.len(),
            timestamp,
        });

        if limit > 0 && entries.len() >= limit {
            break;
        }
    }

    entries
}
