//! Finds commands worth bookmarking by how often they recur in history.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use log::debug;

use crate::error::Result;
use crate::history::{parse_history_line, read_history_lines, resolve_history_path};

/// Shorter commands are cheap enough to retype.
const MIN_COMMAND_LENGTH: usize = 13;

/// Longer entries are almost always heredocs or pasted content.
const MAX_COMMAND_LENGTH: usize = 300;

/// Prefix of our own invocations, never suggested.
const SELF_PREFIX: &str = "bkmk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentCommand {
    pub command: String,
    pub count: usize,
}

/// Ranks history commands from the last `days_back` days with at least
/// `min_args` arguments. Returns at most `limit` results (0 for all), most
/// frequent first and ties in ascending command order.
///
/// # Errors
///
/// Fails when no history file is found or it cannot be read.
pub fn analyze_frequency(days_back: i64, min_args: usize, limit: usize) -> Result<Vec<FrequentCommand>> {
    analyze_frequency_from(&resolve_history_path()?, days_back, min_args, limit)
}

/// [`analyze_frequency`] for an explicit history file.
///
/// # Errors
///
/// Fails when the file cannot be read.
pub fn analyze_frequency_from(
    path: &Path,
    days_back: i64,
    min_args: usize,
    limit: usize,
) -> Result<Vec<FrequentCommand>> {
    let lines = read_history_lines(path)?;
    Ok(rank_commands(
        lines.iter().map(String::as_str),
        Utc::now(),
        days_back,
        min_args,
        limit,
    ))
}

fn rank_commands<'a>(
    lines: impl Iterator<Item = &'a str>,
    now: DateTime<Utc>,
    days_back: i64,
    min_args: usize,
    limit: usize,
) -> Vec<FrequentCommand> {
    let cutoff = now - Duration::days(days_back);
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut has_timestamps = false;

    for (command, timestamp) in lines.filter_map(parse_history_line) {
        has_timestamps |= timestamp.is_some();

        if has_timestamps {
            // Untimed lines in timed history are continuation fragments.
            match timestamp {
                Some(ts) if ts >= cutoff => {}
                _ => continue,
            }
        }

        if command.chars().count() < MIN_COMMAND_LENGTH
            || count_args(&command) < min_args
            || command.starts_with(SELF_PREFIX)
            || is_multiline_fragment(&command)
        {
            continue;
        }

        *counts.entry(command).or_default() += 1;
    }

    debug!("Counted {} distinct candidate commands", counts.len());

    let ranked = counts
        .into_iter()
        .map(|(command, count)| FrequentCommand { command, count })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.command.cmp(&b.command)));

    if limit > 0 {
        ranked.take(limit).collect()
    } else {
        ranked.collect()
    }
}

/// Counts whitespace separated arguments, treating a quoted region as part
/// of one argument. Quotes are not escapable.
#[must_use]
pub fn count_args(command: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut in_argument = false;

    for c in command.chars() {
        match quote {
            Some(open) => {
                if c == open {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_argument = true;
            }
            None if c.is_whitespace() => {
                if in_argument {
                    count += 1;
                    in_argument = false;
                }
            }
            None => in_argument = true,
        }
    }

    if in_argument {
        count += 1;
    }
    count
}

/// Whether `command` looks like a piece of a multi-line command rather than
/// something runnable on its own.
#[must_use]
pub fn is_multiline_fragment(command: &str) -> bool {
    if command.chars().count() > MAX_COMMAND_LENGTH || command.ends_with('\\') {
        return true;
    }

    match command.chars().next() {
        Some(first) => !(first.is_ascii_alphabetic() || matches!(first, '.' | '/' | '~' | '$')),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn timed(days_ago: i64, command: &str) -> String {
        let ts = (now() - Duration::days(days_ago)).timestamp();
        format!(": {ts}:0;{command}")
    }

    fn rank(lines: &[String], days_back: i64, min_args: usize, limit: usize) -> Vec<FrequentCommand> {
        rank_commands(lines.iter().map(String::as_str), now(), days_back, min_args, limit)
    }

    #[test]
    fn test_count_args() {
        assert_eq!(count_args("ls"), 1);
        assert_eq!(count_args("docker ps -a"), 3);
        assert_eq!(count_args("git commit -m \"hello world\""), 4);
        assert_eq!(count_args("echo 'a b' \"c d\""), 3);
        assert_eq!(count_args("  spaced\tout  "), 2);
        assert_eq!(count_args(""), 0);
        assert_eq!(count_args("   "), 0);
    }

    #[test]
    fn test_count_args_unterminated_quote() {
        assert_eq!(count_args("echo \"never closed here"), 2);
    }

    #[test]
    fn test_is_multiline_fragment() {
        assert!(is_multiline_fragment(&"a".repeat(301)));
        assert!(!is_multiline_fragment(&"a".repeat(300)));
        assert!(is_multiline_fragment("make \\"));
        assert!(is_multiline_fragment(""));
        assert!(is_multiline_fragment("}"));
        assert!(is_multiline_fragment("  indented"));
        for ok in ["git status", "./run.sh", "/usr/bin/env", "~/bin/tool", "$EDITOR x"] {
            assert!(!is_multiline_fragment(ok), "{ok:?}");
        }
    }

    #[test]
    fn test_rank_orders_by_count_then_text() {
        let lines = vec![
            timed(1, "kubectl get pods -n default"),
            timed(1, "docker ps --all"),
            timed(2, "docker ps --all"),
            timed(3, "kubectl get pods -n default"),
            timed(4, "docker ps --all"),
            timed(5, "cargo build --release"),
            timed(5, "awk -F: '{print $1}' x"),
        ];

        let result = rank(&lines, 365, 2, 10);

        assert_eq!(
            result[0],
            FrequentCommand {
                command: "docker ps --all".to_string(),
                count: 3
            }
        );
        assert_eq!(result[1].command, "kubectl get pods -n default");
        assert_eq!(result[2].command, "awk -F: '{print $1}' x");
        assert_eq!(result[3].command, "cargo build --release");
        assert_eq!(rank(&lines, 365, 2, 1).len(), 1);
    }

    #[test]
    fn test_rank_applies_cutoff() {
        let lines = vec![
            timed(90, "docker compose up -d"),
            timed(90, "docker compose up -d"),
            timed(10, "terraform plan -out x"),
        ];

        let result = rank(&lines, 60, 2, 0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].command, "terraform plan -out x");
    }

    #[test]
    fn test_rank_drops_untimed_lines_after_first_timestamp() {
        let lines = vec![
            "git log --oneline -n 5".to_string(),
            timed(1, "git push origin main"),
            "git log --oneline -n 5".to_string(),
        ];

        let result = rank(&lines, 30, 2, 0);
        let commands: Vec<&str> = result.iter().map(|f| f.command.as_str()).collect();
        assert_eq!(commands, vec!["git log --oneline -n 5", "git push origin main"]);
        assert!(result.iter().all(|f| f.count == 1));
    }

    #[test]
    fn test_rank_without_timestamps_ignores_dates() {
        let lines = vec!["git log --oneline -n 5".to_string(); 3];
        let result = rank(&lines, 0, 2, 0);
        assert_eq!(result[0].count, 3);
    }

    #[test]
    fn test_rank_filters() {
        let lines: Vec<String> = [
            "git st",
            "bkmk add git st git-status",
            "oneverylongsingleword",
            "| grep something else",
            "docker run \\",
            "docker ps --format json",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let result = rank(&lines, 60, 2, 0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].command, "docker ps --format json");
    }
}
