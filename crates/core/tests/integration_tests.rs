//! Integration tests for bkmk-core
//!
//! These tests verify that the core functionality works together correctly
//! by testing complete workflows end-to-end.

use std::collections::HashSet;
use std::fs;
use std::io::Write;

use bkmk_core::{
    bookmarks::{ActionType, Bookmarks, CommandUpdate},
    error::{Error, ErrorKind},
    file_handling::{list_backups, load_bookmarks, save_bookmarks, save_bookmarks_keeping},
    frequency::{analyze_frequency_from, FrequentCommand},
    history::read_history_from,
};
use chrono::{Duration, Utc};
use tempfile::{NamedTempFile, TempDir};

fn write_lines(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

/// Test the documented history example end to end
#[test]
fn test_history_dedup_example() {
    let file = write_lines(
        &[
            "docker build -t myimage .",
            ": 1699000000:0;kubectl get pods",
            "git status",
            "docker ps -a",
            "ls",
            "cd",
        ]
        .map(String::from),
    );

    let entries = read_history_from(file.path(), 10).unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].command, "docker ps -a");
    assert_eq!(entries[3].command, "docker build -t myimage .");
}

#[test]
fn test_frequency_ranking_from_file() {
    let recent = (Utc::now() - Duration::days(1)).timestamp();
    let mut lines = Vec::new();
    for _ in 0..3 {
        lines.push(format!(": {recent}:0;docker ps --all"));
    }
    for _ in 0..2 {
        lines.push(format!(": {recent}:0;kubectl get pods -n default"));
    }
    let file = write_lines(&lines);

    let result = analyze_frequency_from(file.path(), 365, 2, 10).unwrap();

    assert_eq!(
        result[0],
        FrequentCommand {
            command: "docker ps --all".to_string(),
            count: 3
        }
    );
    assert_eq!(result[1].count, 2);
}

#[test]
fn test_frequency_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = analyze_frequency_from(&dir.path().join("missing"), 60, 2, 20);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Io);
}

/// Saving 25 times keeps exactly the 20 newest backups
#[test]
fn test_backup_rotation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml").to_string_lossy().into_owned();
    let mut store = Bookmarks::new();
    store.add_group("g").unwrap();

    let mut all_backups = HashSet::new();
    for i in 0..25 {
        store
            .add_command("g", &format!("c{i}"), "echo hi", None, ActionType::None)
            .unwrap();
        save_bookmarks_keeping(&path, &store, 20).unwrap();
        all_backups.extend(list_backups(&path).unwrap());
    }

    let kept = list_backups(&path).unwrap();
    assert_eq!(kept.len(), 20);
    // 24 backups were written in total; the four oldest are gone.
    let mut every: Vec<_> = all_backups.into_iter().collect();
    every.sort();
    assert_eq!(every.len(), 24);
    assert_eq!(kept, every[4..].to_vec());
}

#[test]
fn test_store_workflow_persists_ids() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml").to_string_lossy().into_owned();

    let mut store = load_bookmarks(&path).unwrap();
    store.add_group("docker").unwrap();
    store.add_group("git").unwrap();
    let ps = store
        .add_command("docker", "ps", "docker ps -a", None, ActionType::Copy)
        .unwrap();
    let st = store
        .add_command("git", "st", "git status", None, ActionType::None)
        .unwrap();
    store.remove_command_by_id(ps).unwrap();
    save_bookmarks(&path, &store).unwrap();

    let mut reloaded = load_bookmarks(&path).unwrap();
    let id = reloaded
        .add_command("docker", "logs", "docker logs -f", None, ActionType::Run)
        .unwrap();
    assert_eq!(id, 3, "removed IDs are never reused");

    reloaded
        .update_command(
            "git",
            &st.to_string(),
            CommandUpdate {
                name: "status".to_string(),
                command: "git status -sb".to_string(),
                description: Some(String::new()),
                default_action: None,
            },
        )
        .unwrap();
    let (command, group) = reloaded.command_by_id(st).unwrap();
    assert_eq!(group, "git");
    assert_eq!(command.name, "status");
    assert!(command.description.is_none());
}

#[test]
fn test_duplicate_add_leaves_store_unchanged() {
    let mut store = Bookmarks::new();
    store.add_group("docker").unwrap();
    store
        .add_command("docker", "ps", "docker ps", None, ActionType::None)
        .unwrap();

    let result = store.add_command("docker", "ps", "docker ps -a", None, ActionType::None);

    let err = result.unwrap_err();
    assert!(matches!(err, Error::DuplicateCommand { .. }));
    assert_eq!(err.kind(), ErrorKind::Duplicate);
    assert_eq!(store.flat_commands().len(), 1);
    assert_eq!(store.next_id, 2);
}

#[test]
fn test_ids_stay_unique_through_random_edits() {
    let mut store = Bookmarks::new();
    for group in ["a", "b", "c"] {
        store.add_group(group).unwrap();
    }

    let mut seed: u64 = 7;
    for step in 0..200 {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let group = ["a", "b", "c"][(seed >> 33) as usize % 3];
        if seed % 3 == 0 {
            let flat = store.flat_commands();
            if let Some(victim) = flat.get((seed >> 40) as usize % flat.len().max(1)) {
                store.remove_command_by_id(victim.id).unwrap();
            }
        } else {
            store
                .add_command(group, &format!("cmd{step}"), "true", None, ActionType::None)
                .unwrap();
        }

        let ids: Vec<_> = store.flat_commands().iter().map(|c| c.id).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| *id < store.next_id));
    }
}

#[test]
fn test_load_hand_written_yaml() {
    let yaml_content = r"
groups:
  - name: docker
    commands:
      - id: 1
        name: ps
        command: docker ps -a
        description: List containers
        default_action: copy
next_id: 2
editor: nvim
";
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, yaml_content).unwrap();

    let store = load_bookmarks(&path.to_string_lossy()).unwrap();

    assert_eq!(store.editor.as_deref(), Some("nvim"));
    let flat = store.flat_commands();
    assert_eq!(flat[0].default_action, ActionType::Copy);
    assert_eq!(flat[0].description, "List containers");
}
