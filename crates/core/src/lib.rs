//! bkmk Core Library
//!
//! This crate provides the core of bkmk, a terminal command bookmark
//! manager: named shell commands organised into groups, persisted as YAML
//! with rotating backups, plus the shell history parsing used to harvest
//! new bookmarks.
//!
//! # Key Features
//!
//! - **Bookmarks**: Groups of commands with stable, never reused IDs
//! - **Persistence**: YAML load/save with timestamped backups
//! - **History**: bash and zsh extended history parsing with deduplication
//! - **Suggestions**: Frequency analysis of recent history
//! - **Execution**: Running commands, clipboard copy and editor launch
//!
//! # Examples
//!
//! ```no_run
//! use bkmk_core::bookmarks::ActionType;
//! use bkmk_core::config::get_config_path;
//! use bkmk_core::file_handling::{load_bookmarks, save_bookmarks};
//!
//! let path = get_config_path(&None);
//! let mut bookmarks = load_bookmarks(&path)?;
//! bookmarks.add_group("docker")?;
//! bookmarks.add_command("docker", "ps", "docker ps -a", None, ActionType::Copy)?;
//! save_bookmarks(&path, &bookmarks)?;
//! # Ok::<(), bkmk_core::error::Error>(())
//! ```

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod execution;
pub mod file_handling;
pub mod frequency;
pub mod history;
