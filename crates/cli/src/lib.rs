//! bkmk CLI Library
//!
//! This crate provides the command-line interface for bkmk, a bookmark
//! manager for shell commands. It parses subcommands, dispatches them to
//! the core store, and hosts the interactive terminal session.
//!
//! # Key Features
//!
//! - **Interactive Session**: Browse groups, search, run or copy bookmarks
//! - **History Harvesting**: Bookmark commands straight from shell history
//! - **Suggestions**: List frequently used commands worth bookmarking
//! - **Scripting**: Add, remove and list bookmarks without the interface
//!
//! # Architecture
//!
//! - [`cli_args`]: Command-line argument parsing
//! - [`commands`]: Subcommand dispatch and output formatting
//! - [`session`]: The interactive state machine, its views and terminal loop
//!
//! # Examples
//!
//! ```bash
//! # Interactive mode
//! bkmk
//!
//! # Add a bookmark
//! bkmk add docker ps "docker ps -a" List all containers
//!
//! # Bookmark the command you just ran
//! bkmk last
//!
//! # Show bookmarking candidates from history
//! bkmk suggest
//! ```

pub mod cli_args;
pub mod commands;
pub mod session;
