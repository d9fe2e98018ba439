//! # Registry Filesystem Browser
//!
//! A command-line front end that loads a registry snapshot, mounts it
//! under `/proc/registry`, and runs one browsing command against it.
//!
//! ## Philosophy
//!
//! - **Snapshot in, text out**: The store is built from a JSON file and
//!   never written back
//! - **Same paths as the mount**: Commands take full mount paths, including
//!   `/proc/registry32` and `/proc/registry64`
//! - **Library first**: `main` only parses arguments; everything else is
//!   callable from tests
//!
//! ## Commands
//!
//! - `ls <path>` - List a key, sub-keys first, directories marked with `/`
//! - `cat <path>` - Write a value's raw bytes
//! - `stat <path>` - Print the synthesized POSIX status

pub mod commands;
pub mod runner;

pub use commands::{BrowseCommand, BrowseCommandParser, CommandError};
pub use runner::{load_filesystem, run_command, CliError};
