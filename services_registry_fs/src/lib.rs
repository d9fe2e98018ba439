//! # Registry Filesystem Service
//!
//! This service exposes a registry store as a read-only directory tree
//! under `/proc/registry`.
//!
//! ## Philosophy
//!
//! - Keys are directories, values are files
//! - The store is never written; every mutating request fails
//! - Visibility follows the parent: a key listed by its parent exists even
//!   when it cannot be opened
//! - No handle outlives the operation or open object that took it
//!
//! ## Operations
//!
//! - `exists(path)`: Classify a path as key, value, or absent
//! - `stat(path)`: Synthesize POSIX status from key metadata
//! - `open(path, flags)`: Open a key as a directory or read a value
//! - `opendir(path)`: List sub-keys then values, resumably
//!
//! ## Mount points
//!
//! - `/proc/registry`: the native view
//! - `/proc/registry32`: the 32-bit view
//! - `/proc/registry64`: the 64-bit view

pub mod config;
pub mod context;
pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod mount;
pub mod oracle;
pub mod reader;
pub mod resolver;
pub mod stat;

pub use config::{ConfigError, RegistryFsConfig};
pub use context::MountContext;
pub use dir::{DirEntry, EntryKind, RegistryDir};
pub use error::FsError;
pub use file::{OpenFlags, OpenNode, RegistryFile};
pub use fs::RegistryFs;
pub use mount::MountBinding;
pub use oracle::Existence;
pub use reader::ValueBuffer;
pub use stat::{FileStat, S_IFDIR, S_IFMT, S_IFREG};
