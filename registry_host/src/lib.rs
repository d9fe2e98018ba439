//! # Registry Host
//!
//! This crate defines the host registry access API that the registry
//! filesystem view is built on.
//!
//! ## Philosophy
//!
//! **The host store must be fully abstracted and swappable.**
//!
//! Nothing above this crate talks to a concrete store. Every open,
//! enumeration, and query goes through the [`RegistryHost`] trait, so the
//! filesystem logic can be exercised against an in-memory store exactly as
//! it would run against the real one.
//!
//! ## Design Principles
//!
//! 1. **Handles are plain values**: A [`KeyHandle`] is an opaque token; the
//!    predefined root handles are constants and are never closed
//! 2. **Read-only surface**: The trait has no write operations
//! 3. **Host semantics are explicit**: "no more items", "buffer too small",
//!    and "access denied" are distinct [`HostError`] variants
//! 4. **Testable**: [`MemoryRegistry`] models the host, [`FailingHost`]
//!    injects faults

pub mod error;
pub mod failing;
pub mod host;
pub mod memory;
pub mod snapshot;
pub mod types;

pub use error::{HostError, HostResult};
pub use failing::{FailingHost, FailurePolicy, HostOperation};
pub use host::RegistryHost;
pub use memory::{KeyPath, MemoryRegistry};
pub use snapshot::{
    RegistrySnapshot, SnapshotData, SnapshotError, SnapshotKey, SnapshotRoot, SnapshotValue,
};
pub use types::{
    names_match, KeyAccess, KeyAcl, KeyHandle, KeyInfo, KeySecurity, RegistryView, RootKey,
    ValueInfo, ValueType,
};
