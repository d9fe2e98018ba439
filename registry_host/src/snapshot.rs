//! Serializable registry snapshots
//!
//! A snapshot describes a store as JSON so fixtures and the command-line
//! tool can load a registry without a live host:
//!
//! ```json
//! {
//!   "roots": [
//!     {
//!       "root": "HKEY_LOCAL_MACHINE",
//!       "key": {
//!         "subkeys": [
//!           { "name": "Software", "values": [{ "name": "", "type": "String", "data": "hi" }] }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```

use crate::memory::{KeyPath, MemoryRegistry};
use crate::types::{KeyAcl, KeySecurity, RootKey, ValueType};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Snapshot loading errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Root {0} listed more than once")]
    DuplicateRoot(String),
}

/// A whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub roots: Vec<SnapshotRoot>,
}

/// One predefined root and its contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRoot {
    pub root: RootKey,
    /// Populate the 32-bit view instead of the native one
    #[serde(default)]
    pub wow32: bool,
    pub key: SnapshotKey,
}

/// A key with its values and sub-keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotKey {
    /// Ignored for the key directly under a [`SnapshotRoot`]
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subkeys: Vec<SnapshotKey>,
    #[serde(default)]
    pub values: Vec<SnapshotValue>,
    #[serde(default)]
    pub acl: KeyAcl,
    #[serde(default)]
    pub security: Option<KeySecurity>,
    /// Seconds since the Unix epoch
    #[serde(default)]
    pub last_write: Option<u64>,
}

/// A named value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotValue {
    /// Empty for the default value
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    pub data: SnapshotData,
}

/// Value payload
///
/// Text is stored as its UTF-8 bytes; numbers as little-endian 32-bit words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotData {
    Text(String),
    Bytes(Vec<u8>),
    Dword(u32),
}

impl SnapshotData {
    /// Returns the raw bytes stored for this payload
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            SnapshotData::Text(text) => text.as_bytes().to_vec(),
            SnapshotData::Bytes(bytes) => bytes.clone(),
            SnapshotData::Dword(word) => word.to_le_bytes().to_vec(),
        }
    }
}

impl RegistrySnapshot {
    /// Parses a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: RegistrySnapshot = serde_json::from_str(json)?;
        let mut seen: Vec<(RootKey, bool)> = Vec::new();
        for root in &snapshot.roots {
            if seen.contains(&(root.root, root.wow32)) {
                return Err(SnapshotError::DuplicateRoot(root.root.name().to_string()));
            }
            seen.push((root.root, root.wow32));
        }
        Ok(snapshot)
    }

    /// Serializes the snapshot to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl MemoryRegistry {
    /// Builds a store from a snapshot
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let registry = MemoryRegistry::new();
        for root in &snapshot.roots {
            let mut path = KeyPath::new(root.root);
            if root.wow32 {
                path = path.in_wow32();
            }
            load_key(&registry, &path, &root.key);
        }
        registry
    }
}

fn load_key(registry: &MemoryRegistry, path: &KeyPath, key: &SnapshotKey) {
    registry.create_key(path);
    for value in &key.values {
        registry.set_value(path, &value.name, value.value_type, value.data.to_bytes());
    }
    for subkey in &key.subkeys {
        load_key(registry, &path.clone().join(subkey.name.clone()), subkey);
    }
    if key.acl != KeyAcl::Open {
        registry.set_acl(path, key.acl);
    }
    if key.security.is_some() {
        registry.set_security(path, key.security);
    }
    // Applied last so loading children does not bump it
    if let Some(secs) = key.last_write {
        registry.set_last_write(path, SystemTime::UNIX_EPOCH + Duration::from_secs(secs));
    }
}
