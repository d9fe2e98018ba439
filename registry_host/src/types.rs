//! Handles, roots, views, and value metadata

use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Opaque handle to an open key
///
/// Predefined root handles are fixed constants; every other handle is
/// issued by [`crate::RegistryHost::open_key`] and must be released with
/// [`crate::RegistryHost::close_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyHandle(u64);

impl KeyHandle {
    pub const CLASSES_ROOT: KeyHandle = KeyHandle(0x8000_0000);
    pub const CURRENT_USER: KeyHandle = KeyHandle(0x8000_0001);
    pub const LOCAL_MACHINE: KeyHandle = KeyHandle(0x8000_0002);
    pub const USERS: KeyHandle = KeyHandle(0x8000_0003);
    pub const PERFORMANCE_DATA: KeyHandle = KeyHandle(0x8000_0004);
    pub const CURRENT_CONFIG: KeyHandle = KeyHandle(0x8000_0005);

    /// Creates a handle from a raw host value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw host value
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns true for the predefined root handles
    pub fn is_predefined(&self) -> bool {
        RootKey::from_handle(*self).is_some()
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:#x})", self.0)
    }
}

/// The predefined top-level keys of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RootKey {
    #[serde(rename = "HKEY_CLASSES_ROOT")]
    ClassesRoot,
    #[serde(rename = "HKEY_CURRENT_CONFIG")]
    CurrentConfig,
    #[serde(rename = "HKEY_CURRENT_USER")]
    CurrentUser,
    #[serde(rename = "HKEY_LOCAL_MACHINE")]
    LocalMachine,
    #[serde(rename = "HKEY_USERS")]
    Users,
    /// Live statistics root; its values are computed on every query
    #[serde(rename = "HKEY_PERFORMANCE_DATA")]
    PerformanceData,
}

impl RootKey {
    /// All roots, in listing order
    pub const ALL: [RootKey; 6] = [
        RootKey::ClassesRoot,
        RootKey::CurrentConfig,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::PerformanceData,
    ];

    /// Returns the canonical name of this root
    pub fn name(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::PerformanceData => "HKEY_PERFORMANCE_DATA",
        }
    }

    /// Returns the predefined handle for this root
    pub fn handle(&self) -> KeyHandle {
        match self {
            RootKey::ClassesRoot => KeyHandle::CLASSES_ROOT,
            RootKey::CurrentConfig => KeyHandle::CURRENT_CONFIG,
            RootKey::CurrentUser => KeyHandle::CURRENT_USER,
            RootKey::LocalMachine => KeyHandle::LOCAL_MACHINE,
            RootKey::Users => KeyHandle::USERS,
            RootKey::PerformanceData => KeyHandle::PERFORMANCE_DATA,
        }
    }

    /// Maps a predefined handle back to its root
    pub fn from_handle(handle: KeyHandle) -> Option<RootKey> {
        RootKey::ALL.into_iter().find(|root| root.handle() == handle)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which representation of the store a call addresses
///
/// The store may keep parallel 32-bit and 64-bit trees. The selector is
/// chosen once per mount and threaded unchanged through every host call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegistryView {
    /// Whatever the host considers native
    #[default]
    Native,
    /// The 32-bit view
    Wow32,
    /// The 64-bit view
    Wow64,
}

/// Rights requested when opening a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAccess {
    /// Full read: enumerate and query
    Read,
    /// Query values and metadata only
    QueryValue,
}

/// Access control applied to a key by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyAcl {
    /// Any open succeeds
    #[default]
    Open,
    /// Only query-rights opens succeed without backup intent
    QueryOnly,
    /// Ordinary opens are denied; backup-intent opens succeed
    BackupOnly,
    /// Every open is denied
    Denied,
}

/// Value type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    None,
    String,
    ExpandString,
    #[default]
    Binary,
    Dword,
    DwordBigEndian,
    Link,
    MultiString,
    ResourceList,
    FullResourceDescriptor,
    ResourceRequirementsList,
    Qword,
    Unknown(u32),
}

impl ValueType {
    /// Creates a value type from the host's numeric tag
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            8 => ValueType::ResourceList,
            9 => ValueType::FullResourceDescriptor,
            10 => ValueType::ResourceRequirementsList,
            11 => ValueType::Qword,
            other => ValueType::Unknown(other),
        }
    }

    /// Returns the host's numeric tag
    pub fn as_raw(&self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::ResourceList => 8,
            ValueType::FullResourceDescriptor => 9,
            ValueType::ResourceRequirementsList => 10,
            ValueType::Qword => 11,
            ValueType::Unknown(raw) => *raw,
        }
    }
}

/// Result of a value query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueInfo {
    /// Type tag of the value
    pub value_type: ValueType,
    /// Byte length of the value (or bytes written, for a fill)
    pub size: usize,
}

/// Key metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    /// Number of direct sub-keys
    pub subkey_count: u32,
    /// Number of values
    pub value_count: u32,
    /// Last time the key or its values were written
    pub last_write: SystemTime,
}

/// Owner and permission metadata derived from the key's security descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySecurity {
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Permission bits (rwxrwxrwx)
    pub mode: u32,
}

/// Compares two store names the way the host does (case-insensitive)
pub fn names_match(a: &str, b: &str) -> bool {
    if a.len() == b.len() && a.eq_ignore_ascii_case(b) {
        return true;
    }
    if a.is_ascii() && b.is_ascii() {
        return false;
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
