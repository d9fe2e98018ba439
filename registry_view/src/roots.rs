//! The root catalog
//!
//! The mount root lists a fixed set of names. The first two are the dot
//! entries, which have no key behind them; the rest are the predefined
//! roots of the store.

use registry_host::{KeyHandle, RootKey};

/// One name in the root listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootEntry {
    /// Name as listed
    pub name: &'static str,
    /// The root behind the name, or `None` for the dot entries
    pub root: Option<RootKey>,
}

impl RootEntry {
    const fn new(name: &'static str, root: Option<RootKey>) -> Self {
        Self { name, root }
    }

    /// Returns the predefined handle, or `None` for the dot entries
    pub fn handle(&self) -> Option<KeyHandle> {
        self.root.map(|root| root.handle())
    }

    /// Returns true if this entry has no key behind it
    pub fn is_sentinel(&self) -> bool {
        self.root.is_none()
    }
}

static ROOT_CATALOG: [RootEntry; 8] = [
    RootEntry::new(".", None),
    RootEntry::new("..", None),
    RootEntry::new("HKEY_CLASSES_ROOT", Some(RootKey::ClassesRoot)),
    RootEntry::new("HKEY_CURRENT_CONFIG", Some(RootKey::CurrentConfig)),
    RootEntry::new("HKEY_CURRENT_USER", Some(RootKey::CurrentUser)),
    RootEntry::new("HKEY_LOCAL_MACHINE", Some(RootKey::LocalMachine)),
    RootEntry::new("HKEY_USERS", Some(RootKey::Users)),
    RootEntry::new("HKEY_PERFORMANCE_DATA", Some(RootKey::PerformanceData)),
];

/// Read-only access to the root listing
pub struct RootCatalog;

impl RootCatalog {
    /// All entries, in listing order
    pub fn entries() -> &'static [RootEntry] {
        &ROOT_CATALOG
    }

    /// Number of entries, which is also the mount root's link count
    pub fn len() -> usize {
        ROOT_CATALOG.len()
    }

    /// Finds an entry by name (case-insensitive)
    pub fn lookup(name: &str) -> Option<&'static RootEntry> {
        ROOT_CATALOG
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }
}
