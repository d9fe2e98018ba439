//! In-memory registry store
//!
//! [`MemoryRegistry`] implements [`RegistryHost`] over a tree kept in
//! memory. It reproduces the host behaviors the filesystem view has to cope
//! with: case-insensitive names, ACL-restricted keys that only a
//! backup-intent open can traverse, a separate 32-bit view, and a live
//! statistics root whose own values change size on every query.

use crate::error::{HostError, HostResult};
use crate::host::RegistryHost;
use crate::types::{
    names_match, KeyAccess, KeyAcl, KeyHandle, KeyInfo, KeySecurity, RegistryView, RootKey,
    ValueInfo, ValueType,
};
use log::trace;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

/// Extra bytes a live value may demand on top of its payload, per query phase
const LIVE_SIZE_JITTER: usize = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Tree {
    Native,
    Wow32,
}

#[derive(Debug, Clone)]
struct ValueEntry {
    name: String,
    value_type: ValueType,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    subkeys: Vec<Node>,
    values: Vec<ValueEntry>,
    acl: KeyAcl,
    security: Option<KeySecurity>,
    last_write: SystemTime,
}

impl Node {
    fn new(name: &str, now: SystemTime) -> Self {
        Self {
            name: name.to_string(),
            subkeys: Vec::new(),
            values: Vec::new(),
            acl: KeyAcl::Open,
            security: None,
            last_write: now,
        }
    }

    fn subkey(&self, name: &str) -> Option<&Node> {
        self.subkeys.iter().find(|k| names_match(&k.name, name))
    }

    fn subkey_or_insert(&mut self, name: &str, now: SystemTime) -> &mut Node {
        let index = match self.subkeys.iter().position(|k| names_match(&k.name, name)) {
            Some(index) => index,
            None => {
                self.subkeys.push(Node::new(name, now));
                self.last_write = now;
                self.subkeys.len() - 1
            }
        };
        &mut self.subkeys[index]
    }

    fn value(&self, name: &str) -> Option<&ValueEntry> {
        self.values.iter().find(|v| names_match(&v.name, name))
    }
}

#[derive(Debug, Clone)]
struct OpenKey {
    root: RootKey,
    tree: Tree,
    path: Vec<String>,
}

#[derive(Debug)]
struct State {
    trees: BTreeMap<(RootKey, Tree), Node>,
    handles: HashMap<KeyHandle, OpenKey>,
    next_handle: u64,
    live_queries: usize,
}

impl State {
    fn tree_for(&self, root: RootKey, view: RegistryView) -> Tree {
        if view == RegistryView::Wow32 && self.trees.contains_key(&(root, Tree::Wow32)) {
            Tree::Wow32
        } else {
            Tree::Native
        }
    }

    /// The view selects the tree behind a predefined handle; an opened
    /// handle stays in the tree it was opened in.
    fn resolve(&self, key: KeyHandle, view: RegistryView) -> HostResult<(OpenKey, &Node)> {
        let location = match RootKey::from_handle(key) {
            Some(root) => OpenKey {
                root,
                tree: self.tree_for(root, view),
                path: Vec::new(),
            },
            None => self
                .handles
                .get(&key)
                .cloned()
                .ok_or(HostError::InvalidHandle(key))?,
        };

        let mut node = self
            .trees
            .get(&(location.root, location.tree))
            .ok_or(HostError::InvalidHandle(key))?;
        for name in &location.path {
            node = node.subkey(name).ok_or(HostError::InvalidHandle(key))?;
        }
        Ok((location, node))
    }

    fn node_mut(&mut self, path: &KeyPath, now: SystemTime) -> &mut Node {
        let tree = if path.wow32 { Tree::Wow32 } else { Tree::Native };
        let mut node = self
            .trees
            .entry((path.root, tree))
            .or_insert_with(|| Node::new(path.root.name(), now));
        for name in &path.components {
            node = node.subkey_or_insert(name, now);
        }
        node
    }

    fn open(
        &mut self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
        backup: bool,
    ) -> HostResult<KeyHandle> {
        let (mut location, node) = self.resolve(parent, view)?;
        let child = node.subkey(name).ok_or(HostError::NotFound)?;

        let allowed = match child.acl {
            KeyAcl::Open => true,
            KeyAcl::QueryOnly => backup || access == KeyAccess::QueryValue,
            KeyAcl::BackupOnly => backup,
            KeyAcl::Denied => false,
        };
        if !allowed {
            return Err(HostError::AccessDenied);
        }

        location.path.push(child.name.clone());
        let handle = KeyHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        trace!("open {} -> {} (backup: {})", location.path.join("\\"), handle, backup);
        self.handles.insert(handle, location);
        Ok(handle)
    }
}

/// Location of a key in a [`MemoryRegistry`], used to populate the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    root: RootKey,
    wow32: bool,
    components: Vec<String>,
}

impl KeyPath {
    /// Creates a path naming a root key
    pub fn new(root: RootKey) -> Self {
        Self {
            root,
            wow32: false,
            components: Vec::new(),
        }
    }

    /// Parses a backslash-separated path below `root`
    ///
    /// Forward slashes are ordinary name characters in the store, so only
    /// `\` separates components here.
    pub fn parse(root: RootKey, path: &str) -> Self {
        let mut key_path = Self::new(root);
        key_path.components = path
            .split('\\')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        key_path
    }

    /// Appends a sub-key name
    pub fn join(mut self, name: impl Into<String>) -> Self {
        self.components.push(name.into());
        self
    }

    /// Addresses the 32-bit view of the store instead of the native one
    pub fn in_wow32(mut self) -> Self {
        self.wow32 = true;
        self
    }

    /// Returns the root key
    pub fn root(&self) -> RootKey {
        self.root
    }

    /// Returns the sub-key names below the root
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

/// An in-memory registry store
///
/// All population methods take `&self` so the store can be changed while
/// directories are open on it, the way another process could change a
/// live registry.
#[derive(Debug)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

impl MemoryRegistry {
    /// Creates a store holding the empty predefined roots
    pub fn new() -> Self {
        let now = SystemTime::now();
        let trees = RootKey::ALL
            .into_iter()
            .map(|root| ((root, Tree::Native), Node::new(root.name(), now)))
            .collect();
        Self {
            state: Mutex::new(State {
                trees,
                handles: HashMap::new(),
                next_handle: 1,
                live_queries: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a key (and any missing parents)
    pub fn create_key(&self, path: &KeyPath) {
        self.state().node_mut(path, SystemTime::now());
    }

    /// Sets a value, creating the key if needed
    ///
    /// An empty `name` sets the key's default value.
    pub fn set_value(
        &self,
        path: &KeyPath,
        name: &str,
        value_type: ValueType,
        data: impl Into<Vec<u8>>,
    ) {
        let now = SystemTime::now();
        let mut state = self.state();
        let node = state.node_mut(path, now);
        let entry = ValueEntry {
            name: name.to_string(),
            value_type,
            data: data.into(),
        };
        match node.values.iter_mut().find(|v| names_match(&v.name, name)) {
            Some(existing) => *existing = entry,
            None => node.values.push(entry),
        }
        node.last_write = now;
    }

    /// Sets a string value
    pub fn set_string(&self, path: &KeyPath, name: &str, text: &str) {
        self.set_value(path, name, ValueType::String, text.as_bytes());
    }

    /// Sets a DWORD value (little-endian)
    pub fn set_dword(&self, path: &KeyPath, name: &str, value: u32) {
        self.set_value(path, name, ValueType::Dword, value.to_le_bytes());
    }

    /// Sets the access control of a key
    pub fn set_acl(&self, path: &KeyPath, acl: KeyAcl) {
        self.state().node_mut(path, SystemTime::now()).acl = acl;
    }

    /// Sets (or clears) the security metadata of a key
    pub fn set_security(&self, path: &KeyPath, security: Option<KeySecurity>) {
        self.state().node_mut(path, SystemTime::now()).security = security;
    }

    /// Overrides the last-write time of a key
    pub fn set_last_write(&self, path: &KeyPath, when: SystemTime) {
        self.state().node_mut(path, when).last_write = when;
    }

    /// Returns the number of handles currently open
    pub fn open_handle_count(&self) -> usize {
        self.state().handles.len()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryHost for MemoryRegistry {
    fn open_key(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        self.state().open(parent, name, access, view, false)
    }

    fn open_key_backup(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        self.state().open(parent, name, access, view, true)
    }

    fn enum_key(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        let state = self.state();
        let (_, node) = state.resolve(key, view)?;
        node.subkeys
            .get(index as usize)
            .map(|k| k.name.clone())
            .ok_or(HostError::NoMoreItems)
    }

    fn enum_value(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        let state = self.state();
        let (_, node) = state.resolve(key, view)?;
        node.values
            .get(index as usize)
            .map(|v| v.name.clone())
            .ok_or(HostError::NoMoreItems)
    }

    fn query_value(
        &self,
        key: KeyHandle,
        name: &str,
        buffer: Option<&mut [u8]>,
        view: RegistryView,
    ) -> HostResult<ValueInfo> {
        let mut state = self.state();
        let (location, node) = state.resolve(key, view)?;
        let value = node.value(name).ok_or(HostError::NotFound)?;
        let value_type = value.value_type;
        let data = value.data.clone();

        let required = if location.root == RootKey::PerformanceData && location.path.is_empty() {
            state.live_queries += 1;
            data.len() + (state.live_queries % 3) * LIVE_SIZE_JITTER
        } else {
            data.len()
        };

        match buffer {
            None => Ok(ValueInfo {
                value_type,
                size: required,
            }),
            Some(buffer) if buffer.len() < required => Err(HostError::MoreData { required }),
            Some(buffer) => {
                buffer[..data.len()].copy_from_slice(&data);
                Ok(ValueInfo {
                    value_type,
                    size: data.len(),
                })
            }
        }
    }

    fn query_info(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeyInfo> {
        let state = self.state();
        let (_, node) = state.resolve(key, view)?;
        Ok(KeyInfo {
            subkey_count: node.subkeys.len() as u32,
            value_count: node.values.len() as u32,
            last_write: node.last_write,
        })
    }

    fn query_security(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeySecurity> {
        let state = self.state();
        let (_, node) = state.resolve(key, view)?;
        node.security.ok_or(HostError::AccessDenied)
    }

    fn close_key(&self, key: KeyHandle) -> HostResult<()> {
        if key.is_predefined() {
            return Ok(());
        }
        match self.state().handles.remove(&key) {
            Some(_) => Ok(()),
            None => Err(HostError::InvalidHandle(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const NATIVE: RegistryView = RegistryView::Native;

    fn software() -> KeyPath {
        KeyPath::new(RootKey::LocalMachine).join("Software")
    }

    #[test]
    fn test_open_and_enumerate() {
        let reg = MemoryRegistry::new();
        reg.create_key(&software().join("Alpha"));
        reg.create_key(&software().join("Beta"));
        reg.set_string(&software(), "Version", "1.0");

        let key = reg
            .open_key(KeyHandle::LOCAL_MACHINE, "SOFTWARE", KeyAccess::Read, NATIVE)
            .unwrap();
        assert_eq!(reg.enum_key(key, 0, NATIVE).unwrap(), "Alpha");
        assert_eq!(reg.enum_key(key, 1, NATIVE).unwrap(), "Beta");
        assert_eq!(reg.enum_key(key, 2, NATIVE), Err(HostError::NoMoreItems));
        assert_eq!(reg.enum_value(key, 0, NATIVE).unwrap(), "Version");
        assert_eq!(reg.enum_value(key, 1, NATIVE), Err(HostError::NoMoreItems));

        assert_eq!(reg.open_handle_count(), 1);
        reg.close_key(key).unwrap();
        assert_eq!(reg.open_handle_count(), 0);
        assert_eq!(reg.close_key(key), Err(HostError::InvalidHandle(key)));
    }

    #[test]
    fn test_missing_key() {
        let reg = MemoryRegistry::new();
        let result =
            reg.open_key(KeyHandle::USERS, "nobody", KeyAccess::Read, NATIVE);
        assert_eq!(result, Err(HostError::NotFound));
    }

    #[test]
    fn test_query_value_sizes() {
        let reg = MemoryRegistry::new();
        reg.set_string(&software(), "", "hi");
        let key = reg
            .open_key(KeyHandle::LOCAL_MACHINE, "Software", KeyAccess::Read, NATIVE)
            .unwrap();

        let info = reg.query_value(key, "", None, NATIVE).unwrap();
        assert_eq!(info.size, 2);
        assert_eq!(info.value_type, ValueType::String);

        let mut small = [0u8; 1];
        assert_eq!(
            reg.query_value(key, "", Some(&mut small), NATIVE),
            Err(HostError::MoreData { required: 2 })
        );

        let mut buf = [0u8; 8];
        let filled = reg.query_value(key, "", Some(&mut buf), NATIVE).unwrap();
        assert_eq!(&buf[..filled.size], b"hi");
        reg.close_key(key).unwrap();
    }

    #[test]
    fn test_acl_levels() {
        let reg = MemoryRegistry::new();
        let base = KeyPath::new(RootKey::LocalMachine);
        reg.set_acl(&base.clone().join("Sam"), KeyAcl::BackupOnly);
        reg.set_acl(&base.clone().join("Security"), KeyAcl::Denied);
        reg.set_acl(&base.clone().join("Hardware"), KeyAcl::QueryOnly);
        let root = KeyHandle::LOCAL_MACHINE;
        let view = NATIVE;

        assert_eq!(
            reg.open_key(root, "Sam", KeyAccess::Read, view),
            Err(HostError::AccessDenied)
        );
        let sam = reg.open_key_backup(root, "Sam", KeyAccess::Read, view).unwrap();
        reg.close_key(sam).unwrap();

        assert_eq!(
            reg.open_key_backup(root, "Security", KeyAccess::Read, view),
            Err(HostError::AccessDenied)
        );

        assert_eq!(
            reg.open_key(root, "Hardware", KeyAccess::Read, view),
            Err(HostError::AccessDenied)
        );
        let hw = reg.open_key(root, "Hardware", KeyAccess::QueryValue, view).unwrap();
        reg.close_key(hw).unwrap();
    }

    #[test]
    fn test_live_values_change_size() {
        let reg = MemoryRegistry::new();
        reg.set_value(
            &KeyPath::new(RootKey::PerformanceData),
            "Global",
            ValueType::Binary,
            vec![7u8; 100],
        );
        let root = KeyHandle::PERFORMANCE_DATA;

        let first = reg.query_value(root, "Global", None, NATIVE).unwrap().size;
        let second = reg.query_value(root, "Global", None, NATIVE).unwrap().size;
        assert_ne!(first, second);

        let mut buf = vec![0u8; 100 + 2 * LIVE_SIZE_JITTER];
        let filled = reg.query_value(root, "Global", Some(&mut buf), NATIVE).unwrap();
        assert_eq!(filled.size, 100);
    }

    #[test]
    fn test_wow32_view_falls_back_to_native() {
        let reg = MemoryRegistry::new();
        reg.create_key(&KeyPath::new(RootKey::CurrentUser).join("Native"));

        let key = reg
            .open_key(KeyHandle::CURRENT_USER, "Native", KeyAccess::Read, RegistryView::Wow32)
            .unwrap();
        reg.close_key(key).unwrap();

        reg.create_key(&KeyPath::new(RootKey::CurrentUser).in_wow32().join("Only32"));
        let result =
            reg.open_key(KeyHandle::CURRENT_USER, "Native", KeyAccess::Read, RegistryView::Wow32);
        assert_eq!(result, Err(HostError::NotFound));
        let key = reg
            .open_key(KeyHandle::CURRENT_USER, "Only32", KeyAccess::Read, RegistryView::Wow32)
            .unwrap();
        reg.close_key(key).unwrap();
        let result =
            reg.open_key(KeyHandle::CURRENT_USER, "Only32", KeyAccess::Read, RegistryView::Wow64);
        assert_eq!(result, Err(HostError::NotFound));
    }

    #[test]
    fn test_predefined_handle_follows_view_for_every_call() {
        let reg = MemoryRegistry::new();
        let native = KeyPath::new(RootKey::CurrentUser);
        let legacy = KeyPath::new(RootKey::CurrentUser).in_wow32();
        reg.create_key(&native.clone().join("Native"));
        reg.set_string(&native, "Arch", "amd64");
        reg.create_key(&legacy.clone().join("Only32"));
        reg.set_string(&legacy, "Arch", "x86");
        let root = KeyHandle::CURRENT_USER;

        assert_eq!(reg.enum_key(root, 0, RegistryView::Wow32).unwrap(), "Only32");
        assert_eq!(reg.enum_key(root, 1, RegistryView::Wow32), Err(HostError::NoMoreItems));
        assert_eq!(reg.enum_key(root, 0, RegistryView::Wow64).unwrap(), "Native");
        assert_eq!(reg.enum_value(root, 0, RegistryView::Wow32).unwrap(), "Arch");
        assert_eq!(reg.query_value(root, "Arch", None, RegistryView::Wow32).unwrap().size, 3);
        assert_eq!(reg.query_value(root, "Arch", None, NATIVE).unwrap().size, 5);
        assert_eq!(reg.query_info(root, RegistryView::Wow32).unwrap().subkey_count, 1);
    }

    #[test]
    fn test_metadata() {
        let reg = MemoryRegistry::new();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        reg.create_key(&software().join("Child"));
        reg.set_dword(&software(), "Count", 3);
        reg.set_last_write(&software(), when);
        reg.set_security(
            &software(),
            Some(KeySecurity {
                uid: 18,
                gid: 544,
                mode: 0o750,
            }),
        );

        let key = reg
            .open_key(KeyHandle::LOCAL_MACHINE, "Software", KeyAccess::Read, NATIVE)
            .unwrap();
        let info = reg.query_info(key, NATIVE).unwrap();
        assert_eq!(info.subkey_count, 1);
        assert_eq!(info.value_count, 1);
        assert_eq!(info.last_write, when);
        assert_eq!(reg.query_security(key, NATIVE).unwrap().uid, 18);
        reg.close_key(key).unwrap();

        assert_eq!(
            reg.query_security(KeyHandle::USERS, NATIVE),
            Err(HostError::AccessDenied)
        );
    }

    #[test]
    fn test_key_path_parse() {
        let path = KeyPath::parse(RootKey::Users, "S-1-5-18\\Control Panel\\a/b");
        assert_eq!(path.root(), RootKey::Users);
        assert_eq!(path.components(), &["S-1-5-18", "Control Panel", "a/b"]);
    }
}
