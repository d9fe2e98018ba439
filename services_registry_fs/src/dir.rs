//! Directory listing
//!
//! A [`RegistryDir`] lists the mount root's catalog, or a key's dot
//! entries, sub-keys and values, in that order. The key handle is opened on
//! the first read and held until the listing ends, is rewound, or the
//! directory is closed.
//!
//! A value whose name matches a sub-key listed earlier in the same pass is
//! given the `%val` suffix. The check only looks backwards: if the store
//! changes mid-listing so that a value is listed before its same-named
//! key, the value keeps its plain name.

use crate::context::MountContext;
use crate::error::FsError;
use crate::resolver::{self, LookupIntent, OwnedKey, Resolved};
use crate::stat::{self, FileStat};
use log::{debug, trace};
use registry_host::{HostError, KeyAccess, KeyHandle};
use registry_view::{DirCursor, NameCodec, Phase, RegistryPath, RootCatalog, SeenNames};

const DOT_FILES: [&str; 2] = [".", ".."];

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A key (or root)
    Directory,
    /// A value
    File,
}

/// One listed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Encoded filename
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }
}

/// An open directory
pub struct RegistryDir<'h> {
    ctx: MountContext<'h>,
    path: RegistryPath,
    cursor: DirCursor,
    key: Option<OwnedKey<'h>>,
    seen: SeenNames,
}

impl<'h> RegistryDir<'h> {
    pub(crate) fn new(ctx: MountContext<'h>, path: RegistryPath) -> Self {
        let cursor = DirCursor::new(path.is_mount_root());
        Self {
            ctx,
            path,
            cursor,
            key: None,
            seen: SeenNames::new(),
        }
    }

    /// Path of this directory below the mount point
    pub fn path(&self) -> &RegistryPath {
        &self.path
    }

    /// Returns the next entry, or `None` at the end of the listing
    ///
    /// # Errors
    ///
    /// A failure opening the key or enumerating it releases the handle and
    /// ends the listing until [`RegistryDir::rewinddir`].
    pub fn readdir(&mut self) -> Result<Option<DirEntry>, FsError> {
        loop {
            let ordinal = self.cursor.ordinal();
            match self.cursor.phase() {
                Phase::RootListing => match RootCatalog::entries().get(ordinal as usize) {
                    Some(entry) => {
                        self.cursor.advance();
                        return Ok(Some(DirEntry::directory(entry.name)));
                    }
                    None => self.cursor.finish(),
                },
                Phase::DotFiles => {
                    if ordinal == 0 && self.key.is_none() {
                        self.open_listing_key()?;
                    }
                    match DOT_FILES.get(ordinal as usize) {
                        Some(name) => {
                            self.cursor.advance();
                            return Ok(Some(DirEntry::directory(*name)));
                        }
                        None => self.cursor.enter(Phase::SubKeys),
                    }
                }
                Phase::SubKeys => {
                    let Some(handle) = self.handle() else {
                        self.cursor.finish();
                        continue;
                    };
                    match self.ctx.host.enum_key(handle, ordinal, self.ctx.view) {
                        Ok(name) => {
                            self.cursor.advance();
                            self.seen.insert(&name);
                            if let Some(encoded) = self.encode(&name, false) {
                                return Ok(Some(DirEntry::directory(encoded)));
                            }
                        }
                        Err(err) if err.is_no_more_items() => self.cursor.enter(Phase::Values),
                        Err(err) => return Err(self.fail(err)),
                    }
                }
                Phase::Values => {
                    let Some(handle) = self.handle() else {
                        self.cursor.finish();
                        continue;
                    };
                    match self.ctx.host.enum_value(handle, ordinal, self.ctx.view) {
                        Ok(name) => {
                            self.cursor.advance();
                            if name.is_empty() {
                                let token = self.ctx.config.default_value_token.clone();
                                return Ok(Some(DirEntry::file(token)));
                            }
                            let collides = self.seen.may_contain(&name)
                                && resolver::key_exists(&self.ctx, handle, &name);
                            if let Some(encoded) = self.encode(&name, collides) {
                                return Ok(Some(DirEntry::file(encoded)));
                            }
                        }
                        Err(err) if err.is_no_more_items() => {
                            self.key = None;
                            self.cursor.finish();
                        }
                        Err(err) => return Err(self.fail(err)),
                    }
                }
                Phase::Exhausted => return Ok(None),
            }
        }
    }

    /// Position of the next entry, for [`RegistryDir::seekdir`]
    pub fn telldir(&self) -> u32 {
        self.cursor.tell()
    }

    /// Moves to a position returned by [`RegistryDir::telldir`]
    ///
    /// The listing is replayed from the start, since a position cannot be
    /// mapped back to a host ordinal without walking the sub-keys.
    pub fn seekdir(&mut self, position: u32) -> Result<(), FsError> {
        trace!("seekdir({}, {})", self.path, position);
        self.rewinddir();
        while self.cursor.tell() != position {
            if self.readdir()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    /// Returns to the start of the listing
    pub fn rewinddir(&mut self) {
        self.key = None;
        self.cursor.rewind();
        self.seen.clear();
    }

    /// Status of this directory
    pub fn fstat(&self) -> Result<FileStat, FsError> {
        stat::stat(&self.ctx, &self.path)
    }

    /// Closes the directory
    ///
    /// A failed handle release is reported; the directory is closed either
    /// way.
    pub fn closedir(mut self) -> Result<(), FsError> {
        debug!("closedir({})", self.path);
        match self.key.take() {
            Some(key) => key.close(),
            None => Ok(()),
        }
    }

    fn handle(&self) -> Option<KeyHandle> {
        self.key.as_ref().map(OwnedKey::handle)
    }

    fn open_listing_key(&mut self) -> Result<(), FsError> {
        debug!("opendir({}): opening key", self.path);
        match resolver::open_key(&self.ctx, &self.path, LookupIntent::Key, KeyAccess::Read) {
            Ok(Resolved::Key(key)) => {
                self.key = Some(key);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                self.cursor.finish();
                Err(err)
            }
        }
    }

    fn encode(&self, name: &str, value_suffix: bool) -> Option<String> {
        match NameCodec::encode(name, value_suffix) {
            Ok(encoded) => Some(encoded),
            Err(err) => {
                debug!("readdir({}): skipping entry: {}", self.path, err);
                None
            }
        }
    }

    fn fail(&mut self, err: HostError) -> FsError {
        debug!("readdir({}): enumeration failed: {}", self.path, err);
        self.key = None;
        self.cursor.finish();
        FsError::Io(err)
    }
}

impl Iterator for RegistryDir<'_> {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.readdir().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryFsConfig;
    use registry_host::{
        FailingHost, FailurePolicy, HostOperation, KeyPath, MemoryRegistry, RegistryHost,
        RegistryView, RootKey,
    };

    fn names(dir: RegistryDir<'_>) -> Vec<(String, EntryKind)> {
        dir.map(|entry| {
            let entry = entry.unwrap();
            (entry.name, entry.kind)
        })
        .collect()
    }

    fn open<'h>(
        host: &'h dyn RegistryHost,
        config: &'h RegistryFsConfig,
        path: &str,
    ) -> RegistryDir<'h> {
        let ctx = MountContext::new(host, RegistryView::Native, config);
        RegistryDir::new(ctx, RegistryPath::parse(path))
    }

    #[test]
    fn test_mount_root_listing() {
        let reg = MemoryRegistry::new();
        let config = RegistryFsConfig::default();
        let listed: Vec<String> = names(open(&reg, &config, "/"))
            .into_iter()
            .map(|(name, kind)| {
                assert_eq!(kind, EntryKind::Directory);
                name
            })
            .collect();
        let expected: Vec<&str> = RootCatalog::entries().iter().map(|e| e.name).collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_keys_then_values() {
        let reg = MemoryRegistry::new();
        let key = KeyPath::new(RootKey::CurrentUser).join("Env");
        reg.create_key(&key.clone().join("Sub"));
        reg.set_string(&key, "PATH", "/bin");
        reg.set_string(&key, "", "default");
        reg.set_string(&key, "odd:name", "x");
        let config = RegistryFsConfig::default();

        assert_eq!(
            names(open(&reg, &config, "HKEY_CURRENT_USER/Env")),
            vec![
                (".".to_string(), EntryKind::Directory),
                ("..".to_string(), EntryKind::Directory),
                ("Sub".to_string(), EntryKind::Directory),
                ("PATH".to_string(), EntryKind::File),
                ("@".to_string(), EntryKind::File),
                ("odd%3aname".to_string(), EntryKind::File),
            ]
        );
        assert_eq!(reg.open_handle_count(), 0);
    }

    #[test]
    fn test_handle_held_while_listing() {
        let reg = MemoryRegistry::new();
        reg.create_key(&KeyPath::new(RootKey::Users).join("S-1-5-18"));
        let config = RegistryFsConfig::default();

        let mut dir = open(&reg, &config, "HKEY_USERS/S-1-5-18");
        assert_eq!(reg.open_handle_count(), 0);
        dir.readdir().unwrap();
        assert_eq!(reg.open_handle_count(), 1);
        dir.rewinddir();
        assert_eq!(reg.open_handle_count(), 0);
        dir.readdir().unwrap();
        dir.closedir().unwrap();
        assert_eq!(reg.open_handle_count(), 0);
    }

    #[test]
    fn test_too_long_names_skipped_but_counted() {
        let reg = MemoryRegistry::new();
        let key = KeyPath::new(RootKey::CurrentUser).join("Long");
        reg.create_key(&key.clone().join("/".repeat(100)));
        reg.create_key(&key.clone().join("Short"));
        let config = RegistryFsConfig::default();

        let mut dir = open(&reg, &config, "HKEY_CURRENT_USER/Long");
        dir.readdir().unwrap();
        dir.readdir().unwrap();
        let entry = dir.readdir().unwrap().unwrap();
        assert_eq!(entry.name, "Short");
        assert_eq!(dir.telldir(), 4);
    }

    #[test]
    fn test_open_failure_surfaces_on_first_read() {
        let reg = MemoryRegistry::new();
        let config = RegistryFsConfig::default();
        let mut dir = open(&reg, &config, "HKEY_CURRENT_USER/Missing");
        assert!(matches!(dir.readdir(), Err(FsError::NotFound(_))));
        assert_eq!(dir.readdir(), Ok(None));
    }

    #[test]
    fn test_enumeration_error_ends_listing() {
        let reg = MemoryRegistry::new();
        let key = KeyPath::new(RootKey::CurrentUser).join("Env");
        reg.create_key(&key.clone().join("A"));
        reg.create_key(&key.clone().join("B"));
        let failing = FailingHost::new(
            &reg,
            FailurePolicy::AfterCalls {
                operation: HostOperation::EnumKey,
                count: 1,
                error: HostError::Other(1450),
            },
        );
        let config = RegistryFsConfig::default();

        let mut dir = open(&failing, &config, "HKEY_CURRENT_USER/Env");
        assert_eq!(dir.readdir().unwrap().unwrap().name, ".");
        assert_eq!(dir.readdir().unwrap().unwrap().name, "..");
        assert_eq!(dir.readdir().unwrap().unwrap().name, "A");
        assert_eq!(dir.readdir(), Err(FsError::Io(HostError::Other(1450))));
        assert_eq!(reg.open_handle_count(), 0);
        assert_eq!(dir.readdir(), Ok(None));
    }

    #[test]
    fn test_sentinel_directory_lists_only_dots() {
        let reg = MemoryRegistry::new();
        let config = RegistryFsConfig::default();
        let listed: Vec<String> = names(open(&reg, &config, ".."))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(listed, vec![".", ".."]);
    }

    #[test]
    fn test_seekdir_past_end() {
        let reg = MemoryRegistry::new();
        reg.create_key(&KeyPath::new(RootKey::Users).join("One"));
        let config = RegistryFsConfig::default();

        let mut dir = open(&reg, &config, "HKEY_USERS");
        dir.seekdir(100).unwrap();
        assert_eq!(dir.readdir(), Ok(None));
    }
}
