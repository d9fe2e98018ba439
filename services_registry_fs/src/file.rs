//! Opening paths
//!
//! The filesystem is read-only. Opening a key yields a directory; opening a
//! value reads it whole into a buffer owned by the returned file, which
//! then serves reads and seeks without touching the store again.

use crate::context::MountContext;
use crate::dir::RegistryDir;
use crate::error::FsError;
use crate::oracle::{self, Existence};
use crate::reader::{self, ValueBuffer};
use crate::resolver::{self, LookupIntent, Resolved};
use crate::stat::{self, FileStat};
use bitflags::bitflags;
use log::debug;
use registry_host::{KeyAccess, ValueType};
use registry_view::{NameCodec, RegistryPath, RootCatalog};
use std::io::{self, Read, Seek, SeekFrom};

bitflags! {
    /// Flags accepted by `open`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const WRONLY = 0x0001;
        const RDWR = 0x0002;
        const APPEND = 0x0008;
        const CREAT = 0x0200;
        const EXCL = 0x0800;
        const DIRECTORY = 0x1_0000;
    }
}

impl OpenFlags {
    /// Read-only open
    pub const RDONLY: OpenFlags = OpenFlags::empty();

    /// True if the access mode asks for writing
    pub fn wants_write(&self) -> bool {
        self.intersects(OpenFlags::WRONLY | OpenFlags::RDWR)
    }

    /// True for `O_CREAT | O_EXCL`
    pub fn is_exclusive_create(&self) -> bool {
        self.contains(OpenFlags::CREAT | OpenFlags::EXCL)
    }
}

/// An open value
pub struct RegistryFile<'h> {
    ctx: MountContext<'h>,
    path: RegistryPath,
    buffer: ValueBuffer,
    position: u64,
}

impl<'h> RegistryFile<'h> {
    /// Path of this value below the mount point
    pub fn path(&self) -> &RegistryPath {
        &self.path
    }

    /// The whole value
    pub fn contents(&self) -> &[u8] {
        &self.buffer.data
    }

    /// Type tag reported by the store
    pub fn value_type(&self) -> ValueType {
        self.buffer.value_type
    }

    /// Current read position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Status of this value
    pub fn fstat(&self) -> Result<FileStat, FsError> {
        stat::stat(&self.ctx, &self.path)
    }

    /// Closes the file
    ///
    /// The key handle was released when the value was read, so there is
    /// nothing left to release and this cannot fail.
    pub fn close(self) -> Result<(), FsError> {
        debug!("close({})", self.path);
        Ok(())
    }
}

impl Read for RegistryFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = &self.buffer.data;
        let start = usize::try_from(self.position).unwrap_or(usize::MAX).min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for RegistryFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base, offset) = match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(offset);
            }
            SeekFrom::End(offset) => (self.buffer.data.len() as u64, offset),
            SeekFrom::Current(offset) => (self.position, offset),
        };
        match base.checked_add_signed(offset) {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of value",
            )),
        }
    }
}

/// Result of opening a path
pub enum OpenNode<'h> {
    Directory(RegistryDir<'h>),
    File(RegistryFile<'h>),
}

impl<'h> OpenNode<'h> {
    pub fn is_directory(&self) -> bool {
        matches!(self, OpenNode::Directory(_))
    }

    /// Returns the directory, or `NotADirectory` for a value
    pub fn into_directory(self) -> Result<RegistryDir<'h>, FsError> {
        match self {
            OpenNode::Directory(dir) => Ok(dir),
            OpenNode::File(file) => Err(FsError::NotADirectory(file.path.to_string())),
        }
    }

    /// Returns the file, or `IsDirectory` for a key
    pub fn into_file(self) -> Result<RegistryFile<'h>, FsError> {
        match self {
            OpenNode::Directory(dir) => Err(FsError::IsDirectory(dir.path().to_string())),
            OpenNode::File(file) => Ok(file),
        }
    }
}

/// Opens `path` with `flags`
pub fn open_node<'h>(
    ctx: &MountContext<'h>,
    path: &RegistryPath,
    flags: OpenFlags,
) -> Result<OpenNode<'h>, FsError> {
    debug!("open({}, {:?})", path, flags);
    let display = || path.to_string();

    let Some(leaf) = path.leaf() else {
        if flags.is_exclusive_create() {
            return Err(FsError::AlreadyExists(display()));
        }
        if flags.wants_write() {
            return Err(FsError::IsDirectory(display()));
        }
        return Ok(OpenNode::Directory(RegistryDir::new(*ctx, path.clone())));
    };

    if flags.wants_write() {
        return Err(FsError::ReadOnly(display()));
    }

    if path.depth() == 1 {
        return match RootCatalog::lookup(leaf) {
            Some(_) if flags.is_exclusive_create() => Err(FsError::AlreadyExists(display())),
            Some(_) => Ok(OpenNode::Directory(RegistryDir::new(*ctx, path.clone()))),
            None if flags.contains(OpenFlags::CREAT) => Err(FsError::ReadOnly(display())),
            None => Err(FsError::NotFound(display())),
        };
    }

    let decoded = NameCodec::decode(leaf)?;

    if flags.contains(OpenFlags::CREAT) {
        match oracle::exists(ctx, path)? {
            Existence::Absent => return Err(FsError::ReadOnly(display())),
            _ if flags.contains(OpenFlags::EXCL) => return Err(FsError::AlreadyExists(display())),
            _ => {}
        }
    }

    if !decoded.value_only {
        if let Ok(Resolved::Key(key)) =
            resolver::open_key(ctx, path, LookupIntent::Key, KeyAccess::Read)
        {
            key.close()?;
            return Ok(OpenNode::Directory(RegistryDir::new(*ctx, path.clone())));
        }
    }

    if flags.contains(OpenFlags::DIRECTORY) {
        return Err(FsError::NotADirectory(display()));
    }

    let resolved = resolver::open_key(ctx, path, LookupIntent::Value, KeyAccess::Read)?;
    let (parent, name) = match resolved {
        Resolved::Value { parent, name } => (parent, name),
        _ => return Err(FsError::NotFound(display())),
    };
    let buffer = reader::fill_buffer(ctx, parent.handle(), ctx.queried_value_name(&name))?;
    parent.close()?;

    let position = if flags.contains(OpenFlags::APPEND) {
        buffer.data.len() as u64
    } else {
        0
    };
    Ok(OpenNode::File(RegistryFile {
        ctx: *ctx,
        path: path.clone(),
        buffer,
        position,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryFsConfig;
    use registry_host::{KeyPath, MemoryRegistry, RegistryView, RootKey};

    fn fixture() -> MemoryRegistry {
        let reg = MemoryRegistry::new();
        let b = KeyPath::new(RootKey::LocalMachine).join("A").join("B");
        reg.create_key(&b.clone().join("C"));
        reg.set_string(&b, "", "hi");
        reg.set_string(&b, "Text", "hello world");
        reg
    }

    fn open_path<'h>(
        reg: &'h MemoryRegistry,
        config: &'h RegistryFsConfig,
        path: &str,
        flags: OpenFlags,
    ) -> Result<OpenNode<'h>, FsError> {
        let ctx = MountContext::new(reg, RegistryView::Native, config);
        open_node(&ctx, &RegistryPath::parse(path), flags)
    }

    #[test]
    fn test_read_default_value() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        let mut file = open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/B/@", OpenFlags::RDONLY)
            .unwrap()
            .into_file()
            .unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"hi");
        assert_eq!(file.value_type(), ValueType::String);
        file.close().unwrap();
        assert_eq!(reg.open_handle_count(), 0);
    }

    #[test]
    fn test_key_opens_as_directory() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        let node = open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/B/C", OpenFlags::RDONLY).unwrap();
        assert!(node.is_directory());
        assert_eq!(reg.open_handle_count(), 0);
    }

    #[test]
    fn test_seek_and_append() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        let mut file = open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/B/Text", OpenFlags::RDONLY)
            .unwrap()
            .into_file()
            .unwrap();
        file.seek(SeekFrom::Start(6)).unwrap();
        let mut rest = String::new();
        file.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "world");
        assert_eq!(file.seek(SeekFrom::End(-5)).unwrap(), 6);
        assert!(file.seek(SeekFrom::Current(-100)).is_err());

        let path = "HKEY_LOCAL_MACHINE/A/B/Text";
        let mut appended = open_path(&reg, &config, path, OpenFlags::APPEND)
            .unwrap()
            .into_file()
            .unwrap();
        assert_eq!(appended.position(), 11);
        let mut buf = [0u8; 4];
        assert_eq!(appended.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_mount_root_flags() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        assert!(matches!(
            open_path(&reg, &config, "/", OpenFlags::CREAT | OpenFlags::EXCL),
            Err(FsError::AlreadyExists(_))
        ));
        assert!(matches!(
            open_path(&reg, &config, "/", OpenFlags::WRONLY),
            Err(FsError::IsDirectory(_))
        ));
        assert!(open_path(&reg, &config, "/", OpenFlags::RDONLY).unwrap().is_directory());
    }

    #[test]
    fn test_root_key_flags() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        assert!(matches!(
            open_path(&reg, &config, "HKEY_USERS", OpenFlags::CREAT | OpenFlags::EXCL),
            Err(FsError::AlreadyExists(_))
        ));
        assert!(matches!(
            open_path(&reg, &config, "HKEY_NEW", OpenFlags::CREAT),
            Err(FsError::ReadOnly(_))
        ));
        assert!(matches!(
            open_path(&reg, &config, "HKEY_NEW", OpenFlags::RDONLY),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_directory_flag_on_value() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        assert!(matches!(
            open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/B/Text", OpenFlags::DIRECTORY),
            Err(FsError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_invalid_leaf_encoding() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        assert!(matches!(
            open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/%2", OpenFlags::RDONLY),
            Err(FsError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_read_past_end_after_seek() {
        let reg = fixture();
        let config = RegistryFsConfig::default();
        let mut file = open_path(&reg, &config, "HKEY_LOCAL_MACHINE/A/B/@", OpenFlags::RDONLY)
            .unwrap()
            .into_file()
            .unwrap();
        file.seek(SeekFrom::Start(50)).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }
}
