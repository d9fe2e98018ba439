//! File status
//!
//! Keys report as read-only directories and values as read-only regular
//! files. Owner, timestamps, link count and size come from key metadata
//! when the key can be opened for query.

use crate::context::MountContext;
use crate::error::FsError;
use crate::oracle::{self, Existence};
use crate::resolver::{self, LookupIntent, OwnedKey, Resolved};
use log::debug;
use registry_host::KeyAccess;
use registry_view::{RegistryPath, RootCatalog};
use std::time::SystemTime;

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

const WRITE_BITS: u32 = 0o222;
const EXEC_BITS: u32 = 0o111;
const PERMISSION_BITS: u32 = 0o777;

/// POSIX status of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub birthtime: SystemTime,
}

impl FileStat {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    /// Permission bits only
    pub fn permissions(&self) -> u32 {
        self.mode & PERMISSION_BITS
    }

    fn new(mode: u32, ctx: &MountContext<'_>) -> Self {
        Self {
            mode,
            nlink: 1,
            uid: ctx.config.default_uid,
            gid: ctx.config.default_gid,
            size: 0,
            atime: SystemTime::UNIX_EPOCH,
            mtime: SystemTime::UNIX_EPOCH,
            ctime: SystemTime::UNIX_EPOCH,
            birthtime: SystemTime::UNIX_EPOCH,
        }
    }
}

/// Returns the status of `path`
pub fn stat(ctx: &MountContext<'_>, path: &RegistryPath) -> Result<FileStat, FsError> {
    debug!("stat({})", path);
    let mut st = match oracle::exists(ctx, path)? {
        Existence::Absent => return Err(FsError::NotFound(path.to_string())),
        Existence::Directory { is_root: true } => {
            let mut st = FileStat::new(S_IFDIR | 0o555, ctx);
            st.nlink = RootCatalog::len() as u64;
            return Ok(st);
        }
        Existence::Directory { is_root: false } => FileStat::new(S_IFDIR | 0o555, ctx),
        Existence::File => FileStat::new(S_IFREG | 0o444, ctx),
    };

    let intent = if st.is_dir() {
        LookupIntent::Key
    } else {
        LookupIntent::Value
    };
    match resolver::open_key(ctx, path, intent, KeyAccess::QueryValue) {
        Ok(Resolved::Sentinel) => {}
        Ok(Resolved::Key(key)) => fill_metadata(ctx, &mut st, &key, None),
        Ok(Resolved::Value { parent, name }) => fill_metadata(ctx, &mut st, &parent, Some(&name)),
        Err(err) => {
            debug!("stat({}): metadata unavailable: {}", path, err);
            st.uid = ctx.config.unknown_uid;
            st.gid = ctx.config.unknown_gid;
            st.mode &= !PERMISSION_BITS;
        }
    }
    Ok(st)
}

fn fill_metadata(
    ctx: &MountContext<'_>,
    st: &mut FileStat,
    key: &OwnedKey<'_>,
    value: Option<&str>,
) {
    let Ok(info) = ctx.host.query_info(key.handle(), ctx.view) else {
        return;
    };
    st.mtime = info.last_write;
    st.ctime = info.last_write;
    st.birthtime = info.last_write;
    st.atime = info.last_write;

    match value {
        None => st.nlink = u64::from(info.subkey_count) + 2,
        Some(name) => {
            let name = ctx.queried_value_name(name);
            if let Ok(value) = ctx.host.query_value(key.handle(), name, None, ctx.view) {
                st.size = value.size as u64;
            }
        }
    }

    if let Ok(security) = ctx.host.query_security(key.handle(), ctx.view) {
        st.uid = security.uid;
        st.gid = security.gid;
        st.mode = (st.mode & S_IFMT) | (security.mode & PERMISSION_BITS & !WRITE_BITS);
        if value.is_some() {
            st.mode &= !EXEC_BITS;
        }
    }
}
