//! Existence and type lookup
//!
//! Whether a path names a key, a value, or nothing is decided from the
//! parent key's listings rather than by opening the leaf. A caller may see
//! a key in its parent's listing without being allowed to open it, and
//! such a key must still exist as a directory.

use crate::context::MountContext;
use crate::error::FsError;
use crate::resolver::{self, LookupIntent, Resolved};
use log::debug;
use registry_host::{names_match, HostResult, KeyAccess, KeyHandle};
use registry_view::{NameCodec, RegistryPath, RootCatalog};

/// What a path names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    /// Nothing
    Absent,
    /// A key, a root, or the mount root itself
    Directory { is_root: bool },
    /// A value
    File,
}

impl Existence {
    pub fn exists(&self) -> bool {
        !matches!(self, Existence::Absent)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Existence::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Existence::File)
    }
}

/// Returns true if `key` has a sub-key matching `name`
pub fn scan_subkeys(ctx: &MountContext<'_>, key: KeyHandle, name: &str) -> HostResult<bool> {
    let mut index = 0;
    loop {
        match ctx.host.enum_key(key, index, ctx.view) {
            Ok(subkey) if names_match(&subkey, name) => return Ok(true),
            Ok(_) => index += 1,
            Err(err) if err.is_no_more_items() => return Ok(false),
            Err(err) => return Err(err),
        }
    }
}

/// Returns true if `key` has a value listed under `name`
///
/// The default value is listed under the configured token.
pub fn scan_values(ctx: &MountContext<'_>, key: KeyHandle, name: &str) -> HostResult<bool> {
    let mut index = 0;
    loop {
        match ctx.host.enum_value(key, index, ctx.view) {
            Ok(value) if names_match(ctx.listed_value_name(&value), name) => return Ok(true),
            Ok(_) => index += 1,
            Err(err) if err.is_no_more_items() => return Ok(false),
            Err(err) => return Err(err),
        }
    }
}

/// Determines what `path` names
///
/// # Errors
///
/// Only host failures surface as errors; anything that merely fails to
/// resolve is [`Existence::Absent`].
pub fn exists(ctx: &MountContext<'_>, path: &RegistryPath) -> Result<Existence, FsError> {
    debug!("exists({})", path);
    let (Some(leaf), Some(parent)) = (path.leaf(), path.parent()) else {
        return Ok(Existence::Directory { is_root: true });
    };

    if parent.is_mount_root() {
        return Ok(match RootCatalog::lookup(leaf) {
            Some(_) => Existence::Directory { is_root: false },
            None => Existence::Absent,
        });
    }

    let decoded = match NameCodec::decode(leaf) {
        Ok(decoded) => decoded,
        Err(_) => return Ok(Existence::Absent),
    };

    let parent_key = match resolver::open_key(ctx, &parent, LookupIntent::Key, KeyAccess::Read) {
        Ok(Resolved::Key(key)) => key,
        Ok(_) => return Ok(Existence::Absent),
        Err(FsError::Io(err)) => return Err(FsError::Io(err)),
        Err(_) => return Ok(Existence::Absent),
    };

    if !decoded.value_only
        && scan_subkeys(ctx, parent_key.handle(), &decoded.raw).map_err(FsError::Io)?
    {
        return Ok(Existence::Directory { is_root: false });
    }
    if scan_values(ctx, parent_key.handle(), &decoded.raw).map_err(FsError::Io)? {
        return Ok(Existence::File);
    }
    Ok(Existence::Absent)
}
