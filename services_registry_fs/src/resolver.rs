//! Key resolution
//!
//! Walks a mount-relative path from a root key down through nested keys,
//! opening one handle per component and closing the previous one. Every
//! handle opened here is owned by an [`OwnedKey`], so any early return
//! closes it.

use crate::context::MountContext;
use crate::error::FsError;
use log::{debug, trace, warn};
use registry_host::{HostError, HostResult, KeyAccess, KeyHandle, RegistryHost};
use registry_view::{NameCodec, RegistryPath, RootCatalog};

/// What the last path component is expected to name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupIntent {
    /// A key; the leaf itself is opened
    Key,
    /// A value; resolution stops at its parent key
    Value,
}

/// A key handle closed on drop
///
/// Predefined root handles pass through untouched.
pub struct OwnedKey<'h> {
    host: &'h dyn RegistryHost,
    handle: KeyHandle,
    released: bool,
}

impl<'h> OwnedKey<'h> {
    pub fn new(host: &'h dyn RegistryHost, handle: KeyHandle) -> Self {
        Self {
            host,
            handle,
            released: false,
        }
    }

    pub fn handle(&self) -> KeyHandle {
        self.handle
    }

    /// Closes the handle, reporting a failed release
    pub fn close(mut self) -> Result<(), FsError> {
        self.released = true;
        if self.handle.is_predefined() {
            return Ok(());
        }
        self.host.close_key(self.handle).map_err(FsError::Io)
    }
}

impl Drop for OwnedKey<'_> {
    fn drop(&mut self) {
        if self.released || self.handle.is_predefined() {
            return;
        }
        if let Err(err) = self.host.close_key(self.handle) {
            warn!("failed to close {}: {}", self.handle, err);
        }
    }
}

/// Outcome of resolving a path
pub enum Resolved<'h> {
    /// A dot entry of the root listing; there is no key behind it
    Sentinel,
    /// The key named by the path
    Key(OwnedKey<'h>),
    /// The parent key of a value, and the value's decoded name
    Value { parent: OwnedKey<'h>, name: String },
}

/// Opens a sub-key, retrying once with backup intent if access is denied
pub fn open_child(
    ctx: &MountContext<'_>,
    parent: KeyHandle,
    name: &str,
    access: KeyAccess,
) -> HostResult<KeyHandle> {
    match ctx.host.open_key(parent, name, access, ctx.view) {
        Err(HostError::AccessDenied) => {
            debug!("access denied opening {:?}, retrying with backup intent", name);
            ctx.host.open_key_backup(parent, name, access, ctx.view)
        }
        result => result,
    }
}

/// Resolves `path` to a key handle
///
/// `access` applies to the last key opened: the leaf for
/// [`LookupIntent::Key`], the leaf's parent for [`LookupIntent::Value`].
/// Intermediate keys are opened with read rights.
pub fn open_key<'h>(
    ctx: &MountContext<'h>,
    path: &RegistryPath,
    intent: LookupIntent,
    access: KeyAccess,
) -> Result<Resolved<'h>, FsError> {
    trace!("open_key({}, {:?}, {:?})", path, intent, access);
    let not_found = || FsError::NotFound(path.to_string());

    let (first, rest) = path.components().split_first().ok_or_else(not_found)?;
    let entry = RootCatalog::lookup(first).ok_or_else(not_found)?;
    let mut current = match entry.handle() {
        Some(handle) => OwnedKey::new(ctx.host, handle),
        None if rest.is_empty() && intent == LookupIntent::Key => return Ok(Resolved::Sentinel),
        None => return Err(not_found()),
    };
    if rest.is_empty() && intent == LookupIntent::Value {
        return Err(not_found());
    }

    let last_opened = rest.len().checked_sub(match intent {
        LookupIntent::Key => 1,
        LookupIntent::Value => 2,
    });

    for (index, component) in rest.iter().enumerate() {
        let decoded = NameCodec::decode(component)?;
        if index + 1 == rest.len() && intent == LookupIntent::Value {
            return Ok(Resolved::Value {
                parent: current,
                name: decoded.raw,
            });
        }
        if decoded.value_only {
            return Err(not_found());
        }

        let rights = if Some(index) == last_opened {
            access
        } else {
            KeyAccess::Read
        };
        let handle = open_child(ctx, current.handle(), &decoded.raw, rights)
            .map_err(|err| FsError::from_host(err, &path.to_string()))?;
        current = OwnedKey::new(ctx.host, handle);
    }

    Ok(Resolved::Key(current))
}

/// Returns true if `name` is a sub-key of `parent`
///
/// A key the caller may not open still exists, so access-denied counts as
/// present.
pub fn key_exists(ctx: &MountContext<'_>, parent: KeyHandle, name: &str) -> bool {
    match ctx.host.open_key(parent, name, KeyAccess::Read, ctx.view) {
        Ok(handle) => {
            drop(OwnedKey::new(ctx.host, handle));
            true
        }
        Err(HostError::AccessDenied) => true,
        Err(_) => false,
    }
}
