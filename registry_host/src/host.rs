//! The host store trait

use crate::error::HostResult;
use crate::types::{KeyAccess, KeyHandle, KeyInfo, KeySecurity, RegistryView, ValueInfo};

/// Host registry access
///
/// Implementers provide read-only access to a hierarchical key/value store.
/// All calls are synchronous and may block. Implementations keep their
/// handle tables behind interior mutability so a single store can be shared
/// by many open directories and files.
pub trait RegistryHost {
    /// Opens the sub-key `name` of `parent`
    ///
    /// # Errors
    /// Returns `HostError::NotFound` if no such sub-key exists
    /// Returns `HostError::AccessDenied` if the key's ACL refuses `access`
    fn open_key(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle>;

    /// Opens the sub-key `name` of `parent` with backup/restore intent
    ///
    /// This privileged mode can traverse keys whose ACL refuses an ordinary
    /// open. It never creates keys.
    fn open_key_backup(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle>;

    /// Returns the name of the sub-key at `index`
    ///
    /// `view` selects the tree behind a predefined root handle, exactly as
    /// it does for [`RegistryHost::open_key`]; callers pass the same view
    /// to every call.
    ///
    /// Returns `HostError::NoMoreItems` once `index` is past the end.
    fn enum_key(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String>;

    /// Returns the name of the value at `index` (empty for the default value)
    ///
    /// Returns `HostError::NoMoreItems` once `index` is past the end.
    fn enum_value(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String>;

    /// Queries the value `name` of `key`
    ///
    /// With `buffer = None` only the type and size are reported. With a
    /// buffer, the data is copied in and the returned size is the number of
    /// bytes written; a buffer that is too small yields
    /// `HostError::MoreData`.
    fn query_value(
        &self,
        key: KeyHandle,
        name: &str,
        buffer: Option<&mut [u8]>,
        view: RegistryView,
    ) -> HostResult<ValueInfo>;

    /// Returns metadata for `key`
    fn query_info(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeyInfo>;

    /// Returns owner and permission metadata for `key`
    fn query_security(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeySecurity>;

    /// Releases a handle returned by one of the open calls
    ///
    /// Closing a predefined root handle is a no-op.
    fn close_key(&self, key: KeyHandle) -> HostResult<()>;
}

impl<H: RegistryHost + ?Sized> RegistryHost for &H {
    fn open_key(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        (**self).open_key(parent, name, access, view)
    }

    fn open_key_backup(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        (**self).open_key_backup(parent, name, access, view)
    }

    fn enum_key(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        (**self).enum_key(key, index, view)
    }

    fn enum_value(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        (**self).enum_value(key, index, view)
    }

    fn query_value(
        &self,
        key: KeyHandle,
        name: &str,
        buffer: Option<&mut [u8]>,
        view: RegistryView,
    ) -> HostResult<ValueInfo> {
        (**self).query_value(key, name, buffer, view)
    }

    fn query_info(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeyInfo> {
        (**self).query_info(key, view)
    }

    fn query_security(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeySecurity> {
        (**self).query_security(key, view)
    }

    fn close_key(&self, key: KeyHandle) -> HostResult<()> {
        (**self).close_key(key)
    }
}
