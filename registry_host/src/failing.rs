//! # Failing Host
//!
//! A [`RegistryHost`] wrapper that injects errors into chosen operations.
//! Useful for testing the error paths of the filesystem view without a
//! misbehaving store.

use crate::error::{HostError, HostResult};
use crate::host::RegistryHost;
use crate::types::{KeyAccess, KeyHandle, KeyInfo, KeySecurity, RegistryView, ValueInfo};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Host operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    OpenKey,
    OpenKeyBackup,
    EnumKey,
    EnumValue,
    QueryValue,
    QueryInfo,
    QuerySecurity,
    CloseKey,
}

/// Policy for when failures should occur
#[derive(Debug, Clone)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Fail every call to `operation`
    Always {
        operation: HostOperation,
        error: HostError,
    },
    /// Let `count` calls to `operation` through, then fail the rest
    AfterCalls {
        operation: HostOperation,
        count: usize,
        error: HostError,
    },
    /// Fail calls to `operation` whose name argument matches `name`
    OnName {
        operation: HostOperation,
        name: String,
        error: HostError,
    },
}

/// Wrapper around a host that can simulate failures
pub struct FailingHost<H: RegistryHost> {
    inner: H,
    policy: Mutex<FailurePolicy>,
    calls: Mutex<HashMap<HostOperation, usize>>,
}

impl<H: RegistryHost> FailingHost<H> {
    /// Create a new failing host with the given policy
    pub fn new(inner: H, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy: Mutex::new(policy),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Get the underlying host (for inspection)
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Number of calls made to `operation`, failed ones included
    pub fn call_count(&self, operation: HostOperation) -> usize {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&operation).copied().unwrap_or(0)
    }

    /// Reset the failure policy and the call counters
    pub fn set_policy(&self, policy: FailurePolicy) {
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner) = policy;
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Records a call and returns the injected error, if any
    fn check(&self, operation: HostOperation, name: Option<&str>) -> HostResult<()> {
        let previous = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            let count = calls.entry(operation).or_insert(0);
            *count += 1;
            *count - 1
        };

        let policy = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
        let injected = match &*policy {
            FailurePolicy::Never => None,
            FailurePolicy::Always {
                operation: target,
                error,
            } => (*target == operation).then_some(*error),
            FailurePolicy::AfterCalls {
                operation: target,
                count,
                error,
            } => (*target == operation && previous >= *count).then_some(*error),
            FailurePolicy::OnName {
                operation: target,
                name: target_name,
                error,
            } => (*target == operation && name == Some(target_name.as_str())).then_some(*error),
        };

        match injected {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<H: RegistryHost> RegistryHost for FailingHost<H> {
    fn open_key(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        self.check(HostOperation::OpenKey, Some(name))?;
        self.inner.open_key(parent, name, access, view)
    }

    fn open_key_backup(
        &self,
        parent: KeyHandle,
        name: &str,
        access: KeyAccess,
        view: RegistryView,
    ) -> HostResult<KeyHandle> {
        self.check(HostOperation::OpenKeyBackup, Some(name))?;
        self.inner.open_key_backup(parent, name, access, view)
    }

    fn enum_key(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        self.check(HostOperation::EnumKey, None)?;
        self.inner.enum_key(key, index, view)
    }

    fn enum_value(&self, key: KeyHandle, index: u32, view: RegistryView) -> HostResult<String> {
        self.check(HostOperation::EnumValue, None)?;
        self.inner.enum_value(key, index, view)
    }

    fn query_value(
        &self,
        key: KeyHandle,
        name: &str,
        buffer: Option<&mut [u8]>,
        view: RegistryView,
    ) -> HostResult<ValueInfo> {
        self.check(HostOperation::QueryValue, Some(name))?;
        self.inner.query_value(key, name, buffer, view)
    }

    fn query_info(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeyInfo> {
        self.check(HostOperation::QueryInfo, None)?;
        self.inner.query_info(key, view)
    }

    fn query_security(&self, key: KeyHandle, view: RegistryView) -> HostResult<KeySecurity> {
        self.check(HostOperation::QuerySecurity, None)?;
        self.inner.query_security(key, view)
    }

    fn close_key(&self, key: KeyHandle) -> HostResult<()> {
        // The handle is always released so injected close failures do not leak
        let injected = self.check(HostOperation::CloseKey, None);
        self.inner.close_key(key)?;
        injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{KeyPath, MemoryRegistry};
    use crate::types::RootKey;

    const HKLM: KeyHandle = KeyHandle::LOCAL_MACHINE;
    const NATIVE: RegistryView = RegistryView::Native;

    fn populated() -> MemoryRegistry {
        let reg = MemoryRegistry::new();
        reg.create_key(&KeyPath::new(RootKey::LocalMachine).join("A"));
        reg.create_key(&KeyPath::new(RootKey::LocalMachine).join("B"));
        reg
    }

    #[test]
    fn test_failing_host_never() {
        let host = FailingHost::new(populated(), FailurePolicy::Never);
        assert_eq!(host.enum_key(HKLM, 0, NATIVE).unwrap(), "A");
        assert_eq!(host.call_count(HostOperation::EnumKey), 1);
    }

    #[test]
    fn test_failing_host_always() {
        let host = FailingHost::new(
            populated(),
            FailurePolicy::Always {
                operation: HostOperation::EnumValue,
                error: HostError::Other(1450),
            },
        );
        assert_eq!(
            host.enum_value(HKLM, 0, NATIVE),
            Err(HostError::Other(1450))
        );
        assert!(host.enum_key(HKLM, 0, NATIVE).is_ok());
    }

    #[test]
    fn test_failing_host_after_calls() {
        let host = FailingHost::new(
            populated(),
            FailurePolicy::AfterCalls {
                operation: HostOperation::EnumKey,
                count: 1,
                error: HostError::Other(21),
            },
        );
        assert!(host.enum_key(HKLM, 0, NATIVE).is_ok());
        assert_eq!(
            host.enum_key(HKLM, 1, NATIVE),
            Err(HostError::Other(21))
        );
        assert_eq!(host.call_count(HostOperation::EnumKey), 2);
    }

    #[test]
    fn test_failing_host_on_name() {
        let host = FailingHost::new(
            populated(),
            FailurePolicy::OnName {
                operation: HostOperation::OpenKey,
                name: "B".to_string(),
                error: HostError::AccessDenied,
            },
        );
        let view = RegistryView::Native;
        let a = host
            .open_key(KeyHandle::LOCAL_MACHINE, "A", KeyAccess::Read, view)
            .unwrap();
        host.close_key(a).unwrap();
        assert_eq!(
            host.open_key(KeyHandle::LOCAL_MACHINE, "B", KeyAccess::Read, view),
            Err(HostError::AccessDenied)
        );
    }

    #[test]
    fn test_failed_close_still_releases() {
        let host = FailingHost::new(
            populated(),
            FailurePolicy::Always {
                operation: HostOperation::CloseKey,
                error: HostError::Other(1),
            },
        );
        let a = host
            .open_key(HKLM, "A", KeyAccess::Read, NATIVE)
            .unwrap();
        assert_eq!(host.inner().open_handle_count(), 1);
        assert_eq!(host.close_key(a), Err(HostError::Other(1)));
        assert_eq!(host.inner().open_handle_count(), 0);
    }

    #[test]
    fn test_set_policy_resets_counts() {
        let host = FailingHost::new(populated(), FailurePolicy::Never);
        let _ = host.enum_key(HKLM, 0, NATIVE);
        host.set_policy(FailurePolicy::Always {
            operation: HostOperation::EnumKey,
            error: HostError::Other(2),
        });
        assert_eq!(host.call_count(HostOperation::EnumKey), 0);
        assert!(host.enum_key(HKLM, 0, NATIVE).is_err());
    }
}
