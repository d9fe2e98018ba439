//! Mount point binding
//!
//! Three mount points share one prefix: the bare prefix for the native
//! view, and the prefix followed by `32` or `64` for the 32-bit and 64-bit
//! views. The view is chosen once, when a path is bound.

use registry_host::RegistryView;
use registry_view::RegistryPath;

/// A path bound to one of the mount points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountBinding {
    /// View selected by the mount point
    pub view: RegistryView,
    /// Path below the mount point
    pub relative: RegistryPath,
}

/// Binds an absolute path to a mount point below `prefix`
///
/// Matching is case-insensitive. Returns `None` if the path is not under
/// any of the mount points.
pub fn bind(prefix: &str, path: &str) -> Option<MountBinding> {
    let head = path.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let rest = &path[prefix.len()..];
    let (view, rest) = if let Some(rest) = rest.strip_prefix("32") {
        (RegistryView::Wow32, rest)
    } else if let Some(rest) = rest.strip_prefix("64") {
        (RegistryView::Wow64, rest)
    } else {
        (RegistryView::Native, rest)
    };

    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    Some(MountBinding {
        view,
        relative: RegistryPath::parse(rest),
    })
}
