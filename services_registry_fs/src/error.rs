//! Filesystem errors and their POSIX codes

use registry_host::HostError;
use registry_view::CodecError;
use thiserror::Error;

/// Errors returned by filesystem operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    /// A path component does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file operation was attempted on a key
    #[error("Is a directory: {0}")]
    IsDirectory(String),

    /// A directory operation was attempted on a value
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Name too long: {0}")]
    NameTooLong(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Access was refused even with backup intent
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Any request that would modify the store
    #[error("Read-only filesystem: {0}")]
    ReadOnly(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Host failure other than not-found or end of enumeration
    #[error("I/O error: {0}")]
    Io(HostError),
}

impl FsError {
    /// Maps a host error, naming `context` where the kind carries a path
    pub fn from_host(err: HostError, context: &str) -> Self {
        match err {
            HostError::NotFound => FsError::NotFound(context.to_string()),
            HostError::AccessDenied => FsError::AccessDenied(context.to_string()),
            other => FsError::Io(other),
        }
    }

    /// Returns the POSIX errno for this error
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::IsDirectory(_) => libc::EISDIR,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::NameTooLong(_) => libc::ENAMETOOLONG,
            FsError::InvalidEncoding(_) => libc::EINVAL,
            FsError::AccessDenied(_) => libc::EACCES,
            FsError::ReadOnly(_) => libc::EROFS,
            FsError::AlreadyExists(_) => libc::EEXIST,
            FsError::Io(_) => libc::EIO,
        }
    }
}

impl From<CodecError> for FsError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::NameTooLong(name) => FsError::NameTooLong(name),
            CodecError::InvalidEncoding(name) => FsError::InvalidEncoding(name),
        }
    }
}
