//! The filesystem facade
//!
//! [`RegistryFs`] takes absolute paths, binds them to a mount point, and
//! routes each call to the operation modules with a [`MountContext`] for
//! the selected view.

use crate::config::RegistryFsConfig;
use crate::context::MountContext;
use crate::dir::RegistryDir;
use crate::error::FsError;
use crate::file::{self, OpenFlags, OpenNode};
use crate::mount;
use crate::oracle::{self, Existence};
use crate::stat::{self, FileStat};
use registry_host::RegistryHost;
use registry_view::RegistryPath;

/// A registry exposed as a read-only filesystem
pub struct RegistryFs<H: RegistryHost> {
    host: H,
    config: RegistryFsConfig,
}

impl<H: RegistryHost> RegistryFs<H> {
    /// Creates a filesystem with the default configuration
    pub fn new(host: H) -> Self {
        Self::with_config(host, RegistryFsConfig::default())
    }

    /// Creates a filesystem with `config`
    pub fn with_config(host: H, config: RegistryFsConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &RegistryFsConfig {
        &self.config
    }

    fn bind(&self, path: &str) -> Result<(MountContext<'_>, RegistryPath), FsError> {
        let binding = mount::bind(&self.config.mount_prefix, path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let ctx = MountContext::new(&self.host, binding.view, &self.config);
        Ok((ctx, binding.relative))
    }

    /// Determines whether `path` names a key, a value, or nothing
    pub fn exists(&self, path: &str) -> Result<Existence, FsError> {
        let (ctx, relative) = self.bind(path)?;
        oracle::exists(&ctx, &relative)
    }

    /// Returns the status of `path`
    pub fn stat(&self, path: &str) -> Result<FileStat, FsError> {
        let (ctx, relative) = self.bind(path)?;
        stat::stat(&ctx, &relative)
    }

    /// Opens `path`
    ///
    /// # Errors
    ///
    /// Any write access mode below the mount root fails with
    /// `FsError::ReadOnly`; `CREAT | EXCL` on an existing path fails with
    /// `FsError::AlreadyExists`.
    pub fn open(&self, path: &str, flags: OpenFlags) -> Result<OpenNode<'_>, FsError> {
        let (ctx, relative) = self.bind(path)?;
        file::open_node(&ctx, &relative, flags)
    }

    /// Opens `path` as a directory
    pub fn opendir(&self, path: &str) -> Result<RegistryDir<'_>, FsError> {
        let (ctx, relative) = self.bind(path)?;
        match oracle::exists(&ctx, &relative)? {
            Existence::Absent => Err(FsError::NotFound(path.to_string())),
            Existence::File => Err(FsError::NotADirectory(path.to_string())),
            Existence::Directory { .. } => Ok(RegistryDir::new(ctx, relative)),
        }
    }

    /// Reads a whole value
    pub fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let file = self.open(path, OpenFlags::RDONLY)?.into_file()?;
        let contents = file.contents().to_vec();
        file.close()?;
        Ok(contents)
    }
}
