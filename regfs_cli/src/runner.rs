//! Loading a snapshot and running commands against it

use crate::commands::{BrowseCommand, CommandError};
use log::info;
use registry_host::{MemoryRegistry, RegistrySnapshot, SnapshotError};
use services_registry_fs::{ConfigError, EntryKind, FileStat, FsError, RegistryFs, RegistryFsConfig};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors surfaced by the browser
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Fs(#[from] FsError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

impl CliError {
    /// Process exit status for this error
    ///
    /// Filesystem errors exit with their POSIX code so scripts can tell
    /// `ENOENT` from `EISDIR`; everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Fs(err) => err.errno(),
            _ => 1,
        }
    }
}

/// Builds a filesystem from a snapshot file and an optional config file
pub fn load_filesystem(
    snapshot_path: &Path,
    config_path: Option<&Path>,
) -> Result<RegistryFs<MemoryRegistry>, CliError> {
    let config = match config_path {
        Some(path) => RegistryFsConfig::from_json(&fs::read_to_string(path)?)?,
        None => RegistryFsConfig::default(),
    };

    let snapshot = RegistrySnapshot::from_json(&fs::read_to_string(snapshot_path)?)?;
    info!(
        "loaded {} root(s) from {}",
        snapshot.roots.len(),
        snapshot_path.display()
    );

    let registry = MemoryRegistry::from_snapshot(&snapshot);
    Ok(RegistryFs::with_config(registry, config))
}

/// Runs `command`, writing its output to `out`
pub fn run_command<W: Write>(
    fs: &RegistryFs<MemoryRegistry>,
    command: &BrowseCommand,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        BrowseCommand::Ls { path } => list(fs, path, out),
        BrowseCommand::Cat { path } => {
            out.write_all(&fs.read(path)?)?;
            Ok(())
        }
        BrowseCommand::Stat { path } => {
            let st = fs.stat(path)?;
            write_stat(out, path, &st)
        }
    }
}

fn list<W: Write>(
    fs: &RegistryFs<MemoryRegistry>,
    path: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let mut dir = fs.opendir(path)?;
    for entry in dir.by_ref() {
        let entry = entry?;
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        match entry.kind {
            EntryKind::Directory => writeln!(out, "{}/", entry.name)?,
            EntryKind::File => writeln!(out, "{}", entry.name)?,
        }
    }
    dir.closedir()?;
    Ok(())
}

fn write_stat<W: Write>(out: &mut W, path: &str, st: &FileStat) -> Result<(), CliError> {
    let kind = if st.is_dir() { "directory" } else { "regular file" };
    writeln!(out, "  File: {}", path)?;
    writeln!(out, "  Type: {}", kind)?;
    writeln!(out, "  Mode: {:o}", st.mode)?;
    writeln!(out, " Links: {}", st.nlink)?;
    writeln!(out, "   Uid: {}", st.uid)?;
    writeln!(out, "   Gid: {}", st.gid)?;
    writeln!(out, "  Size: {}", st.size)?;
    writeln!(out, "Modify: {}", epoch_seconds(st.mtime))?;
    Ok(())
}

fn epoch_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_host::{KeyPath, RootKey};

    fn fixture() -> RegistryFs<MemoryRegistry> {
        let reg = MemoryRegistry::new();
        let a = KeyPath::new(RootKey::LocalMachine).join("A");
        reg.create_key(&a.clone().join("B"));
        reg.set_string(&a, "", "hi");
        reg.set_dword(&a, "Count", 7);
        RegistryFs::new(reg)
    }

    fn output(fs: &RegistryFs<MemoryRegistry>, command: BrowseCommand) -> Result<String, CliError> {
        let mut out = Vec::new();
        run_command(fs, &command, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_ls_marks_directories() {
        let fs = fixture();
        let text = output(
            &fs,
            BrowseCommand::Ls {
                path: "/proc/registry/HKEY_LOCAL_MACHINE/A".to_string(),
            },
        )
        .unwrap();
        assert_eq!(text, "B/\n@\nCount\n");
        assert_eq!(fs.host().open_handle_count(), 0);
    }

    #[test]
    fn test_cat_writes_raw_bytes() {
        let fs = fixture();
        let text = output(
            &fs,
            BrowseCommand::Cat {
                path: "/proc/registry/HKEY_LOCAL_MACHINE/A/Count".to_string(),
            },
        )
        .unwrap();
        assert_eq!(text.as_bytes(), &[7, 0, 0, 0]);
    }

    #[test]
    fn test_stat_reports_type() {
        let fs = fixture();
        let text = output(
            &fs,
            BrowseCommand::Stat {
                path: "/proc/registry/HKEY_LOCAL_MACHINE/A/@".to_string(),
            },
        )
        .unwrap();
        assert!(text.contains("Type: regular file"));
        assert!(text.contains("Mode: 100444"));
        assert!(text.contains("Size: 2"));
    }

    #[test]
    fn test_fs_errors_map_to_exit_codes() {
        let fs = fixture();
        let err = output(
            &fs,
            BrowseCommand::Cat {
                path: "/proc/registry/HKEY_LOCAL_MACHINE/A".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), FsError::IsDirectory(String::new()).errno());

        let err = CliError::Command(CommandError::Empty);
        assert_eq!(err.exit_code(), 1);
    }
}
