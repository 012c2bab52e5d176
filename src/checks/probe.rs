//! Filesystem access probes
//!
//! [`SystemProbe`] asks the kernel through `access(2)`, one permission bit
//! at a time. Read, write and execute are answered independently of each
//! other, for the real user of the process, and honor ACLs and read-only
//! mounts.

use nix::unistd::{access, AccessFlags};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

pub trait FsProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn can_read(&self, path: &Path) -> bool;
    fn can_write(&self, path: &Path) -> bool;
    /// Search permission for directories, execute bit for files
    fn can_execute(&self, path: &Path) -> bool;
    /// `(uid, gid)` of the path's owner
    fn owner(&self, path: &Path) -> Option<(u32, u32)>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl FsProbe for SystemProbe {
    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn can_read(&self, path: &Path) -> bool {
        access(path, AccessFlags::R_OK).is_ok()
    }

    fn can_write(&self, path: &Path) -> bool {
        access(path, AccessFlags::W_OK).is_ok()
    }

    fn can_execute(&self, path: &Path) -> bool {
        access(path, AccessFlags::X_OK).is_ok()
    }

    fn owner(&self, path: &Path) -> Option<(u32, u32)> {
        fs::metadata(path).ok().map(|m| (m.uid(), m.gid()))
    }
}
