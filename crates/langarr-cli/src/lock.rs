use anyhow::{anyhow, Result};
use nix::fcntl::{Flock, FlockArg};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

/// File-based lock preventing concurrent langarr processes.
///
/// Two processes reconciling the same catalog instances would race on
/// every record; the exclusive flock keeps it to one. The lock is
/// advisory and scoped to the lock file's path, so side-by-side
/// deployments isolate by pointing at different lock files.
pub struct ProcessLock {
    path: PathBuf,
    lock: Option<Flock<std::fs::File>>,
}

impl ProcessLock {
    /// Take the exclusive lock, or fail if another instance holds it.
    pub fn acquire(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(mut lock) => {
                let _ = writeln!(&mut *lock, "{}", std::process::id());
                info!("Acquired process lock: {}", path.display());
                Ok(Self { path, lock: Some(lock) })
            }
            Err((_, errno)) => Err(anyhow!(
                "Another instance is already running (lock file: {}): {}. \
                 Wait for it to complete, or remove the lock file if it is stale",
                path.display(),
                errno
            )),
        }
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            match lock.unlock() {
                Ok(_) => {
                    if let Err(e) = std::fs::remove_file(&self.path) {
                        warn!("Failed to remove lock file: {}", e);
                    } else {
                        info!("Released process lock: {}", self.path.display());
                    }
                }
                Err((_, errno)) => warn!("Failed to release lock cleanly: {}", errno),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_excludes_second_holder() {
        let dir = std::env::temp_dir().join(format!("langarr-lock-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.lock");

        let first = ProcessLock::acquire(path.clone()).unwrap();
        assert!(ProcessLock::acquire(path.clone()).is_err());

        drop(first);
        let second = ProcessLock::acquire(path.clone()).unwrap();
        drop(second);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
