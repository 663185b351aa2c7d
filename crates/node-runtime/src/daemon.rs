//! # Daemon Control
//!
//! Detaching from the terminal, the pid file used by `--kill`, and the
//! exclusive lock that keeps two nodes off one working directory.

use fs2::FileExt;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("fork failed: {0}")]
    Fork(#[source] nix::Error),

    #[error("setsid failed: {0}")]
    Setsid(#[source] nix::Error),

    #[error("Failed to access pid file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Pid file {0} does not hold a process id")]
    BadPid(PathBuf),

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("Failed to create lock file {path}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Working directory {0} is already in use by another node")]
    AlreadyLocked(PathBuf),
}

/// Detach with the classic double fork.
///
/// Must run before the tokio runtime is built. Only the grandchild returns;
/// both parents exit with status 0.
pub fn daemonize() -> Result<(), DaemonError> {
    use nix::sys::stat::{umask, Mode};
    use nix::unistd::{fork, setsid, ForkResult};

    // SAFETY: no runtime and no other thread exists yet, so the child
    // inherits a consistent single-threaded address space.
    match unsafe { fork() }.map_err(DaemonError::Fork)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    setsid().map_err(DaemonError::Setsid)?;

    // SAFETY: still single-threaded, we are the only thread of the first child.
    match unsafe { fork() }.map_err(DaemonError::Fork)? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }

    umask(Mode::empty());
    Ok(())
}

pub fn write_pid_file(path: &Path) -> Result<(), DaemonError> {
    fs::write(path, format!("{}\n", std::process::id())).map_err(|source| DaemonError::PidFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_pid_file(path: &Path) -> Result<i32, DaemonError> {
    let raw = fs::read_to_string(path).map_err(|source| DaemonError::PidFile {
        path: path.to_path_buf(),
        source,
    })?;
    raw.trim()
        .parse()
        .map_err(|_| DaemonError::BadPid(path.to_path_buf()))
}

pub fn remove_pid_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove pid file");
        }
    }
}

/// Send SIGTERM to the process recorded in `pid_file` and drop the file.
///
/// A process that is already gone is not an error; the stale file is removed
/// all the same.
pub fn kill_daemon(pid_file: &Path) -> Result<i32, DaemonError> {
    let pid = read_pid_file(pid_file)?;
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => debug!(pid, "SIGTERM sent"),
        Err(nix::errno::Errno::ESRCH) => warn!(pid, "No such process, removing stale pid file"),
        Err(source) => return Err(DaemonError::Signal { pid, source }),
    }
    remove_pid_file(pid_file);
    Ok(pid)
}

/// Exclusive lock on a working directory, released on drop.
#[derive(Debug)]
pub struct WorkdirLock {
    file: File,
    path: PathBuf,
}

impl WorkdirLock {
    const LOCK_FILE: &'static str = ".lock";

    pub fn acquire(workingdir: &Path) -> Result<Self, DaemonError> {
        let path = workingdir.join(Self::LOCK_FILE);
        let lock_file_error = |source| DaemonError::LockFile {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(workingdir).map_err(lock_file_error)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_file_error)?;

        if file.try_lock_exclusive().is_err() {
            return Err(DaemonError::AlreadyLocked(workingdir.to_path_buf()));
        }
        file.set_len(0).map_err(lock_file_error)?;
        writeln!(file, "{}", std::process::id()).map_err(lock_file_error)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        #[allow(clippy::incompatible_msrv)]
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}
