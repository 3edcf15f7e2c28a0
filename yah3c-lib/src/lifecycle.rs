use crate::error::H3cError;
use crate::session::Lifecycle;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, dup2, fork, setsid};
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

pub const DEFAULT_DAEMON_LOG: &str = "/tmp/yah3c.log";

/// Runs the DHCP client as a child process and detaches with a double fork.
#[derive(Debug, Clone)]
pub struct ProcessLifecycle {
    log_path: PathBuf,
}

impl ProcessLifecycle {
    /// `log_path` receives stdout and stderr once daemonized.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }
}

impl Default for ProcessLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_DAEMON_LOG)
    }
}

impl Lifecycle for ProcessLifecycle {
    fn run_dhcp_client(&mut self, command: &str, interface: &str) {
        match Command::new(command).arg(interface).status() {
            Ok(status) if status.success() => info!(command, interface, "DHCP client finished"),
            Ok(status) => warn!(command, interface, %status, "DHCP client exited unsuccessfully"),
            Err(e) => warn!(command, interface, "Failed to run DHCP client: {}", e),
        }
    }

    fn daemonize(&mut self) -> Result<(), H3cError> {
        info!(log = %self.log_path.display(), "Detaching from terminal");

        // SAFETY: the session is single-threaded; the child only continues
        // the same blocking loop.
        if let ForkResult::Parent { .. } = unsafe { fork() }? {
            std::process::exit(0);
        }
        chdir("/")?;
        umask(Mode::empty());
        setsid()?;
        if let ForkResult::Parent { .. } = unsafe { fork() }? {
            std::process::exit(0);
        }

        let stdin = File::open("/dev/null").map_err(|e| H3cError::Daemonize(format!("/dev/null: {}", e)))?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| H3cError::Daemonize(format!("{}: {}", self.log_path.display(), e)))?;
        dup2(stdin.as_raw_fd(), STDIN_FILENO)?;
        dup2(log.as_raw_fd(), STDOUT_FILENO)?;
        dup2(log.as_raw_fd(), STDERR_FILENO)?;
        Ok(())
    }
}
