//! RAII guard that kills the downloader child when dropped.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

use crate::error::MdlError;

/// How long a terminated child gets to exit before it is killed.
pub(super) const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Owns the child for the duration of one attempt. A child that was never
/// reaped is killed on drop.
pub(super) struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    pub(super) fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    pub(super) fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub(super) async fn wait(&mut self) -> Result<ExitStatus, MdlError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| MdlError::download(format!("waiting for downloader failed: {e}")))?;
        self.reaped = true;
        Ok(status)
    }

    /// Polite stop: SIGTERM, wait up to [`TERMINATE_GRACE`], then kill.
    pub(super) async fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if send_terminate(&mut self.child) {
            if let Ok(Ok(status)) = tokio::time::timeout(TERMINATE_GRACE, self.child.wait()).await {
                debug!(%status, "downloader exited after terminate");
                self.reaped = true;
                return;
            }
        }
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill downloader");
        }
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.start_kill();
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    let r = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    r == 0
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> bool {
    child.start_kill().is_ok()
}
