//! # command: the boundary to external toolchains
//!
//! Every generator reaches `protoc`, `buf` and friends through the
//! [`CommandRunner`] trait, so tests can swap in a mock and assert on the exact
//! argument vector.
//!
//! The only blocking point in a generation run is the child process. Callers
//! bound it with a [`CancelSignal`], which fires either when a [`CancelHandle`]
//! is triggered or when a deadline passes. On cancellation the child is killed
//! and [`CommandError::Cancelled`] is returned.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error};

use mockall::automock;

use crate::error::{CancelReason, CommandError};

/// Sending half of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cloneable cancellation signal passed into every command invocation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::none()
    }
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn none() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// A handle/signal pair for explicit cancellation.
    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            CancelSignal {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    /// Adds a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Reason the signal has already fired, if it has.
    pub fn check(&self) -> Option<CancelReason> {
        if self.rx.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(CancelReason::Requested);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the signal fires. Pending forever for [`CancelSignal::none`].
    pub async fn cancelled(&self) -> CancelReason {
        let requested = async {
            match self.rx.clone() {
                Some(mut rx) => {
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        // Handle dropped without cancelling.
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = requested => CancelReason::Requested,
            _ = deadline => CancelReason::DeadlineExceeded,
        }
    }
}

/// Runs an external program.
///
/// Implementations must be safe for concurrent use: a single runner is shared
/// by every generator in a registry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` in `cwd`, returning captured stdout.
    ///
    /// A non-zero exit yields [`CommandError::Failed`] carrying stderr verbatim.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        cancel: &CancelSignal,
    ) -> Result<Vec<u8>, CommandError>;
}

/// Spawns real child processes via tokio.
#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        cancel: &CancelSignal,
    ) -> Result<Vec<u8>, CommandError> {
        if let Some(reason) = cancel.check() {
            return Err(CommandError::Cancelled {
                program: program.to_string(),
                reason,
            });
        }

        debug!(program, ?args, cwd = %cwd.display(), "Spawning command");
        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(program, error = ?source, "Failed to launch process");
                CommandError::Spawn {
                    program: program.to_string(),
                    source,
                }
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|source| CommandError::Io {
                program: program.to_string(),
                source,
            })?,
            reason = cancel.cancelled() => {
                error!(program, %reason, "Command cancelled, child killed");
                return Err(CommandError::Cancelled {
                    program: program.to_string(),
                    reason,
                });
            }
        };

        if output.status.success() {
            debug!(program, status = ?output.status, bytes = output.stdout.len(), "Command succeeded");
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!(program, status = ?output.status, %stderr, "Command exited with non-zero status");
            Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.code(),
                stderr,
            })
        }
    }
}
