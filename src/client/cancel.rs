//! Caller-side cancellation for session polling.
//!
//! The engine retries polls until the service reports a terminal state and
//! has no timeout of its own, so every call takes a [`CancelSignal`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Resolves once the caller cancels or the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Cancels every [`CancelSignal`] created from the same pair.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl CancelSignal {
    /// A signal that never fires.
    ///
    /// Polling with it only ends when the service reports a terminal state.
    pub fn never() -> Self {
        Self::default()
    }

    /// Fires `timeout` from now.
    pub fn deadline(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn at(deadline: Instant) -> Self {
        Self {
            rx: None,
            deadline: Some(deadline),
        }
    }

    /// A signal fired by the returned handle.
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    /// Also fire `timeout` from now, whichever comes first.
    pub fn with_deadline(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn is_cancelled(&self) -> bool {
        let signalled = self.rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        signalled || expired
    }

    /// Wait until the signal fires.
    ///
    /// A dropped [`CancelHandle`] never fires; the deadline still does.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let deadline = self.deadline;

        let by_handle = async {
            match rx.as_mut() {
                Some(rx) => {
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let by_deadline = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = by_handle => {}
            _ = by_deadline => {}
        }
    }
}
