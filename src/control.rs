//! Process-wide cancellation state.
//!
//! [`ProcessControl`] is shared between the signal listener, the batch
//! controller and the engine worker. A termination request is sticky: once
//! set it stays set for the life of the process.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Default)]
struct ControlState {
    terminate: bool,
    worker_done: bool,
}

/// Why a wait on [`ProcessControl`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Completed,
    Terminated,
}

#[derive(Debug, Default)]
pub struct ProcessControl {
    state: Mutex<ControlState>,
    changed: Condvar,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the running batch to stop. Safe to call any number of times.
    pub fn request_terminate(&self) {
        self.lock().terminate = true;
        self.changed.notify_all();
    }

    pub fn terminate_requested(&self) -> bool {
        self.lock().terminate
    }

    /// Prepares for a new worker run.
    pub(crate) fn arm(&self) {
        self.lock().worker_done = false;
    }

    /// Called by the worker when its task has returned.
    pub(crate) fn notify_done(&self) {
        self.lock().worker_done = true;
        self.changed.notify_all();
    }

    /// Blocks until the worker finishes or termination is requested.
    ///
    /// A worker that finished wins over a termination request that arrived at
    /// the same time, since there is nothing left to cancel.
    pub(crate) fn wait(&self) -> Wakeup {
        let state = self.changed.wait_while(self.lock(), |state| !state.worker_done && !state.terminate).unwrap_or_else(PoisonError::into_inner);

        if state.worker_done { Wakeup::Completed } else { Wakeup::Terminated }
    }

    // The state is two flags that are always valid, so a panic while the lock
    // was held leaves nothing to repair.
    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawns a task that turns SIGINT, SIGTERM, SIGHUP and SIGQUIT into
/// termination requests.
#[cfg(unix)]
pub fn spawn_signal_listener(control: Arc<ProcessControl>) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = interrupt.recv() => "SIGINT",
                Some(()) = terminate.recv() => "SIGTERM",
                Some(()) = hangup.recv() => "SIGHUP",
                Some(()) = quit.recv() => "SIGQUIT",
                else => break,
            };

            warn!(signal = name, "termination requested");
            control.request_terminate();
        }
    }))
}

/// Spawns a task that turns Ctrl-C into termination requests.
#[cfg(not(unix))]
pub fn spawn_signal_listener(control: Arc<ProcessControl>) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            warn!("termination requested");
            control.request_terminate();
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_terminate_is_sticky() {
        let control = ProcessControl::new();
        assert!(!control.terminate_requested());

        control.request_terminate();
        control.request_terminate();
        control.arm();
        assert!(control.terminate_requested());
    }

    #[test]
    fn test_wait_for_worker() {
        let control = Arc::new(ProcessControl::new());
        control.arm();

        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                control.notify_done();
            })
        };

        assert_eq!(control.wait(), Wakeup::Completed);
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_for_termination() {
        let control = Arc::new(ProcessControl::new());
        control.arm();

        let signaller = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                control.request_terminate();
            })
        };

        assert_eq!(control.wait(), Wakeup::Terminated);
        signaller.join().unwrap();
    }

    #[test]
    fn test_completion_wins_over_termination() {
        let control = ProcessControl::new();
        control.arm();
        control.notify_done();
        control.request_terminate();
        assert_eq!(control.wait(), Wakeup::Completed);
    }

    #[test]
    fn test_arm_resets_completion() {
        let control = ProcessControl::new();
        control.notify_done();
        control.arm();
        control.request_terminate();
        assert_eq!(control.wait(), Wakeup::Terminated);
    }

    #[tokio::test]
    async fn test_signal_listener_starts() {
        let control = Arc::new(ProcessControl::new());
        let listener = spawn_signal_listener(Arc::clone(&control)).unwrap();
        listener.abort();
        assert!(!control.terminate_requested());
    }
}
