use std::thread;

use tracing::debug;

use crate::control::{ProcessControl, Wakeup};
use crate::error::EngineError;

/// How a worker run ended.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed(EngineError),
}

/// Runs one engine invocation on a background thread while the calling
/// thread waits for it to finish or for a termination request.
///
/// The worker is always joined before [`run`](Self::run) returns, so the task
/// may borrow streams and secrets from the caller.
pub struct CancellableWorker<'a> {
    control: &'a ProcessControl,
}

/// Signals completion even when the task unwinds.
struct DoneGuard<'a>(&'a ProcessControl);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.notify_done();
    }
}

impl<'a> CancellableWorker<'a> {
    pub fn new(control: &'a ProcessControl) -> Self {
        Self { control }
    }

    /// Runs `task` to completion.
    ///
    /// If termination is requested first, `cancel` is invoked exactly once and
    /// the task is expected to return [`EngineError::Cancelled`] promptly.
    pub fn run<T, C>(&self, task: T, cancel: C) -> Outcome
    where
        T: FnOnce() -> Result<(), EngineError> + Send,
        C: FnOnce(),
    {
        let control = self.control;
        control.arm();

        thread::scope(|scope| {
            let spawned = thread::Builder::new().name("engine-worker".into()).spawn_scoped(scope, move || {
                let _done = DoneGuard(control);
                task()
            });

            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => return Outcome::Failed(EngineError::Internal(format!("unable to start worker thread: {e}"))),
            };

            let cancelled = match control.wait() {
                Wakeup::Completed => false,
                Wakeup::Terminated => {
                    debug!("termination requested, cancelling engine");
                    cancel();
                    true
                }
            };

            let result = handle.join().unwrap_or_else(|_| Err(EngineError::Internal("worker thread panicked".into())));

            match result {
                Ok(()) => Outcome::Completed,
                Err(EngineError::Cancelled) if cancelled || control.terminate_requested() => Outcome::Cancelled,
                Err(e) => Outcome::Failed(e),
            }
        })
    }
}
