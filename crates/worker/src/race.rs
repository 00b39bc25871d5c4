//! Race a spawned task against a timer without cancelling the task.
//!
//! The losing task is never aborted. On timeout the caller gets the task
//! back as a `Pending` and is responsible for settling it, either by awaiting
//! it directly or by handing it to a background drain.

use std::time::Duration;

use shellcache_core::Error;
use tokio::task::{JoinError, JoinHandle};

/// Outcome of `race_with_timeout`.
#[derive(Debug)]
pub enum Raced<T> {
    /// The task settled before the timer fired.
    Finished(Result<T, Error>),
    /// The timer fired first. The task is still running.
    TimedOut(Pending<T>),
}

/// A task that lost the race and has not settled yet.
#[derive(Debug)]
#[must_use = "a pending task must be settled or drained"]
pub struct Pending<T> {
    handle: JoinHandle<Result<T, Error>>,
}

impl<T> Pending<T> {
    /// Wait for the task to finish.
    pub async fn settle(self) -> Result<T, Error> {
        flatten(self.handle.await)
    }
}

/// Wait for `handle` or `timeout`, whichever comes first.
///
/// If both are ready at the same poll the task wins.
pub async fn race_with_timeout<T>(mut handle: JoinHandle<Result<T, Error>>, timeout: Duration) -> Raced<T> {
    tokio::select! {
        biased;
        joined = &mut handle => Raced::Finished(flatten(joined)),
        _ = tokio::time::sleep(timeout) => Raced::TimedOut(Pending { handle }),
    }
}

fn flatten<T>(joined: Result<Result<T, Error>, JoinError>) -> Result<T, Error> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(Error::TaskFailed("task panicked".into())),
        Err(e) => Err(Error::TaskFailed(e.to_string())),
    }
}
