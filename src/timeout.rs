//! Deadline handling shared by every external call.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error("call timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Failed(E),
}

/// Runs `fut` with a hard deadline. The future is dropped when the deadline
/// passes.
pub async fn call_with_timeout<T, E, F>(duration: Duration, fut: F) -> Result<T, CallError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CallError::Failed(err)),
        Err(_) => Err(CallError::TimedOut(duration)),
    }
}
