//! Callback-style completion for operation futures.

use crate::client_response_error::ClientResponseError;
use std::future::Future;
use tokio::task::JoinHandle;

/// Runs `future` on the current Tokio runtime and hands its result to
/// `completion`.
///
/// `completion` is called exactly once, from the spawned task, so never
/// before this function returns. Must be called from within a runtime.
pub fn spawn_with_completion<T, F, C>(future: F, completion: C) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T, ClientResponseError>> + Send + 'static,
    C: FnOnce(Result<T, ClientResponseError>) + Send + 'static,
{
    tokio::spawn(async move {
        let result = future.await;
        completion(result);
    })
}
