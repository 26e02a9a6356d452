use tokio::sync::oneshot;
use tracing::debug;

use super::types::RenderError;

/// Run CPU-bound `work` on the blocking pool and await its result message.
///
/// The closure owns everything it touches; the only thing that comes back is
/// the result sent over a oneshot channel. A worker that panics drops the
/// sender, which surfaces as [`RenderError::Aborted`].
pub async fn dispatch_blocking<F, T>(work: F) -> Result<T, RenderError>
where
    F: FnOnce() -> Result<T, RenderError> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        if tx.send(work()).is_err() {
            debug!("Render caller went away before the result was ready; discarding it");
        }
    });

    rx.await.map_err(|_| {
        RenderError::Aborted("render worker exited without sending a result".to_string())
    })?
}
