//! HTTP server assembly: router, shared state and shutdown plumbing.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

/// Resolve when the process receives SIGINT or SIGTERM.
///
/// Used both as the axum graceful-shutdown trigger and as the projector's
/// stop signal, so the two binaries terminate the same way.
pub async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(error) => {
                tracing::error!(%error, "cannot install SIGTERM handler");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    tracing::info!("shutdown signal received");
}
