//! HTTP surface over [`MentorService`](crate::service::MentorService).
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/` | | liveness message |
//! | GET | `/mentors` | | `{count, mentors}`, all mentors |
//! | POST | `/build-index` | | `{status: "ok", stdout}` or `{status: "error", stderr}` |
//! | POST | `/recommend` | `QueryProfile` | `{query, results}`; 500 `{detail}` on failure |

pub mod routes;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::service::MentorService;

pub use routes::router;

/// Serves the router on `bind` until Ctrl+C.
pub async fn serve(service: Arc<MentorService>, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, "mentor service listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("mentor service shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
