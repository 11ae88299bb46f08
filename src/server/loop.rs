// Server loop module
// Accepts connections until a shutdown signal arrives, then drains

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Run the accept loop until `shutdown` is notified.
///
/// After the signal the listener is dropped so no new connections are
/// admitted, then the loop waits for in-flight connections to finish
/// before returning.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run_accept_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<tokio::sync::Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                break;
            }
        }
    }

    // Close the listener first so no new connections are admitted
    drop(listener);
    logger::log_shutdown_started();

    let mut remaining = active_connections.load(Ordering::SeqCst);
    if remaining > 0 {
        logger::log_shutdown_draining(remaining);
    }
    while remaining > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        remaining = active_connections.load(Ordering::SeqCst);
    }

    logger::log_shutdown_complete();
}
