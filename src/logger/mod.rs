//! Logging for the shelf server.
//!
//! Covers the startup banner, per-request access lines (see [`format`]
//! for the supported formats), error and warning lines, and shutdown
//! progress. Output goes to files or the console through [`writer`].

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Open the configured log sinks. Called once at startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

// Config loading can log before init runs; the helpers below fall back
// to the console in that window.

fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

fn write_access(message: &str) {
    if writer::is_initialized() {
        writer::get().write_access(message);
    } else {
        println!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("JSON shelf server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info(&format!("Data directory: {}", config.storage.data_dir));
    let mut paths: Vec<&String> = config.resources.routes.keys().collect();
    paths.sort();
    for path in paths {
        write_info(&format!(
            "Resource: {path} -> {}",
            config.resources.routes[path].file
        ));
    }
    write_info(&format!(
        "Max body size: {} bytes",
        config.http.max_body_size
    ));
    if let Some(max) = config.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        write_info(&format!("[Headers] Count: {count}"));
    }
}

/// Render a finished request and write it to the access log.
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_signal_received(signal: &str) {
    write_info(&format!("\n[Shutdown] Received {signal}, shutting down"));
}

pub fn log_shutdown_started() {
    write_info("[Shutdown] Stopped accepting new connections");
}

pub fn log_shutdown_draining(active: usize) {
    write_info(&format!(
        "[Shutdown] Waiting for {active} active connection(s) to finish"
    ));
}

pub fn log_shutdown_complete() {
    write_info("[Shutdown] Server stopped");
}
