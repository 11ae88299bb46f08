// Server module entry point
// Provides listener setup, connection handling, signals, and the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file cannot be a module name directly
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used items
pub use listener::create_listener;
pub use server_loop::run_accept_loop;
pub use signal::{start_signal_handler, SignalHandler};
