//! Dev-server lifecycle for FiberForge.
//!
//! After generation completes, a run selects a free port, launches the
//! Vite dev server as a detached child process, polls it until it responds
//! or a timeout elapses, and reports readiness. The process outlives the
//! readiness decision; a timeout never kills it.

mod error;
mod lifecycle;

pub use error::{ServerError, ServerResult};
pub use lifecycle::{
    find_available_port, launch, open_in_browser, server_url, wait_until_ready,
    write_port_config, LaunchSpec, ServerHandle, DEFAULT_PORT,
};
