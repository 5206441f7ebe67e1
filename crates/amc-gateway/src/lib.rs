//! HTTP surface for the AMC operations console.
//!
//! Serves the authenticated dashboard snapshot and a server status report.

pub mod console_api;

pub use console_api::{
    build_console_router, run_console_server, ConsoleAuthMode, ConsoleServerConfig,
    ConsoleServerState,
};
