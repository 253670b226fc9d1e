//! Sesscgi CLI - CGI entry points for the sesscgi scripts
//!
//! Each binary under `src/bin` serves exactly one script; `sesscgi` is the
//! operator tool that can run any of them and manage configuration and sessions.

pub mod cgi;
pub mod script;

pub use script::{dispatch, load_config, run_script, serve, Script};
