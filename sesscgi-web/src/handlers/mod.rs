//! Request handlers
//!
//! One handler per CGI script. Only the state handler touches the session store.

pub mod echo;
pub mod environment;
pub mod hello;
pub mod state;

pub use echo::echo;
pub use environment::environment;
pub use hello::{hello_html, hello_json};
pub use state::{StateHandler, StateOutcome, CLEAR_SENTINEL};
