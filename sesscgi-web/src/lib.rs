//! Sesscgi Web
//!
//! Request handlers for the sesscgi scripts. The state script composes the
//! session resolver with a session store; the rest only reflect the request.

pub mod cookie;
pub mod form;
pub mod handlers;
pub mod store;
pub mod templates;

// Re-export main types
pub use cookie::{find_cookie, ResolvedSession, SessionResolver};
pub use handlers::{StateHandler, StateOutcome, CLEAR_SENTINEL};
pub use store::{create_store, FileSessionStore, MemorySessionStore};
pub use templates::NO_DATA_PLACEHOLDER;

use sesscgi_core::SesscgiConfig;

/// Wire the state handler from configuration
pub fn state_handler(config: &SesscgiConfig) -> StateHandler {
    StateHandler::new(
        SessionResolver::from_config(&config.session),
        create_store(&config.session),
    )
}
