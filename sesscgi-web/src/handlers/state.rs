//! Session state demo: remembers one name per session

use crate::cookie::SessionResolver;
use crate::form::form_field;
use crate::templates::{render, StateTemplate};
use sesscgi_core::{
    CgiResponse, Diagnostic, Method, RequestContext, SessionError, SessionResult, SessionStore,
    SessionToken,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Form value meaning "delete my record". Never stored literally.
pub const CLEAR_SENTINEL: &str = "CLEAR";

/// Form field carrying the submitted name
pub const USERNAME_FIELD: &str = "username";

/// What the state page shows after handling a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateOutcome {
    /// GET: the stored value, or absent
    Current(Option<String>),
    /// POST with a value: the value just written
    Saved(String),
    /// POST with the sentinel: the record was removed
    Cleared,
}

impl StateOutcome {
    fn saved_name(&self) -> Option<String> {
        match self {
            StateOutcome::Current(value) => value.clone(),
            StateOutcome::Saved(value) => Some(value.clone()),
            StateOutcome::Cleared => None,
        }
    }
}

/// GET renders the stored value; POST writes or clears it
pub struct StateHandler {
    resolver: SessionResolver,
    store: Arc<dyn SessionStore>,
}

impl StateHandler {
    pub fn new(resolver: SessionResolver, store: Arc<dyn SessionStore>) -> Self {
        Self { resolver, store }
    }

    /// Handle one request. Recoverable store failures degrade to the absent
    /// state and are reported as diagnostics; any other store or template
    /// failure is returned as an error.
    pub async fn handle(&self, request: &RequestContext) -> SessionResult<CgiResponse> {
        let session = self.resolver.resolve(request.cookie_header.as_deref());
        let mut diagnostics = session.diagnostics.clone();

        if session.is_new {
            info!(backend = self.store.backend_name(), "Minted new session token");
        }

        let outcome = match request.method {
            Method::Post => {
                self.mutate(&session.token, &request.body, &mut diagnostics)
                    .await?
            }
            _ => self.current(&session.token, &mut diagnostics).await?,
        };

        let page = StateTemplate::new(
            session.token.to_string(),
            outcome.saved_name(),
            outcome == StateOutcome::Cleared,
        );
        let mut response = CgiResponse::html(render(&page, "state")?);

        if session.is_new {
            response = response.with_header(
                "Set-Cookie",
                self.resolver.set_cookie_value(&session.token),
            );
        }

        for diagnostic in &diagnostics {
            match diagnostic {
                Diagnostic::StoreUnavailable { operation, message } => {
                    warn!(operation = %operation, error = %message, "Session store unavailable")
                }
                other => debug!(diagnostic = ?other, "Recovered from malformed request data"),
            }
        }

        Ok(response.with_diagnostics(diagnostics))
    }

    async fn current(
        &self,
        token: &SessionToken,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> SessionResult<StateOutcome> {
        match self.store.read(token).await {
            Ok(value) => Ok(StateOutcome::Current(value)),
            Err(e) => {
                diagnostics.push(store_unavailable("read", e)?);
                Ok(StateOutcome::Current(None))
            }
        }
    }

    async fn mutate(
        &self,
        token: &SessionToken,
        body: &[u8],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> SessionResult<StateOutcome> {
        let field = form_field(body, USERNAME_FIELD);
        if field.malformed {
            diagnostics.push(Diagnostic::MalformedBody);
        }

        if field.value == CLEAR_SENTINEL {
            return match self.store.delete(token).await {
                Ok(()) => {
                    info!("Session record cleared");
                    Ok(StateOutcome::Cleared)
                }
                Err(e) => {
                    diagnostics.push(store_unavailable("delete", e)?);
                    Ok(StateOutcome::Current(None))
                }
            };
        }

        match self.store.write(token, &field.value).await {
            Ok(()) => {
                info!(bytes = field.value.len(), "Session record saved");
                Ok(StateOutcome::Saved(field.value))
            }
            Err(e) => {
                diagnostics.push(store_unavailable("write", e)?);
                Ok(StateOutcome::Current(None))
            }
        }
    }
}

/// Turn a recoverable store failure into a diagnostic; pass anything else on
fn store_unavailable(operation: &str, error: SessionError) -> SessionResult<Diagnostic> {
    if !error.is_recoverable() {
        return Err(error);
    }

    error.log();
    Ok(Diagnostic::StoreUnavailable {
        operation: operation.to_string(),
        message: error.to_string(),
    })
}
