//! Template system for server-side rendering
//!
//! Page templates rendered with Askama. Every reflected value is HTML-escaped.

use askama::Template;
use sesscgi_core::{ErrorContext, SessionError, SessionResult};

/// Shown in place of the saved name when the session has no record
pub const NO_DATA_PLACEHOLDER: &str = "no saved data yet";

/// Session state demo page
#[derive(Template)]
#[template(path = "state.html")]
pub struct StateTemplate {
    pub title: String,
    pub session_id: String,
    pub saved_name: Option<String>,
    pub cleared: bool,
    pub placeholder: &'static str,
    pub clear_sentinel: &'static str,
}

/// Greeting page
#[derive(Template)]
#[template(path = "hello.html")]
pub struct HelloTemplate {
    pub title: String,
    pub team: String,
    pub language: String,
    pub date: String,
    pub ip: String,
}

/// Environment variable listing
#[derive(Template)]
#[template(path = "environment.html")]
pub struct EnvironmentTemplate {
    pub title: String,
    pub variables: Vec<(String, String)>,
}

/// Request echo page
#[derive(Template)]
#[template(path = "echo.html")]
pub struct EchoTemplate {
    pub title: String,
    pub method: String,
    pub body: String,
    pub query_string: String,
}

impl StateTemplate {
    pub fn new(session_id: String, saved_name: Option<String>, cleared: bool) -> Self {
        Self {
            title: "Rust State Demo".to_string(),
            session_id,
            saved_name,
            cleared,
            placeholder: NO_DATA_PLACEHOLDER,
            clear_sentinel: crate::handlers::CLEAR_SENTINEL,
        }
    }
}

impl HelloTemplate {
    pub fn new(team: String, language: String, date: String, ip: String) -> Self {
        Self {
            title: "Hello from Rust!".to_string(),
            team,
            language,
            date,
            ip,
        }
    }
}

impl EnvironmentTemplate {
    pub fn new(variables: Vec<(String, String)>) -> Self {
        Self {
            title: "Environment Variables (Rust)".to_string(),
            variables,
        }
    }
}

impl EchoTemplate {
    pub fn new(method: String, body: String, query_string: String) -> Self {
        Self {
            title: "Rust Echo".to_string(),
            method,
            body,
            query_string,
        }
    }
}

/// Render a template, mapping failures into the shared error type
pub fn render<T: Template>(template: &T, page: &str) -> SessionResult<String> {
    template.render().map_err(|e| SessionError::Template {
        message: format!("Failed to render {} page: {}", page, e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("templates").with_operation(page),
    })
}
