//! Core data type definitions

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::logging::LoggingConfig;

/// HTTP request method as reported by the hosting server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    /// Parse a `REQUEST_METHOD` value. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" | "" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(m) => m,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Already-split request metadata handed over by the hosting environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub method: Method,
    /// Raw `Cookie` header (`HTTP_COOKIE`)
    pub cookie_header: Option<String>,
    /// Raw request body, only meaningful for POST
    pub body: Vec<u8>,
    pub remote_addr: Option<String>,
    pub query_string: Option<String>,
    /// Full process environment, for handlers that reflect it
    pub environment: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            cookie_header: None,
            body: Vec::new(),
            remote_addr: None,
            query_string: None,
            environment: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn post(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::Post).with_body(body)
    }

    pub fn with_cookie(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_query_string(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    pub fn with_environment(mut self, environment: Vec<(String, String)>) -> Self {
        self.environment = environment;
        self
    }
}

/// Recoverable request-level problems.
///
/// None of these change the status of the response; they are kept apart from
/// the body so they can be logged without leaking into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Cookie header present but contained segments that are not `name=value`
    MalformedCookie,
    /// POST body was not valid UTF-8 form encoding
    MalformedBody,
    /// Session cookie carried characters unsafe for headers or storage; a fresh token was minted
    InvalidToken,
    /// Session slot could not be read, written or removed
    StoreUnavailable { operation: String, message: String },
}

/// Response produced by a handler, written to the transport by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CgiResponse {
    pub content_type: String,
    /// Extra headers in emission order (notably `Set-Cookie`)
    pub headers: Vec<(String, String)>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl CgiResponse {
    pub const HTML: &'static str = "text/html";
    pub const JSON: &'static str = "application/json";

    pub fn new(content_type: &str, body: String) -> Self {
        Self {
            content_type: content_type.to_string(),
            headers: Vec::new(),
            body,
            diagnostics: Vec::new(),
        }
    }

    pub fn html(body: String) -> Self {
        Self::new(Self::HTML, body)
    }

    pub fn json(body: String) -> Self {
        Self::new(Self::JSON, body)
    }

    pub fn with_header(mut self, name: &str, value: String) -> Self {
        self.headers.push((name.to_string(), value));
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Opaque per-client identifier carried in the session cookie.
///
/// Only ASCII alphanumerics, `-` and `_` are accepted, so a token can never
/// break a `Set-Cookie` header or escape the store's flat key namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    pub const MAX_LEN: usize = 128;
    const ENTROPY_BYTES: usize = 16;

    /// Mint a fresh token: nanosecond timestamp plus 128 bits from the OS RNG.
    ///
    /// Every call draws new entropy; nothing is seeded once per process.
    pub fn mint() -> Self {
        let mut entropy = [0u8; Self::ENTROPY_BYTES];
        OsRng.fill_bytes(&mut entropy);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        // hex digits, '-' and the URL-safe base64 alphabet are all token-safe
        Self(format!("{:x}-{}", nanos, URL_SAFE_NO_PAD.encode(entropy)))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::is_safe(raw).then(|| Self(raw.to_string()))
    }

    pub fn is_safe(raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_safe(&value) {
            Ok(Self(value))
        } else {
            Err(format!("unsafe session token: {value:?}"))
        }
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Configuration root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SesscgiConfig {
    pub session: SessionConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// `Path` attribute emitted with a freshly minted cookie
    pub cookie_path: String,
    /// Directory holding one file per session token
    pub session_dir: String,
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    File,
    /// Process-local; only useful for tests and embedding
    Memory,
}

/// Identity strings shown by the greeting pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub team: String,
    pub language: String,
}
