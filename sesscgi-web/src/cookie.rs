//! Session identity resolution
//!
//! Finds the session token in the raw `Cookie` header, or mints a new one.

use sesscgi_core::{Diagnostic, SessionConfig, SessionToken};
use tracing::debug;

/// Outcome of scanning a `Cookie` header for one name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScan<'a> {
    /// Value of the first matching pair, quotes stripped
    pub value: Option<&'a str>,
    /// A segment without `=` was seen before the match (or anywhere, if none matched)
    pub malformed: bool,
}

/// Scan `;`-separated `name=value` pairs. First match wins.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> CookieScan<'a> {
    let mut malformed = false;

    for pair in header.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let Some((key, value)) = pair.split_once('=') else {
            malformed = true;
            continue;
        };

        if key.trim() == name {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            return CookieScan {
                value: Some(value),
                malformed,
            };
        }
    }

    CookieScan {
        value: None,
        malformed,
    }
}

/// The session a request belongs to
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub token: SessionToken,
    /// Minted for this request; the caller must emit `Set-Cookie`
    pub is_new: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Maps a cookie header to a session token
#[derive(Debug, Clone)]
pub struct SessionResolver {
    cookie_name: String,
    cookie_path: String,
}

impl SessionResolver {
    pub fn new(cookie_name: impl Into<String>, cookie_path: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            cookie_path: cookie_path.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.as_str(), config.cookie_path.as_str())
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolve the token for a request. Never fails: a missing, empty,
    /// malformed or unsafe cookie yields a freshly minted token.
    pub fn resolve(&self, cookie_header: Option<&str>) -> ResolvedSession {
        let mut diagnostics = Vec::new();

        let scan = cookie_header
            .map(|header| find_cookie(header, &self.cookie_name))
            .unwrap_or(CookieScan {
                value: None,
                malformed: false,
            });

        if scan.malformed {
            diagnostics.push(Diagnostic::MalformedCookie);
        }

        match scan.value.filter(|v| !v.is_empty()) {
            Some(raw) => match SessionToken::parse(raw) {
                Some(token) => {
                    debug!(cookie = %self.cookie_name, "Reusing session token from cookie");
                    return ResolvedSession {
                        token,
                        is_new: false,
                        diagnostics,
                    };
                }
                None => {
                    debug!(cookie = %self.cookie_name, "Session cookie carries an unsafe token; re-minting");
                    diagnostics.push(Diagnostic::InvalidToken);
                }
            },
            None => debug!(cookie = %self.cookie_name, "No session cookie; minting a new token"),
        }

        ResolvedSession {
            token: SessionToken::mint(),
            is_new: true,
            diagnostics,
        }
    }

    /// `Set-Cookie` value for a freshly minted token: `<name>=<token>; Path=<path>`
    pub fn set_cookie_value(&self, token: &SessionToken) -> String {
        format!("{}={}; Path={}", self.cookie_name, token, self.cookie_path)
    }
}
