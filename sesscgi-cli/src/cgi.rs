//! CGI/1.1 adapter
//!
//! Builds a [`RequestContext`] from meta-variables and the request body, and
//! serialises a [`CgiResponse`] as CGI header lines followed by the body.

use sesscgi_core::{
    validation_error, CgiResponse, ErrorContext, Method, RequestContext, SessionError,
    SessionResult,
};
use std::collections::HashMap;
use std::io::{self, Write};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on a request body read from stdin
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

const COMPONENT: &str = "cgi";

/// Build a request from CGI meta-variables; the body is supplied separately
pub fn request_from_env(vars: Vec<(String, String)>, body: Vec<u8>) -> RequestContext {
    let lookup: HashMap<&str, &str> = vars
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let get = |key: &str| {
        lookup
            .get(key)
            .map(|v| v.to_string())
            .filter(|v| !v.is_empty())
    };

    let method = Method::parse(lookup.get("REQUEST_METHOD").copied().unwrap_or("GET"));
    let cookie_header = get("HTTP_COOKIE");
    let remote_addr = get("REMOTE_ADDR");
    let query_string = get("QUERY_STRING");

    RequestContext {
        method,
        cookie_header,
        body,
        remote_addr,
        query_string,
        environment: vars,
    }
}

fn body_too_large(len: u64) -> SessionError {
    validation_error!(
        format!(
            "Request body of {} bytes exceeds the {} byte limit",
            len, MAX_BODY_BYTES
        ),
        "CONTENT_LENGTH",
        COMPONENT
    )
}

/// Read the request body honouring `CONTENT_LENGTH`.
///
/// Without a length only POST bodies are read, up to EOF. A body larger than
/// [`MAX_BODY_BYTES`] is rejected rather than cut short.
pub async fn read_body<R>(
    reader: R,
    method: &Method,
    content_length: Option<&str>,
) -> SessionResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let limit = match content_length.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(len) if len > MAX_BODY_BYTES => return Err(body_too_large(len)),
        Some(len) => len,
        None if *method == Method::Post => MAX_BODY_BYTES + 1,
        None => return Ok(Vec::new()),
    };

    let mut body = Vec::new();
    reader
        .take(limit)
        .read_to_end(&mut body)
        .await
        .map_err(|e| SessionError::Internal {
            message: format!("Failed to read request body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new(COMPONENT)
                .with_operation("read_body")
                .with_metadata("content_length", content_length.unwrap_or("unset")),
        })?;

    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(body_too_large(body.len() as u64));
    }
    Ok(body)
}

/// Read the current process's CGI request
pub async fn read_request() -> SessionResult<RequestContext> {
    let vars: Vec<(String, String)> = std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect();

    let method = Method::parse(
        vars.iter()
            .find(|(k, _)| k == "REQUEST_METHOD")
            .map(|(_, v)| v.as_str())
            .unwrap_or("GET"),
    );
    let content_length = vars
        .iter()
        .find(|(k, _)| k == "CONTENT_LENGTH")
        .map(|(_, v)| v.clone());

    let body = read_body(tokio::io::stdin(), &method, content_length.as_deref()).await?;
    Ok(request_from_env(vars, body))
}

/// Header values must not smuggle extra header lines
fn sanitize_header_value(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Write headers, a blank line, then the body.
///
/// Extra headers (notably `Set-Cookie`) precede `Content-Type`; no body byte
/// is written before the header block is complete.
pub fn write_response<W: Write>(out: &mut W, response: &CgiResponse) -> io::Result<()> {
    let mut head = String::new();
    for (name, value) in &response.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(&sanitize_header_value(value));
        head.push('\n');
    }
    head.push_str("Content-Type: ");
    head.push_str(&sanitize_header_value(&response.content_type));
    head.push_str("\n\n");

    out.write_all(head.as_bytes())?;
    out.write_all(response.body.as_bytes())?;
    out.flush()
}

/// Last-resort response when the request cannot be read or rendered.
///
/// Bad request input is a client error; everything else is a server error.
pub fn fallback_response(error: &SessionError) -> CgiResponse {
    let error_id = error
        .context()
        .map(|c| c.error_id.clone())
        .unwrap_or_else(|| "unavailable".to_string());

    let status = match error {
        SessionError::Validation { .. } => "400 Bad Request",
        _ => "500 Internal Server Error",
    };
    let reason = status.split_once(' ').map_or(status, |(_, reason)| reason);

    CgiResponse::new(
        "text/plain",
        format!("{} (error id: {})\n", reason, error_id),
    )
    .with_header("Status", status.to_string())
}
