//! Reflects method, body and query string back to the client

use crate::templates::{render, EchoTemplate};
use sesscgi_core::{CgiResponse, RequestContext, SessionResult};

pub fn echo(request: &RequestContext) -> SessionResult<CgiResponse> {
    let page = EchoTemplate::new(
        request.method.to_string(),
        String::from_utf8_lossy(&request.body).into_owned(),
        request.query_string.clone().unwrap_or_default(),
    );
    Ok(CgiResponse::html(render(&page, "echo")?))
}
