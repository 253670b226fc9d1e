//! Lists the CGI environment

use crate::templates::{render, EnvironmentTemplate};
use sesscgi_core::{CgiResponse, RequestContext, SessionResult};

pub fn environment(request: &RequestContext) -> SessionResult<CgiResponse> {
    let mut variables = request.environment.clone();
    variables.sort();

    let page = EnvironmentTemplate::new(variables);
    Ok(CgiResponse::html(render(&page, "environment")?))
}
