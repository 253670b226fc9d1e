//! Script dispatch and the shared CGI process entry point

use crate::cgi;
use chrono::Utc;
use clap::ValueEnum;
use sesscgi_core::{
    init_logging, performance::measure_async, CgiResponse, RequestContext, SessionResult,
    SesscgiConfig,
};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, warn};

/// The CGI scripts this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Script {
    /// Cookie-identified session that remembers one name
    State,
    HelloHtml,
    HelloJson,
    /// Dump of every CGI meta-variable
    Environment,
    /// Method, body and query string of the request
    Echo,
}

impl Script {
    pub fn name(&self) -> &'static str {
        match self {
            Script::State => "state",
            Script::HelloHtml => "hello-html",
            Script::HelloJson => "hello-json",
            Script::Environment => "environment",
            Script::Echo => "echo",
        }
    }
}

/// Produce the response for one request
pub async fn dispatch(
    script: Script,
    config: &SesscgiConfig,
    request: &RequestContext,
) -> SessionResult<CgiResponse> {
    use sesscgi_web::handlers;

    match script {
        Script::State => sesscgi_web::state_handler(config).handle(request).await,
        Script::HelloHtml => handlers::hello_html(request, &config.site, Utc::now()),
        Script::HelloJson => handlers::hello_json(request, &config.site, Utc::now()),
        Script::Environment => handlers::environment(request),
        Script::Echo => handlers::echo(request),
    }
}

/// Explicit file (with env overrides) or the `SESSCGI_CONFIG` / default resolution
pub fn load_config(path: Option<&Path>) -> SessionResult<SesscgiConfig> {
    match path {
        Some(path) => load_config_file(path, |key| std::env::var(key).ok()),
        None => SesscgiConfig::load(),
    }
}

fn load_config_file<F>(path: &Path, lookup: F) -> SessionResult<SesscgiConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = SesscgiConfig::from_file(path)?;
    config.apply_env_overrides(lookup);
    config.validate()?;
    Ok(config)
}

/// Read the request and run `script`; any error becomes the fallback page
async fn respond(script: Script, config: &SesscgiConfig) -> CgiResponse {
    let result = match cgi::read_request().await {
        Ok(request) => {
            debug!(script = script.name(), method = %request.method, "Handling CGI request");
            measure_async(script.name(), dispatch(script, config, &request)).await
        }
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|e| {
        e.log();
        cgi::fallback_response(&e)
    })
}

/// Serve the current process's CGI request with `script` and write the response to stdout
pub async fn serve(script: Script, config_path: Option<&Path>) -> std::io::Result<()> {
    let response = match load_config(config_path) {
        Ok(config) => {
            // a second subscriber (or an unwritable log file) must not cost the response
            if let Err(e) = init_logging(&config.logging) {
                eprintln!("sesscgi: logging disabled: {e}");
            }
            respond(script, &config).await
        }
        Err(e) => {
            eprintln!("sesscgi: {e}");
            warn!(error = %e, "Configuration could not be loaded");
            cgi::fallback_response(&e)
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cgi::write_response(&mut out, &response)?;
    out.flush()
}

/// Entry point for the single-purpose script binaries
pub fn run_script(script: Script) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("sesscgi: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(serve(script, None)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sesscgi: failed to write response: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sesscgi_core::{StoreBackend, COOKIE_NAME_ENV};

    fn memory_config() -> SesscgiConfig {
        let mut config = SesscgiConfig::default();
        config.session.backend = StoreBackend::Memory;
        config.session.cookie_name = "sess".to_string();
        config
    }

    #[test]
    fn test_script_names_match_value_enum() {
        for script in Script::value_variants() {
            let parsed = Script::from_str(script.name(), false).unwrap();
            assert_eq!(parsed, *script);
        }
    }

    #[tokio::test]
    async fn test_dispatch_state_sets_cookie() {
        let response = dispatch(Script::State, &memory_config(), &RequestContext::get())
            .await
            .unwrap();

        assert!(response
            .header("Set-Cookie")
            .is_some_and(|v| v.starts_with("sess=")));
    }

    #[tokio::test]
    async fn test_dispatch_stateless_scripts() {
        let config = memory_config();
        let request = RequestContext::get().with_query_string("x=1");

        let json = dispatch(Script::HelloJson, &config, &request).await.unwrap();
        assert_eq!(json.content_type, CgiResponse::JSON);

        let echo = dispatch(Script::Echo, &config, &request).await.unwrap();
        assert!(echo.body.contains("x=1"));

        for script in [Script::HelloHtml, Script::Environment] {
            let response = dispatch(script, &config, &request).await.unwrap();
            assert_eq!(response.content_type, CgiResponse::HTML);
            assert!(response.header("Set-Cookie").is_none());
        }
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sesscgi.toml");
        std::fs::write(&path, "[session]\ncookie_name = \"rust_sess\"\n").unwrap();

        let config = load_config_file(&path, |_| None).unwrap();
        assert_eq!(config.session.cookie_name, "rust_sess");
        assert_eq!(config.session.cookie_path, "/");
    }

    #[test]
    fn test_env_overrides_win_over_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sesscgi.toml");
        std::fs::write(&path, "[session]\ncookie_name = \"rust_sess\"\n").unwrap();

        let config = load_config_file(&path, |key| {
            (key == COOKIE_NAME_ENV).then(|| "go_sess".to_string())
        })
        .unwrap();
        assert_eq!(config.session.cookie_name, "go_sess");
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sesscgi.toml");
        std::fs::write(&path, "[session]\ncookie_path = \"relative\"\n").unwrap();

        assert!(load_config_file(&path, |_| None).is_err());
        assert!(load_config(Some(&path)).is_err());
    }
}
