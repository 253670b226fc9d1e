//! Sesscgi - operator tool for the sesscgi CGI scripts
//!
//! Runs any script against the current CGI environment, writes a default
//! configuration file, and inspects or clears individual session records.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sesscgi_cli::{load_config, serve, Script};
use sesscgi_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    validation_error, SessionResult, SessionStore, SessionToken, SesscgiConfig,
};
use sesscgi_web::create_store;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sesscgi")]
#[command(about = "CGI session demo scripts and their operator tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to $SESSCGI_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the current CGI request with one script
    Run {
        #[arg(value_enum)]
        script: Script,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect or clear a stored session record
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Destination file
        #[arg(long, default_value = "sesscgi.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the value stored for a token
    Show { token: String },

    /// Remove the record stored for a token
    Clear { token: String },
}

fn parse_token(raw: &str) -> SessionResult<SessionToken> {
    SessionToken::parse(raw).ok_or_else(|| {
        validation_error!(
            format!(
                "'{}' is not a valid session token (expected 1-{} characters from [A-Za-z0-9_-])",
                raw,
                SessionToken::MAX_LEN
            ),
            "token",
            "session_cli"
        )
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `run` installs logging from the loaded configuration itself
    let command = match cli.command {
        Commands::Run { script } => {
            serve(script, cli.config.as_deref())
                .await
                .context("Failed to write CGI response")?;
            return Ok(());
        }
        other => other,
    };

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            e.log();
            return Err(e).context("Failed to load configuration");
        }
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("sesscgi: logging disabled: {e}");
    }

    match command {
        Commands::Run { .. } => {}
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                log_operation_start!("config_init", path = %path.display());
                SesscgiConfig::default().save_to_file(&path)?;
                log_operation_success!("config_init", path = %path.display());
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Show => {
                let rendered = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                print!("{rendered}");
            }
        },
        Commands::Session { action } => {
            let store = create_store(&config.session);
            match action {
                SessionAction::Show { token } => {
                    let token = parse_token(&token)?;
                    match store.read(&token).await {
                        Ok(Some(value)) => println!("{value}"),
                        Ok(None) => println!("(no saved data)"),
                        Err(e) => {
                            log_operation_error!("session_show", e, token = %token);
                            return Err(e).context("Failed to read session record");
                        }
                    }
                }
                SessionAction::Clear { token } => {
                    let token = parse_token(&token)?;
                    log_operation_start!("session_clear", token = %token);
                    if let Err(e) = store.delete(&token).await {
                        log_operation_error!("session_clear", e, token = %token);
                        return Err(e).context("Failed to clear session record");
                    }
                    log_operation_success!("session_clear", token = %token);
                    println!("Cleared session {token}");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let cli = Cli::parse_from(["sesscgi", "run", "hello-json"]);
        assert!(matches!(
            cli.command,
            Commands::Run {
                script: Script::HelloJson
            }
        ));
        assert!(cli.config.is_none());

        let cli = Cli::parse_from([
            "sesscgi",
            "session",
            "clear",
            "abc123",
            "--config",
            "/etc/sesscgi.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sesscgi.toml")));
        assert!(matches!(
            cli.command,
            Commands::Session {
                action: SessionAction::Clear { ref token }
            } if token == "abc123"
        ));
    }

    #[test]
    fn test_config_init_defaults() {
        let cli = Cli::parse_from(["sesscgi", "config", "init"]);
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { path, force },
            } => {
                assert_eq!(path, PathBuf::from("sesscgi.toml"));
                assert!(!force);
            }
            _ => panic!("expected config init"),
        }
    }

    #[test]
    fn test_parse_token_rejects_unsafe_input() {
        assert_eq!(parse_token("abc123").unwrap().as_str(), "abc123");

        match parse_token("../secret") {
            Err(sesscgi_core::SessionError::Validation { field, message, .. }) => {
                assert_eq!(field.as_deref(), Some("token"));
                assert!(message.contains("../secret"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
