//! Session state demo CGI script

use std::process::ExitCode;

use sesscgi_cli::{run_script, Script};

fn main() -> ExitCode {
    run_script(Script::State)
}
