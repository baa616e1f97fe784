//! agent-gateway binary entry point.

use std::process::ExitCode;

use agent_gateway::api::{serve_with_state, AppState};
use agent_gateway::cli::{self, parse_args};
use agent_gateway::config::Config;
use agent_gateway::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'agent-gateway --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.log_filter(), config.logging.file.as_deref()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("agent-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!(
        auth = config.security.auth.enabled,
        tunnel_program = %config.tunnel.program,
        deadline_secs = config.tunnel.deadline_secs,
        "configuration loaded"
    );

    match serve_with_state(server_config, AppState::from_config(&config)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
