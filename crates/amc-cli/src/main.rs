//! `amc-ops` binary: command-line entry point for the AMC operations console.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use amc_gateway::{run_console_server, ConsoleAuthMode, ConsoleServerConfig};
use amc_store::SqliteOpsStore;

mod bootstrap_helpers;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_auth_mode(value: &str) -> Result<ConsoleAuthMode, String> {
    ConsoleAuthMode::parse_flag(value)
        .ok_or_else(|| "supported auth modes are localhost-dev and token".to_string())
}

#[derive(Debug, Parser)]
#[command(name = "amc-ops", about = "Operations console for AMC advertising workflows")]
struct AmcOpsCli {
    #[command(subcommand)]
    command: AmcOpsCommand,
}

#[derive(Debug, Subcommand)]
enum AmcOpsCommand {
    /// Run the console HTTP server.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "AMC_OPS_BIND", default_value = "127.0.0.1:8790")]
    bind: String,

    #[arg(long, env = "AMC_OPS_DB_PATH", default_value = ".amc-ops/console.sqlite")]
    db_path: PathBuf,

    #[arg(
        long,
        env = "AMC_OPS_AUTH_MODE",
        default_value = "localhost-dev",
        value_parser = parse_auth_mode
    )]
    auth_mode: ConsoleAuthMode,

    #[arg(long, env = "AMC_OPS_AUTH_TOKEN")]
    auth_token: Option<String>,

    #[arg(long, env = "AMC_OPS_OPERATOR_USER", default_value = "localhost-dev")]
    operator_user_id: String,

    #[arg(
        long,
        env = "AMC_OPS_RATE_LIMIT_WINDOW_SECONDS",
        default_value_t = 60,
        value_parser = parse_positive_u64
    )]
    rate_limit_window_seconds: u64,

    #[arg(
        long,
        env = "AMC_OPS_RATE_LIMIT_MAX_REQUESTS",
        default_value_t = 120,
        value_parser = parse_positive_usize
    )]
    rate_limit_max_requests: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap_helpers::init_tracing();
    let cli = AmcOpsCli::parse();
    match cli.command {
        AmcOpsCommand::Serve(args) => run_serve(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let auth_token = args
        .auth_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);
    if args.auth_mode == ConsoleAuthMode::Token && auth_token.is_none() {
        bail!("--auth-token is required when --auth-mode is token");
    }

    let store = SqliteOpsStore::new(&args.db_path)
        .with_context(|| format!("failed to open store at {}", args.db_path.display()))?;

    let config = ConsoleServerConfig {
        bind: args.bind,
        auth_mode: args.auth_mode,
        auth_token,
        operator_user_id: args.operator_user_id,
        rate_limit_window_seconds: args.rate_limit_window_seconds,
        rate_limit_max_requests: args.rate_limit_max_requests,
    };
    run_console_server(config, Arc::new(store)).await
}
