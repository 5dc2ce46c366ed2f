//! `dark-factory` entry point
//!
//! Progress and summaries go to stdout; tracing goes to stderr, filtered by
//! `RUST_LOG` (default `info`).

mod cli;
mod commands;

use commands::{Invocation, EXIT_FAILURE};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let matches = cli::build_cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        std::process::exit(EXIT_FAILURE);
    };

    let outcome = match Invocation::from_matches(args) {
        Ok(ctx) => match name {
            "run-scenarios" => commands::run_scenarios(&ctx, args).await,
            "compile-feedback" => commands::compile_feedback(&ctx, args),
            "strip" => commands::strip(&ctx, args).await,
            "restore" => commands::restore(&ctx, args).await,
            "status" => commands::status(&ctx).await,
            other => Err(anyhow::anyhow!("unknown command '{other}'")),
        },
        Err(err) => Err(err),
    };

    let code = match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
