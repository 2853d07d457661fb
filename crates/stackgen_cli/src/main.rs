//! stackgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Template error
//! - 4: Filesystem error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stackgen_core::BuildError;
use stackgen_templates::TemplateError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const TEMPLATE_ERROR: u8 = 3;
    pub const FILESYSTEM_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "stackgen=debug"
    } else if cli.quiet {
        "stackgen=warn"
    } else {
        "stackgen=info"
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [level, "warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.quiet),
        Commands::Options(args) => commands::options::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<BuildError>() {
            return match err {
                BuildError::Template(TemplateError::UnresolvedPlaceholder(_)) => {
                    ExitCodes::TEMPLATE_ERROR
                }
                BuildError::InvalidLayout { .. } => ExitCodes::INVALID_ARGS,
                BuildError::Template(TemplateError::Io { .. })
                | BuildError::MissingExtensionConfig { .. }
                | BuildError::Io { .. } => ExitCodes::FILESYSTEM_ERROR,
            };
        }
    }

    ExitCodes::GENERAL_ERROR
}
