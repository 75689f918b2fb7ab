//! typeroute CLI Binary
//!
//! # Usage
//!
//! ```bash
//! # Rewrite route registrations and write JavaScript to outDir
//! typeroute build server.ts
//!
//! # List the routes that would be rewritten
//! typeroute check server.ts
//!
//! # Print the schema generated for one type
//! typeroute schema Query server.ts
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tr_cli::{
    commands::{
        self, build::BuildArgs, check::CheckArgs, schema::SchemaArgs,
    },
    config::ToolConfig,
    diagnostics::{render_cli_error, setup_error_reporting},
    Error, Result,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "typeroute",
    version = env!("CARGO_PKG_VERSION"),
    about = "Injects JSON schemas generated from route type arguments into Fastify routes",
    long_about = r#"
typeroute finds `server.<method><Query, Params, Body, Headers>(path, handler)`
calls on a FastifyInstance, generates a JSON schema for each of the four
types and passes them to the route as `{ schema: { query, params, body, headers } }`.

EXAMPLES:
    typeroute build server.ts             # Rewrite and compile to outDir
    typeroute check                       # List routes using typeroute.toml
    typeroute schema Query server.ts      # Print one generated schema
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite route calls and write the compiled program
    Build(BuildArgs),

    /// Rewrite route calls without writing, listing every matched route
    Check(CheckArgs),

    /// Print the schema definitions generated for a type
    Schema(SchemaArgs),
}

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = run(cli) {
        if verbose > 0 {
            tracing::error!(?e, "detailed error context");
        }
        render_cli_error(e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up error reporting
    setup_error_reporting()?;

    // Configure logging
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    // Change working directory if specified
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(Error::Io)?;
    }

    let config = ToolConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build(args) => commands::build_command(args, &config)?,
        Commands::Check(args) => commands::check_command(args, &config)?,
        Commands::Schema(args) => commands::schema_command(args, &config)?,
    }

    if cli.verbose > 0 {
        info!("Command completed successfully");
    }
    Ok(())
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let result = match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(formatter)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(formatter.json())
            .with(filter)
            .try_init(),
    };
    result.map_err(|e| Error::config(format!("failed to set up logging: {e}")))
}
