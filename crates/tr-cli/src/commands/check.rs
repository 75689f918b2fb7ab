//! `typeroute check`: run the transform without writing anything.

use std::path::PathBuf;

use clap::Args;
use tr_core::Result;

use crate::config::ToolConfig;
use crate::driver::{self, EmitOverrides, ProjectInputs};

/// Arguments for the check command
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Entry source file (defaults to `entry` in typeroute.toml)
    pub entry: Option<PathBuf>,
    /// Type configuration file
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,
}

/// Execute the check command
pub fn check_command(args: CheckArgs, config: &ToolConfig) -> Result<()> {
    let inputs = ProjectInputs::resolve(args.entry, args.tsconfig, config)?;
    let program = driver::load_program(&inputs)?;
    let options = driver::emit_options(&program, config, &EmitOverrides::default());
    let output = driver::transform(&program, config, options)?;

    for route in &output.report.routes {
        println!(
            "{}:{}:{} {} {} {}",
            driver::display_path(&route.file),
            route.line,
            route.column,
            route.method.to_uppercase(),
            route.path.as_deref().unwrap_or("<dynamic>"),
            route.types
        );
    }
    println!("{} route(s) checked", output.report.len());
    Ok(())
}
