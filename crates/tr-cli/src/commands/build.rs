//! `typeroute build`: transform and write the compiled program.

use std::path::PathBuf;

use clap::Args;
use tr_core::Result;
use tr_typescript::EmitTarget;

use crate::config::ToolConfig;
use crate::driver::{self, EmitOverrides, ProjectInputs};

/// Arguments for the build command
#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Entry source file (defaults to `entry` in typeroute.toml)
    pub entry: Option<PathBuf>,
    /// Type configuration file
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,
    /// Output directory (overrides `compilerOptions.outDir`)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Output language
    #[arg(long)]
    pub target: Option<EmitTarget>,
}

/// Execute the build command
pub fn build_command(args: BuildArgs, config: &ToolConfig) -> Result<()> {
    let inputs = ProjectInputs::resolve(args.entry, args.tsconfig, config)?;
    let program = driver::load_program(&inputs)?;
    let overrides = EmitOverrides {
        out_dir: args.out_dir,
        target: args.target,
    };
    let options = driver::emit_options(&program, config, &overrides);
    let output = driver::transform(&program, config, options)?;
    driver::write(&output.files)?;

    println!(
        "Injected schemas into {} route(s); wrote {} file(s)",
        output.report.len(),
        output.files.len()
    );
    for file in &output.files {
        println!("  {}", driver::display_path(&file.path));
    }
    Ok(())
}
