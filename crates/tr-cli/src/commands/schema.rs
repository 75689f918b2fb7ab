//! `typeroute schema`: print the schema generated for one type.

use std::path::PathBuf;

use clap::Args;
use tr_core::Result;
use tr_jsonschema::{SchemaGenerator, SchemaResolver};

use crate::config::ToolConfig;
use crate::driver::{self, ProjectInputs};

/// Arguments for the schema command
#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Name of the type to generate a schema for
    pub type_name: String,
    /// Entry source file (defaults to `entry` in typeroute.toml)
    pub entry: Option<PathBuf>,
    /// Type configuration file
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,
}

/// Execute the schema command
pub fn schema_command(args: SchemaArgs, config: &ToolConfig) -> Result<()> {
    let inputs = ProjectInputs::resolve(args.entry, args.tsconfig, config)?;
    let program = driver::load_program(&inputs)?;
    let generator = SchemaGenerator::new(&program, config.schema.clone());
    let definitions = generator.schema_for(&args.type_name)?;
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
