//! Load, transform and emit, shared by the commands.

use std::path::{Path, PathBuf};

use tr_core::{debug, info, Error, Result};
use tr_jsonschema::SchemaGenerator;
use tr_transform::{PassReport, RouteSchemaPass};
use tr_typescript::{
    BeforeEmit, EmitOptions, EmitTarget, EmittedFile, Program, ProgramEmitter, TsConfig,
};

use crate::config::ToolConfig;

pub const DEFAULT_TSCONFIG: &str = "tsconfig.json";

/// Entry file and type configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInputs {
    pub entry: PathBuf,
    pub tsconfig: PathBuf,
}

impl ProjectInputs {
    /// Command-line values win over the configuration file.
    pub fn resolve(
        entry: Option<PathBuf>,
        tsconfig: Option<PathBuf>,
        config: &ToolConfig,
    ) -> Result<Self> {
        let entry = entry.or_else(|| config.entry_path()).ok_or_else(|| {
            Error::config(format!(
                "no entry file given; pass one on the command line or set `entry` in {}",
                crate::config::CONFIG_FILE_NAME
            ))
        })?;
        let tsconfig = tsconfig
            .or_else(|| config.tsconfig_path())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TSCONFIG));
        Ok(Self { entry, tsconfig })
    }
}

/// Overrides applied on top of `[emit]` and the type configuration.
#[derive(Debug, Clone, Default)]
pub struct EmitOverrides {
    pub out_dir: Option<PathBuf>,
    pub target: Option<EmitTarget>,
}

pub fn load_program(inputs: &ProjectInputs) -> Result<Program> {
    let tsconfig = TsConfig::load(&inputs.tsconfig)?;
    let program = Program::load(&inputs.entry, tsconfig)?;
    program.diagnostics().emit();
    info!(
        "loaded {} file(s) from {}",
        program.files().len(),
        inputs.entry.display()
    );
    Ok(program)
}

pub fn emit_options(program: &Program, config: &ToolConfig, overrides: &EmitOverrides) -> EmitOptions {
    let mut options = EmitOptions::from_config(program.config());
    options.target = overrides.target.unwrap_or(config.emit.target);
    options.minify = config.emit.minify;
    if let Some(out_dir) = &overrides.out_dir {
        options.out_dir = Some(out_dir.clone());
    }
    options
}

/// Output of a successful run, before anything is written.
#[derive(Debug)]
pub struct RunOutput {
    pub files: Vec<EmittedFile>,
    pub report: PassReport,
}

/// Runs the route schema pass over every emitted file and prints the
/// results. Nothing is written; any failure fails the whole run.
pub fn transform(program: &Program, config: &ToolConfig, options: EmitOptions) -> Result<RunOutput> {
    let generator = SchemaGenerator::new(program, config.schema.clone());
    let mut pass = RouteSchemaPass::new(&generator, config.transform.clone());
    let emitter = ProgramEmitter::new(program, options);

    let hook: &mut dyn BeforeEmit = &mut pass;
    let files = emitter.emit(&mut [hook])?;
    let report = pass.finish()?;
    debug!(
        "{} route(s) rewritten across {} file(s)",
        report.len(),
        files.len()
    );
    Ok(RunOutput { files, report })
}

pub fn write(files: &[EmittedFile]) -> Result<()> {
    ProgramEmitter::write(files)?;
    info!("wrote {} file(s)", files.len());
    Ok(())
}

/// Path shown to the user, relative to the working directory when possible.
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
