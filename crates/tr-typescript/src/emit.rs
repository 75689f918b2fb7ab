use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use swc_ecma_ast::Module;
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::Emitter as CodegenEmitter;
use swc_ecma_quote::swc_common::comments::Comments;
use tr_core::{debug, info, warn, Error, Result};

use crate::program::{Program, SourceFile};
use crate::strip::strip_types;
use crate::TsConfig;

/// A module rewrite that runs on each emitted file before it is printed.
/// Hooks receive a copy of the module; the program itself is never mutated,
/// so span-keyed lookups into the checker keep working.
pub trait BeforeEmit {
    fn before_emit(&mut self, program: &Program, file: &SourceFile, module: Module)
        -> Result<Module>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitTarget {
    #[default]
    JavaScript,
    TypeScript,
}

impl fmt::Display for EmitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitTarget::JavaScript => write!(f, "javascript"),
            EmitTarget::TypeScript => write!(f, "typescript"),
        }
    }
}

impl FromStr for EmitTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(EmitTarget::JavaScript),
            "typescript" | "ts" => Ok(EmitTarget::TypeScript),
            other => Err(Error::config(format!("unknown emit target `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitOptions {
    pub target: EmitTarget,
    pub minify: bool,
    pub out_dir: Option<PathBuf>,
    pub root_dir: Option<PathBuf>,
    pub remove_comments: bool,
    /// Module format requested by the type configuration.
    pub module: Option<String>,
}

impl EmitOptions {
    pub fn from_config(config: &TsConfig) -> Self {
        let options = &config.compiler_options;
        Self {
            out_dir: options.out_dir.clone(),
            root_dir: options.root_dir.clone(),
            remove_comments: options.remove_comments,
            module: options.module.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmittedFile {
    pub source: PathBuf,
    pub path: PathBuf,
    pub code: String,
}

pub struct ProgramEmitter<'p> {
    program: &'p Program,
    options: EmitOptions,
}

impl<'p> ProgramEmitter<'p> {
    pub fn new(program: &'p Program, options: EmitOptions) -> Self {
        Self { program, options }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// JavaScript output keeps ES module syntax. Returns the requested
    /// format when it is one that is not produced.
    pub fn unsupported_module_format(&self) -> Option<&str> {
        if self.options.target != EmitTarget::JavaScript {
            return None;
        }
        let module = self.options.module.as_deref()?;
        let esm = module == "preserve" || module.starts_with("es") || module.starts_with("node");
        (!esm).then_some(module)
    }

    /// Runs `hooks` over every project file, then prints the results.
    ///
    /// All hooks finish before anything is printed: the code generator
    /// consumes the program's comments, which hooks may still need.
    pub fn emit(&self, hooks: &mut [&mut dyn BeforeEmit]) -> Result<Vec<EmittedFile>> {
        if let Some(module) = self.unsupported_module_format() {
            warn!(
                "compilerOptions.module is `{}`; output keeps ES module import/export syntax",
                module
            );
        }
        let root = self.root_dir();
        let mut transformed = Vec::new();
        for file in self.program.emitted_files() {
            let mut module = file.module.clone();
            for hook in hooks.iter_mut() {
                module = hook.before_emit(self.program, file, module)?;
            }
            transformed.push((file, module));
        }

        let mut emitted = Vec::with_capacity(transformed.len());
        for (file, module) in transformed {
            let module = match self.options.target {
                EmitTarget::JavaScript => strip_types(module)
                    .map_err(|err| Error::emit(format!("{}: {err}", file.path.display())))?,
                EmitTarget::TypeScript => module,
            };
            let code = self.print_module(&module)?;
            let path = self.output_path(&file.path, &root)?;
            debug!("emitted {} -> {}", file.path.display(), path.display());
            emitted.push(EmittedFile {
                source: file.path.clone(),
                path,
                code,
            });
        }
        Ok(emitted)
    }

    pub fn print_module(&self, module: &Module) -> Result<String> {
        let mut buf = Vec::new();
        {
            let mut cfg = swc_ecma_codegen::Config::default();
            cfg.minify = self.options.minify;
            let comments = if self.options.remove_comments {
                None
            } else {
                Some(self.program.comments() as &dyn Comments)
            };
            let cm = self.program.source_map().clone();
            let mut emitter = CodegenEmitter {
                cfg,
                cm: cm.clone(),
                comments,
                wr: JsWriter::new(cm, "\n", &mut buf, None),
            };
            emitter
                .emit_module(module)
                .map_err(|err| Error::emit(format!("failed to print module: {err}")))?;
        }
        String::from_utf8(buf).map_err(|err| Error::emit(err.to_string()))
    }

    /// Writes emitted files to disk, creating directories as needed.
    pub fn write(files: &[EmittedFile]) -> Result<()> {
        for file in files {
            if let Some(parent) = file.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&file.path, &file.code)?;
            info!("wrote {}", file.path.display());
        }
        Ok(())
    }

    fn root_dir(&self) -> PathBuf {
        if let Some(root) = &self.options.root_dir {
            return root.clone();
        }
        let mut dirs = self
            .program
            .emitted_files()
            .filter_map(|file| file.path.parent());
        let Some(first) = dirs.next() else {
            return PathBuf::from(".");
        };
        dirs.fold(first.to_path_buf(), |common, dir| common_ancestor(&common, dir))
    }

    fn output_path(&self, source: &Path, root: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::emit(format!("invalid file name {}", source.display())))?;
        let file_name = match self.options.target {
            EmitTarget::JavaScript => javascript_file_name(file_name),
            EmitTarget::TypeScript => file_name.to_string(),
        };

        let dir = match &self.options.out_dir {
            Some(out_dir) => {
                let parent = source.parent().unwrap_or(root);
                let relative = parent.strip_prefix(root).map_err(|_| {
                    Error::emit(format!(
                        "{} is not under the root directory {}",
                        source.display(),
                        root.display()
                    ))
                })?;
                out_dir.join(relative)
            }
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        let path = dir.join(file_name);
        if path == source {
            return Err(Error::emit(format!(
                "refusing to overwrite source file {}; set an output directory",
                source.display()
            )));
        }
        Ok(path)
    }
}

fn javascript_file_name(name: &str) -> String {
    for (from, to) in [(".tsx", ".js"), (".mts", ".mjs"), (".cts", ".cjs"), (".ts", ".js")] {
        if let Some(stem) = name.strip_suffix(from) {
            return format!("{stem}{to}");
        }
    }
    name.to_string()
}

fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}
