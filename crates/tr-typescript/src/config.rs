//! `tsconfig.json` loading.
//!
//! The file is read with a JSON5 parser so comments and trailing commas are
//! accepted the way `tsc` accepts them. Only the compiler options that
//! influence loading and emission are kept.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tr_core::{Error, Result};

use crate::vfs::{normalize_path, FileSystem, OsFileSystem};

const MAX_EXTENDS_DEPTH: usize = 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub out_dir: Option<PathBuf>,
    pub root_dir: Option<PathBuf>,
    pub base_url: Option<PathBuf>,
    pub remove_comments: bool,
    /// `compilerOptions.module`, lowercased.
    pub module: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    out_dir: Option<String>,
    root_dir: Option<String>,
    base_url: Option<String>,
    remove_comments: Option<bool>,
    module: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    extends: Option<String>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

/// Type configuration for a program. Paths are absolute (resolved against
/// the directory of the file that declared them).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsConfig {
    pub path: Option<PathBuf>,
    pub compiler_options: CompilerOptions,
}

impl TsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(&OsFileSystem, path)
    }

    pub fn load_with(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let path = fs.canonicalize(path);
        let mut chain = Vec::new();
        let mut current = path.clone();
        loop {
            if chain.len() >= MAX_EXTENDS_DEPTH {
                return Err(Error::config(format!(
                    "{}: `extends` chain is too deep or cyclic",
                    path.display()
                )));
            }
            let raw = read_raw(fs, &current)?;
            let dir = parent_dir(&current);
            let next = raw
                .extends
                .as_deref()
                .map(|spec| resolve_extends(fs, &dir, spec))
                .transpose()?;
            chain.push((dir, raw.compiler_options));
            match next {
                Some(next) => current = next,
                None => break,
            }
        }

        let mut options = CompilerOptions::default();
        // the base config comes last in the chain and is applied first
        for (dir, raw) in chain.into_iter().rev() {
            options.apply(&dir, raw);
        }
        Ok(Self {
            path: Some(path),
            compiler_options: options,
        })
    }

    /// Parses a config document that does not live on disk. Relative paths
    /// resolve against `dir`; `extends` is not followed.
    pub fn parse(source: &str, dir: &Path) -> Result<Self> {
        let raw: RawTsConfig = json5::from_str(source)
            .map_err(|err| Error::config(format!("invalid tsconfig: {err}")))?;
        let mut options = CompilerOptions::default();
        options.apply(dir, raw.compiler_options);
        Ok(Self {
            path: None,
            compiler_options: options,
        })
    }

    /// Directory the config lives in, used as the default project root.
    pub fn dir(&self) -> Option<PathBuf> {
        self.path.as_deref().map(parent_dir)
    }
}

impl CompilerOptions {
    fn apply(&mut self, dir: &Path, raw: RawCompilerOptions) {
        let resolve = |value: String| normalize_path(&dir.join(value));
        if let Some(out_dir) = raw.out_dir {
            self.out_dir = Some(resolve(out_dir));
        }
        if let Some(root_dir) = raw.root_dir {
            self.root_dir = Some(resolve(root_dir));
        }
        if let Some(base_url) = raw.base_url {
            self.base_url = Some(resolve(base_url));
        }
        if let Some(remove_comments) = raw.remove_comments {
            self.remove_comments = remove_comments;
        }
        if let Some(module) = raw.module {
            self.module = Some(module.to_ascii_lowercase());
        }
    }
}

fn read_raw(fs: &dyn FileSystem, path: &Path) -> Result<RawTsConfig> {
    let content = fs.read_to_string(path).map_err(|err| {
        Error::config(format!("failed to read {}: {err}", path.display()))
    })?;
    json5::from_str(&content)
        .map_err(|err| Error::config(format!("failed to parse {}: {err}", path.display())))
}

fn resolve_extends(fs: &dyn FileSystem, dir: &Path, spec: &str) -> Result<PathBuf> {
    let with_json = |path: PathBuf| {
        if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            path
        } else {
            PathBuf::from(format!("{}.json", path.display()))
        }
    };

    let candidates: Vec<PathBuf> = if spec.starts_with('.') || Path::new(spec).is_absolute() {
        vec![with_json(dir.join(spec))]
    } else {
        dir.ancestors()
            .map(|ancestor| with_json(ancestor.join("node_modules").join(spec)))
            .collect()
    };

    candidates
        .into_iter()
        .find(|candidate| fs.is_file(candidate))
        .map(|candidate| fs.canonicalize(&candidate))
        .ok_or_else(|| {
            Error::config(format!(
                "cannot resolve `extends: \"{spec}\"` from {}",
                dir.display()
            ))
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
