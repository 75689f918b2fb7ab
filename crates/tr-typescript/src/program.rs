use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use itertools::Itertools;
use swc_ecma_ast::Module;
use swc_ecma_quote::swc_common::comments::{CommentKind, Comments, SingleThreadedComments};
use swc_ecma_quote::swc_common::sync::Lrc;
use swc_ecma_quote::swc_common::{BytePos, SourceMap, Span};
use tr_core::{debug, Diagnostic, DiagnosticManager, Error, Location, Result};

use crate::binder::SymbolTable;
use crate::checker::TypeChecker;
use crate::config::TsConfig;
use crate::parser::{is_declaration_file, location_of, parse_module};
use crate::resolution::{collect_import_references, is_local_spec, ModuleResolver};
use crate::vfs::{FileSystem, InMemoryFileSystem, OsFileSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub module: Module,
    pub is_declaration: bool,
    /// Source files of the project proper, as opposed to declarations and
    /// anything under `node_modules`.
    pub emit: bool,
    imports: HashMap<String, FileId>,
}

impl SourceFile {
    /// File an import specifier of this file resolved to.
    pub fn import(&self, spec: &str) -> Option<FileId> {
        self.imports.get(spec).copied()
    }
}

/// A parsed, bound TypeScript program: the entry file and everything it
/// transitively imports.
pub struct Program {
    source_map: Lrc<SourceMap>,
    comments: SingleThreadedComments,
    config: TsConfig,
    files: Vec<SourceFile>,
    checker: TypeChecker,
    diagnostics: DiagnosticManager,
}

impl Program {
    pub fn load(entry: &Path, config: TsConfig) -> Result<Self> {
        Self::load_with(&OsFileSystem, entry, config)
    }

    pub fn load_with(fs: &dyn FileSystem, entry: &Path, config: TsConfig) -> Result<Self> {
        Loader::new(fs, config).run(entry)
    }

    /// Single-file program, mostly useful in tests.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> Result<Self> {
        let fs = InMemoryFileSystem::new().with_file(path.as_ref(), source);
        Self::load_with(&fs, path.as_ref(), TsConfig::default())
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    pub fn entry(&self) -> &SourceFile {
        &self.files[0]
    }

    pub fn emitted_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|file| file.emit)
    }

    pub fn checker(&self) -> &TypeChecker {
        &self.checker
    }

    pub fn config(&self) -> &TsConfig {
        &self.config
    }

    pub fn source_map(&self) -> &Lrc<SourceMap> {
        &self.source_map
    }

    pub fn comments(&self) -> &SingleThreadedComments {
        &self.comments
    }

    pub fn diagnostics(&self) -> &DiagnosticManager {
        &self.diagnostics
    }

    pub fn location(&self, span: Span) -> Location {
        location_of(&self.source_map, span)
    }

    /// Text of the JSDoc block attached at `pos`, without its tags.
    pub fn jsdoc(&self, pos: BytePos) -> Option<String> {
        let comments = self.comments.get_leading(pos)?;
        let doc = comments
            .iter()
            .rev()
            .find(|comment| comment.kind == CommentKind::Block && comment.text.starts_with('*'))?;
        let text = doc
            .text
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .take_while(|line| !line.starts_with('@'))
            .join("\n");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

struct Loader<'a> {
    fs: &'a dyn FileSystem,
    config: TsConfig,
    source_map: Lrc<SourceMap>,
    comments: SingleThreadedComments,
    diagnostics: DiagnosticManager,
}

impl<'a> Loader<'a> {
    fn new(fs: &'a dyn FileSystem, config: TsConfig) -> Self {
        Self {
            fs,
            config,
            source_map: Default::default(),
            comments: SingleThreadedComments::default(),
            diagnostics: DiagnosticManager::new(),
        }
    }

    fn run(self, entry: &Path) -> Result<Program> {
        let resolver = ModuleResolver::new(self.fs, self.config.compiler_options.base_url.clone());
        let entry = self.fs.canonicalize(entry);
        if !self.fs.is_file(&entry) {
            return Err(Error::Load {
                path: entry,
                message: "no such file".to_string(),
            });
        }

        let mut queue = vec![entry.clone()];
        let mut ids = HashMap::from([(entry, FileId(0))]);
        let mut files = Vec::new();

        while files.len() < queue.len() {
            let id = FileId(files.len());
            let path = queue[id.index()].clone();
            let source = self.fs.read_to_string(&path).map_err(|err| Error::Load {
                path: path.clone(),
                message: err.to_string(),
            })?;
            let module = parse_module(&self.source_map, &self.comments, &path, source)?;
            let is_declaration = is_declaration_file(&path);
            let in_node_modules = path
                .components()
                .any(|component| component == Component::Normal("node_modules".as_ref()));
            let follow_packages = !is_declaration && !in_node_modules;
            debug!("loaded {} as {}", path.display(), id);

            let mut imports = HashMap::new();
            for reference in collect_import_references(&module) {
                match resolver.resolve(&reference.spec, &path, follow_packages) {
                    Some(target) => {
                        let target_id = *ids.entry(target.clone()).or_insert_with(|| {
                            queue.push(target);
                            FileId(queue.len() - 1)
                        });
                        imports.insert(reference.spec, target_id);
                    }
                    None if follow_packages || is_local_spec(&reference.spec) => {
                        self.diagnostics.add_diagnostic(
                            Diagnostic::warning(format!(
                                "cannot resolve module '{}' imported from {}",
                                reference.spec,
                                path.display()
                            ))
                            .with_source_context("loader"),
                        );
                    }
                    None => {}
                }
            }

            files.push(SourceFile {
                id,
                path,
                module,
                is_declaration,
                emit: !is_declaration && !in_node_modules,
                imports,
            });
        }

        let checker = TypeChecker::new(SymbolTable::build(&files));
        Ok(Program {
            source_map: self.source_map,
            comments: self.comments,
            config: self.config,
            files,
            checker,
            diagnostics: self.diagnostics,
        })
    }
}
