use std::path::{Path, PathBuf};

use serde::Deserialize;
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem, TsModuleRef};

use crate::vfs::FileSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportReferenceKind {
    Import,
    ReExportAll,
    ReExportNamed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReference {
    pub spec: String,
    pub is_type_only: bool,
    pub kind: ImportReferenceKind,
}

/// Every module specifier a file depends on, including type-only imports:
/// route contracts are usually imported with `import type`.
pub fn collect_import_references(module: &Module) -> Vec<ImportReference> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(ImportReference {
                spec: import.src.value.to_string(),
                is_type_only: import.type_only,
                kind: ImportReferenceKind::Import,
            }),
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) => Some(ImportReference {
                spec: export.src.value.to_string(),
                is_type_only: export.type_only,
                kind: ImportReferenceKind::ReExportAll,
            }),
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => {
                named.src.as_ref().map(|src| ImportReference {
                    spec: src.value.to_string(),
                    is_type_only: named.type_only,
                    kind: ImportReferenceKind::ReExportNamed,
                })
            }
            ModuleItem::ModuleDecl(ModuleDecl::TsImportEquals(import)) => match &import.module_ref {
                TsModuleRef::TsExternalModuleRef(external) => Some(ImportReference {
                    spec: external.expr.value.to_string(),
                    is_type_only: import.is_type_only,
                    kind: ImportReferenceKind::Import,
                }),
                TsModuleRef::TsEntityName(_) => None,
            },
            _ => None,
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    types: Option<String>,
    typings: Option<String>,
}

/// Maps module specifiers to files, the way `tsc` does for the subset of
/// module resolution this tool needs.
pub struct ModuleResolver<'a> {
    fs: &'a dyn FileSystem,
    base_url: Option<PathBuf>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, base_url: Option<PathBuf>) -> Self {
        Self { fs, base_url }
    }

    /// Resolves `spec` imported from `from`. Package specifiers are only
    /// followed when `follow_packages` is set; declaration files never pull
    /// in further packages.
    pub fn resolve(&self, spec: &str, from: &Path, follow_packages: bool) -> Option<PathBuf> {
        let spec = strip_query_fragment(spec);
        let base_dir = from.parent().unwrap_or_else(|| Path::new("."));

        if is_local_spec(spec) {
            return self.resolve_file(&base_dir.join(spec.trim_end_matches('/')));
        }

        if let Some(base_url) = &self.base_url {
            if let Some(found) = self.resolve_file(&base_url.join(spec)) {
                return Some(found);
            }
        }

        if follow_packages {
            return self.resolve_package(spec, base_dir);
        }
        None
    }

    fn resolve_file(&self, target: &Path) -> Option<PathBuf> {
        candidate_import_paths(target)
            .into_iter()
            .find(|candidate| self.fs.is_file(candidate))
            .map(|candidate| self.fs.canonicalize(&candidate))
    }

    fn resolve_package(&self, spec: &str, base_dir: &Path) -> Option<PathBuf> {
        let (package, subpath) = split_package_spec(spec);
        for dir in base_dir.ancestors() {
            let node_modules = dir.join("node_modules");
            let roots = [
                node_modules.join(package),
                node_modules.join("@types").join(types_package_name(package)),
            ];
            for root in roots {
                let found = match subpath {
                    Some(subpath) => self.resolve_declaration(&root.join(subpath)),
                    None => self
                        .package_types_entry(&root)
                        .or_else(|| self.resolve_declaration(&root.join("index"))),
                };
                if found.is_some() {
                    return found;
                }
            }
        }
        None
    }

    fn package_types_entry(&self, root: &Path) -> Option<PathBuf> {
        let manifest = self.fs.read_to_string(&root.join("package.json")).ok()?;
        let manifest: PackageJson = serde_json::from_str(&manifest).ok()?;
        let entry = manifest.types.or(manifest.typings)?;
        let entry = root.join(entry);
        if self.fs.is_file(&entry) {
            return Some(self.fs.canonicalize(&entry));
        }
        self.resolve_declaration(&entry)
    }

    fn resolve_declaration(&self, target: &Path) -> Option<PathBuf> {
        [
            append_extension(target, "d.ts"),
            append_extension(target, "ts"),
            target.join("index.d.ts"),
        ]
        .into_iter()
        .find(|candidate| self.fs.is_file(candidate))
        .map(|candidate| self.fs.canonicalize(&candidate))
    }
}

fn candidate_import_paths(base: &Path) -> Vec<PathBuf> {
    const FILE_EXTS: &[&str] = &["ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs"];
    const INDEX_FILES: &[&str] = &[
        "index.ts",
        "index.tsx",
        "index.d.ts",
        "index.mts",
        "index.cts",
        "index.js",
        "index.jsx",
        "index.mjs",
    ];

    let mut candidates = Vec::new();

    if let Some(ext) = base.extension().and_then(|ext| ext.to_str()) {
        match ext.to_ascii_lowercase().as_str() {
            "js" | "jsx" => {
                candidates.push(base.with_extension("ts"));
                candidates.push(base.with_extension("tsx"));
                candidates.push(base.with_extension("d.ts"));
            }
            "mjs" => candidates.push(base.with_extension("mts")),
            "cjs" => candidates.push(base.with_extension("cts")),
            _ => {}
        }
    }
    candidates.push(base.to_path_buf());

    for ext in FILE_EXTS {
        candidates.push(append_extension(base, ext));
    }
    for index in INDEX_FILES {
        candidates.push(base.join(index));
    }

    candidates
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn strip_query_fragment(spec: &str) -> &str {
    spec.split(['?', '#']).next().unwrap_or(spec)
}

pub fn is_local_spec(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../") || spec.starts_with('/')
}

fn split_package_spec(spec: &str) -> (&str, Option<&str>) {
    let mut boundary = spec.match_indices('/').map(|(idx, _)| idx);
    let split_at = if spec.starts_with('@') {
        boundary.nth(1)
    } else {
        boundary.next()
    };
    match split_at {
        Some(idx) => (&spec[..idx], Some(&spec[idx + 1..])),
        None => (spec, None),
    }
}

/// `@scope/name` typings live in `@types/scope__name`.
fn types_package_name(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => package.to_string(),
    }
}
