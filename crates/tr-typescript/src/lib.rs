//! TypeScript front end: loading a program from its entry file, binding and
//! querying declared types, and printing modules back out.

pub mod binder;
pub mod checker;
pub mod config;
pub mod emit;
pub mod parser;
pub mod program;
pub mod resolution;
pub mod strip;
pub mod vfs;

pub use binder::{SymbolTable, TypeDecl, TypeDeclKind};
pub use checker::{entity_name, prop_key_name, TypeChecker};
pub use config::{CompilerOptions, TsConfig};
pub use emit::{BeforeEmit, EmitOptions, EmitTarget, EmittedFile, ProgramEmitter};
pub use program::{FileId, Program, SourceFile};
pub use resolution::{collect_import_references, ImportReference, ImportReferenceKind};
pub use vfs::{FileSystem, InMemoryFileSystem, OsFileSystem};
