//! Scope analysis over the loaded modules.
//!
//! The binder records, for every file, which declaration each identifier
//! expression refers to, which class a `this` expression belongs to, what the
//! file exports, and every named type declaration. Nodes are keyed by their
//! span: all files share one source map, so spans are unique program-wide.

use std::collections::{HashMap, HashSet};

use swc_ecma_ast::{
    ArrowExpr, BlockStmt, CatchClause, Class, ClassDecl, ClassExpr, ClassMethod, Constructor, Decl,
    DefaultDecl, ExportDecl, ExportSpecifier, Expr, FnExpr, ForInStmt, ForOfStmt, ForStmt,
    Function, ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleExportName, ModuleItem,
    ObjectPatProp, ParamOrTsParamProp, Pat, PrivateMethod, Stmt, ThisExpr, TsEnumDecl,
    TsInterfaceDecl, TsModuleBlock, TsModuleDecl, TsModuleRef, TsParamPropParam, TsType,
    TsTypeAliasDecl, TsTypeAnn, VarDecl, VarDeclarator,
};
use swc_ecma_quote::swc_common::{BytePos, Span};
use swc_ecma_visit::{Visit, VisitWith};

use crate::program::{FileId, SourceFile};

pub type SpanKey = (BytePos, BytePos);

pub fn span_key(span: Span) -> SpanKey {
    (span.lo, span.hi)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

#[derive(Debug, Clone)]
pub enum BindingKind {
    Variable {
        type_ann: Option<Box<TsType>>,
        init: Option<Box<Expr>>,
    },
    Parameter {
        type_ann: Option<Box<TsType>>,
    },
    Function {
        return_type: Option<Box<TsType>>,
    },
    Class {
        name: String,
    },
    Enum,
    Import {
        source: Option<FileId>,
        imported: ImportedName,
    },
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub file: FileId,
    pub kind: BindingKind,
}

#[derive(Debug, Clone)]
pub enum ExportTarget {
    Binding(BindingId),
    /// `export default <expr>` and `export = <expr>`.
    Expr(Box<Expr>),
    Reexport { source: FileId, name: String },
}

#[derive(Debug, Clone, Default)]
pub struct FileExports {
    pub named: HashMap<String, ExportTarget>,
    pub default: Option<ExportTarget>,
    pub stars: Vec<FileId>,
}

#[derive(Debug, Clone)]
pub enum TypeDeclKind {
    Interface(Box<TsInterfaceDecl>),
    Alias(Box<TsTypeAliasDecl>),
    Enum(Box<TsEnumDecl>),
    Class(Box<Class>),
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub file: FileId,
    pub span: Span,
    /// Position leading comments (JSDoc) are attached to.
    pub doc_pos: BytePos,
    pub exported: bool,
    pub kind: TypeDeclKind,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    bindings: Vec<Binding>,
    references: HashMap<SpanKey, BindingId>,
    this_classes: HashMap<SpanKey, String>,
    exports: Vec<FileExports>,
    declaration_files: HashSet<FileId>,
    type_decls: Vec<TypeDecl>,
    types_by_name: HashMap<String, Vec<usize>>,
}

impl SymbolTable {
    pub fn build(files: &[SourceFile]) -> Self {
        let mut table = SymbolTable {
            exports: vec![FileExports::default(); files.len()],
            ..Default::default()
        };
        for file in files {
            if file.is_declaration {
                table.declaration_files.insert(file.id);
            }
            let mut binder = Binder::new(&mut table, file);
            file.module.visit_with(&mut binder);
        }
        table
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn reference(&self, span: Span) -> Option<BindingId> {
        self.references.get(&span_key(span)).copied()
    }

    pub fn this_class(&self, span: Span) -> Option<&str> {
        self.this_classes.get(&span_key(span)).map(String::as_str)
    }

    pub fn exports(&self, file: FileId) -> &FileExports {
        &self.exports[file.index()]
    }

    pub fn is_declaration_file(&self, file: FileId) -> bool {
        self.declaration_files.contains(&file)
    }

    pub fn type_decls(&self) -> &[TypeDecl] {
        &self.type_decls
    }

    pub fn types_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a TypeDecl> + Clone + 'a {
        self.types_by_name
            .get(name)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |idx| &self.type_decls[*idx])
    }
}

/// Names and annotations introduced by a binding pattern.
pub fn pat_bindings(pat: &Pat) -> Vec<(String, Option<Box<TsType>>)> {
    match pat {
        Pat::Ident(binding) => vec![(
            binding.id.sym.to_string(),
            annotation(&binding.type_ann),
        )],
        Pat::Array(array) => array.elems.iter().flatten().flat_map(pat_bindings).collect(),
        Pat::Object(object) => object
            .props
            .iter()
            .flat_map(|prop| match prop {
                ObjectPatProp::KeyValue(kv) => pat_bindings(&kv.value),
                ObjectPatProp::Assign(assign) => vec![(assign.key.sym.to_string(), None)],
                ObjectPatProp::Rest(rest) => pat_bindings(&rest.arg),
            })
            .collect(),
        Pat::Assign(assign) => pat_bindings(&assign.left),
        Pat::Rest(rest) => pat_bindings(&rest.arg),
        Pat::Invalid(_) | Pat::Expr(_) => Vec::new(),
    }
}

pub fn annotation(ann: &Option<Box<TsTypeAnn>>) -> Option<Box<TsType>> {
    ann.as_ref().map(|ann| ann.type_ann.clone())
}

pub fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

struct Binder<'a> {
    table: &'a mut SymbolTable,
    file: &'a SourceFile,
    scopes: Vec<HashMap<String, BindingId>>,
    this_stack: Vec<Option<String>>,
    next_function_is_method: bool,
    export_pos: Option<BytePos>,
    ambient_depth: usize,
    local_exports: HashSet<String>,
}

impl<'a> Binder<'a> {
    fn new(table: &'a mut SymbolTable, file: &'a SourceFile) -> Self {
        Self {
            table,
            file,
            scopes: Vec::new(),
            this_stack: Vec::new(),
            next_function_is_method: false,
            export_pos: None,
            ambient_depth: 0,
            local_exports: HashSet::new(),
        }
    }

    fn add_binding(&mut self, name: &str, kind: BindingKind) -> BindingId {
        let id = BindingId(self.table.bindings.len());
        self.table.bindings.push(Binding {
            name: name.to_string(),
            file: self.file.id,
            kind,
        });
        id
    }

    fn declare(&mut self, name: &str, kind: BindingKind) -> BindingId {
        let id = self.add_binding(name, kind);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        id
    }

    fn declared_here(&self, name: &str) -> Option<BindingId> {
        self.scopes.last().and_then(|scope| scope.get(name).copied())
    }

    fn lookup(&self, name: &str) -> Option<BindingId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn declare_pat(&mut self, pat: &Pat) {
        for (name, type_ann) in pat_bindings(pat) {
            self.declare(&name, BindingKind::Parameter { type_ann });
        }
    }

    fn declare_var(&mut self, decl: &VarDeclarator) -> Vec<(String, BindingId)> {
        match &decl.name {
            Pat::Ident(binding) => {
                let name = binding.id.sym.to_string();
                let id = self.declare(
                    &name,
                    BindingKind::Variable {
                        type_ann: annotation(&binding.type_ann),
                        init: decl.init.clone(),
                    },
                );
                vec![(name, id)]
            }
            pat => pat_bindings(pat)
                .into_iter()
                .map(|(name, type_ann)| {
                    let id = self.declare(&name, BindingKind::Variable { type_ann, init: None });
                    (name, id)
                })
                .collect(),
        }
    }

    fn hoist_decl(&mut self, decl: &Decl) -> Vec<(String, BindingId)> {
        match decl {
            Decl::Var(var) => var
                .decls
                .iter()
                .flat_map(|decl| self.declare_var(decl))
                .collect(),
            Decl::Fn(fn_decl) => {
                let name = fn_decl.ident.sym.to_string();
                // overloads: the first signature with a return type wins
                if let Some(existing) = self.declared_here(&name) {
                    if let BindingKind::Function {
                        return_type: Some(_),
                    } = self.table.binding(existing).kind
                    {
                        return vec![(name, existing)];
                    }
                }
                let id = self.declare(
                    &name,
                    BindingKind::Function {
                        return_type: annotation(&fn_decl.function.return_type),
                    },
                );
                vec![(name, id)]
            }
            Decl::Class(class) => {
                let name = class.ident.sym.to_string();
                let id = self.declare(&name, BindingKind::Class { name: name.clone() });
                vec![(name, id)]
            }
            Decl::TsEnum(decl) => {
                let name = decl.id.sym.to_string();
                let id = self.declare(&name, BindingKind::Enum);
                vec![(name, id)]
            }
            _ => Vec::new(),
        }
    }

    fn hoist_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Decl(decl) = stmt {
                self.hoist_decl(decl);
            }
        }
    }

    fn declare_imports(&mut self, import: &ImportDecl) {
        let source = self.file.import(&import.src.value);
        for specifier in &import.specifiers {
            let (local, imported) = match specifier {
                ImportSpecifier::Named(named) => (
                    &named.local,
                    ImportedName::Named(
                        named
                            .imported
                            .as_ref()
                            .map(export_name)
                            .unwrap_or_else(|| named.local.sym.to_string()),
                    ),
                ),
                ImportSpecifier::Default(default) => (&default.local, ImportedName::Default),
                ImportSpecifier::Namespace(namespace) => {
                    (&namespace.local, ImportedName::Namespace)
                }
            };
            self.declare(&local.sym, BindingKind::Import { source, imported });
        }
    }

    fn hoist_module_items(&mut self, items: &[ModuleItem]) {
        let file_id = self.file.id.index();
        for item in items {
            match item {
                ModuleItem::Stmt(stmt) => self.hoist_stmts(std::slice::from_ref(stmt)),
                ModuleItem::ModuleDecl(decl) => match decl {
                    ModuleDecl::Import(import) => self.declare_imports(import),
                    ModuleDecl::ExportDecl(export) => {
                        for (name, id) in self.hoist_decl(&export.decl) {
                            self.table.exports[file_id]
                                .named
                                .insert(name, ExportTarget::Binding(id));
                        }
                    }
                    ModuleDecl::ExportDefaultDecl(export) => {
                        let id = match &export.decl {
                            DefaultDecl::Fn(fn_expr) => {
                                let kind = BindingKind::Function {
                                    return_type: annotation(&fn_expr.function.return_type),
                                };
                                match &fn_expr.ident {
                                    Some(ident) => self.declare(&ident.sym, kind),
                                    None => self.add_binding("default", kind),
                                }
                            }
                            DefaultDecl::Class(class_expr) => match &class_expr.ident {
                                Some(ident) => self.declare(
                                    &ident.sym,
                                    BindingKind::Class {
                                        name: ident.sym.to_string(),
                                    },
                                ),
                                None => self.add_binding(
                                    "default",
                                    BindingKind::Class {
                                        name: "default".to_string(),
                                    },
                                ),
                            },
                            DefaultDecl::TsInterfaceDecl(_) => continue,
                        };
                        self.table.exports[file_id].default = Some(ExportTarget::Binding(id));
                    }
                    ModuleDecl::ExportDefaultExpr(export) => {
                        self.table.exports[file_id].default =
                            Some(ExportTarget::Expr(export.expr.clone()));
                    }
                    ModuleDecl::TsExportAssignment(export) => {
                        self.table.exports[file_id].default =
                            Some(ExportTarget::Expr(export.expr.clone()));
                    }
                    ModuleDecl::ExportAll(export) => {
                        if let Some(source) = self.file.import(&export.src.value) {
                            self.table.exports[file_id].stars.push(source);
                        }
                    }
                    ModuleDecl::TsImportEquals(import) => {
                        if let TsModuleRef::TsExternalModuleRef(external) = &import.module_ref {
                            let source = self.file.import(&external.expr.value);
                            self.declare(
                                &import.id.sym,
                                BindingKind::Import {
                                    source,
                                    imported: ImportedName::Default,
                                },
                            );
                        }
                    }
                    _ => {}
                },
            }
        }

        // named exports may refer to declarations further down the file
        for item in items {
            let ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) = item else {
                continue;
            };
            for specifier in &named.specifiers {
                let ExportSpecifier::Named(specifier) = specifier else {
                    continue;
                };
                let orig = export_name(&specifier.orig);
                let exported = specifier
                    .exported
                    .as_ref()
                    .map(export_name)
                    .unwrap_or_else(|| orig.clone());
                let target = match &named.src {
                    Some(src) => self
                        .file
                        .import(&src.value)
                        .map(|source| ExportTarget::Reexport { source, name: orig }),
                    None => {
                        self.local_exports.insert(orig.clone());
                        self.lookup(&orig).map(ExportTarget::Binding)
                    }
                };
                if let Some(target) = target {
                    let exports = &mut self.table.exports[file_id];
                    if exported == "default" {
                        exports.default = Some(target.clone());
                    }
                    exports.named.insert(exported, target);
                }
            }
        }
    }

    fn record_type_decl(&mut self, name: &str, span: Span, kind: TypeDeclKind) {
        let exported = self.export_pos.is_some()
            || self.ambient_depth > 0
            || self.file.is_declaration
            || self.local_exports.contains(name);
        let idx = self.table.type_decls.len();
        self.table.type_decls.push(TypeDecl {
            name: name.to_string(),
            file: self.file.id,
            span,
            doc_pos: self.export_pos.unwrap_or(span.lo),
            exported,
            kind,
        });
        self.table
            .types_by_name
            .entry(name.to_string())
            .or_default()
            .push(idx);
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }
}

impl Visit for Binder<'_> {
    fn visit_module(&mut self, module: &Module) {
        self.with_scope(|this| {
            this.hoist_module_items(&module.body);
            module.visit_children_with(this);
        });
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.with_scope(|this| {
            this.hoist_stmts(&block.stmts);
            block.visit_children_with(this);
        });
    }

    fn visit_ts_module_decl(&mut self, decl: &TsModuleDecl) {
        self.ambient_depth += 1;
        decl.visit_children_with(self);
        self.ambient_depth -= 1;
    }

    fn visit_ts_module_block(&mut self, block: &TsModuleBlock) {
        self.with_scope(|this| {
            for item in &block.body {
                match item {
                    ModuleItem::Stmt(Stmt::Decl(decl)) => {
                        this.hoist_decl(decl);
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                        this.hoist_decl(&export.decl);
                    }
                    _ => {}
                }
            }
            block.visit_children_with(this);
        });
    }

    fn visit_var_decl(&mut self, var: &VarDecl) {
        for decl in &var.decls {
            let names = pat_bindings(&decl.name);
            if names
                .iter()
                .any(|(name, _)| self.declared_here(name).is_none())
            {
                self.declare_var(decl);
            }
        }
        var.visit_children_with(self);
    }

    fn visit_function(&mut self, function: &Function) {
        let is_method = std::mem::take(&mut self.next_function_is_method);
        if !is_method {
            self.this_stack.push(None);
        }
        self.with_scope(|this| {
            for param in &function.params {
                this.declare_pat(&param.pat);
            }
            function.params.visit_with(this);
            if let Some(body) = &function.body {
                body.visit_with(this);
            }
        });
        if !is_method {
            self.this_stack.pop();
        }
    }

    fn visit_fn_expr(&mut self, fn_expr: &FnExpr) {
        match &fn_expr.ident {
            Some(ident) => self.with_scope(|this| {
                this.declare(
                    &ident.sym,
                    BindingKind::Function {
                        return_type: annotation(&fn_expr.function.return_type),
                    },
                );
                fn_expr.function.visit_with(this);
            }),
            None => fn_expr.function.visit_with(self),
        }
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.with_scope(|this| {
            for param in &arrow.params {
                this.declare_pat(param);
            }
            arrow.params.visit_with(this);
            arrow.body.visit_with(this);
        });
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        self.with_scope(|this| {
            for param in &ctor.params {
                match param {
                    ParamOrTsParamProp::Param(param) => this.declare_pat(&param.pat),
                    ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                        TsParamPropParam::Ident(binding) => {
                            this.declare(
                                &binding.id.sym,
                                BindingKind::Parameter {
                                    type_ann: annotation(&binding.type_ann),
                                },
                            );
                        }
                        TsParamPropParam::Assign(assign) => this.declare_pat(&assign.left),
                    },
                }
            }
            ctor.params.visit_with(this);
            if let Some(body) = &ctor.body {
                body.visit_with(this);
            }
        });
    }

    fn visit_class_method(&mut self, method: &ClassMethod) {
        method.key.visit_with(self);
        self.next_function_is_method = true;
        method.function.visit_with(self);
    }

    fn visit_private_method(&mut self, method: &PrivateMethod) {
        self.next_function_is_method = true;
        method.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        let name = decl.ident.sym.to_string();
        self.record_type_decl(&name, decl.class.span, TypeDeclKind::Class(decl.class.clone()));
        self.this_stack.push(Some(name));
        decl.class.visit_with(self);
        self.this_stack.pop();
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        match &expr.ident {
            Some(ident) => {
                let name = ident.sym.to_string();
                self.with_scope(|this| {
                    this.declare(&name, BindingKind::Class { name: name.clone() });
                    this.this_stack.push(Some(name.clone()));
                    expr.class.visit_with(this);
                    this.this_stack.pop();
                });
            }
            None => {
                self.this_stack.push(None);
                expr.class.visit_with(self);
                self.this_stack.pop();
            }
        }
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.with_scope(|this| {
            if let Some(param) = &clause.param {
                this.declare_pat(param);
            }
            clause.body.visit_with(this);
        });
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Ident(ident) = expr {
            if let Some(id) = self.lookup(&ident.sym) {
                self.table.references.insert(span_key(ident.span), id);
            }
        }
        expr.visit_children_with(self);
    }

    fn visit_this_expr(&mut self, this: &ThisExpr) {
        if let Some(Some(class)) = self.this_stack.last() {
            self.table
                .this_classes
                .insert(span_key(this.span), class.clone());
        }
    }

    fn visit_export_decl(&mut self, export: &ExportDecl) {
        let outer = self.export_pos.replace(export.span.lo);
        export.visit_children_with(self);
        self.export_pos = outer;
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        self.record_type_decl(
            &decl.id.sym,
            decl.span,
            TypeDeclKind::Interface(Box::new(decl.clone())),
        );
        let outer = self.export_pos.take();
        decl.visit_children_with(self);
        self.export_pos = outer;
    }

    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        self.record_type_decl(
            &decl.id.sym,
            decl.span,
            TypeDeclKind::Alias(Box::new(decl.clone())),
        );
        let outer = self.export_pos.take();
        decl.visit_children_with(self);
        self.export_pos = outer;
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        self.record_type_decl(
            &decl.id.sym,
            decl.span,
            TypeDeclKind::Enum(Box::new(decl.clone())),
        );
        let outer = self.export_pos.take();
        decl.visit_children_with(self);
        self.export_pos = outer;
    }
}

#[cfg(test)]
mod tests {
    use crate::program::Program;
    use swc_ecma_ast::{Expr, ModuleItem, Stmt};

    use super::*;

    fn last_expr(program: &Program) -> &Expr {
        let module = &program.entry().module;
        match module.body.last() {
            Some(ModuleItem::Stmt(Stmt::Expr(stmt))) => &stmt.expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn inner_scopes_shadow_module_bindings() {
        let program = Program::from_source(
            "main.ts",
            "const server = 1;\nfunction f(server: string) { server; }\nserver;",
        )
        .unwrap();
        let symbols = program.checker().symbols();
        let Expr::Ident(ident) = last_expr(&program) else {
            panic!("expected identifier");
        };
        let id = symbols.reference(ident.span).unwrap();
        assert!(matches!(
            symbols.binding(id).kind,
            BindingKind::Variable { .. }
        ));
    }

    #[test]
    fn records_exports_and_type_declarations() {
        let program = Program::from_source(
            "main.ts",
            "interface Hidden { a: string }\n\
             export interface Shown { b: number }\n\
             type Later = { c: boolean };\n\
             export { Later };\n\
             export const value = 1;\n\
             export default value;",
        )
        .unwrap();
        let symbols = program.checker().symbols();
        let exported: Vec<(&str, bool)> = symbols
            .type_decls()
            .iter()
            .map(|decl| (decl.name.as_str(), decl.exported))
            .collect();
        assert_eq!(
            exported,
            vec![("Hidden", false), ("Shown", true), ("Later", true)]
        );

        let exports = symbols.exports(program.entry().id);
        assert!(exports.named.contains_key("value"));
        assert!(!exports.named.contains_key("Later"));
        assert!(matches!(exports.default, Some(ExportTarget::Expr(_))));
    }

    #[test]
    fn this_inside_methods_refers_to_the_class() {
        let program = Program::from_source(
            "main.ts",
            "class App { start() { return this; } helper() { return function () { return this; }; } }",
        )
        .unwrap();
        let symbols = program.checker().symbols();
        let classes: Vec<&str> = symbols.this_classes.values().map(String::as_str).collect();
        assert_eq!(classes, vec!["App"]);
    }
}
