//! Lowers a TypeScript module to plain JavaScript by erasing type syntax.
//!
//! Only erasure is performed. Constructs that need a runtime lowering
//! (enums, value namespaces, parameter properties, `import =`/`export =`)
//! are reported as emit errors instead.

use std::collections::HashSet;

use swc_ecma_ast::{
    BindingIdent, Class, ClassMember, ClassMethod, ClassProp, Constructor, Decl, DefaultDecl,
    ExportSpecifier, Expr, ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleItem,
    NamedExport, Param, ParamOrTsParamProp, Pat, PrivateProp, Stmt, TsModuleDecl,
    TsNamespaceBody, TsTypeAnn, TsTypeParamDecl, TsTypeParamInstantiation, VarDeclarator,
};
use swc_ecma_ast::{TsExprWithTypeArgs, TsInterfaceDecl, TsType, TsTypeAliasDecl};
use swc_ecma_visit::{Fold, FoldWith, Visit, VisitWith};
use tr_core::{Error, Result};

use crate::binder::export_name;

pub fn strip_types(module: Module) -> Result<Module> {
    let mut usage = ValueUsage::default();
    module.visit_with(&mut usage);
    let mut strip = TypeStrip {
        used: usage.names,
        type_names: local_type_names(&module),
        errors: Vec::new(),
    };
    let module = module.fold_with(&mut strip);
    match strip.errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(module),
    }
}

/// Identifiers referenced from value positions.
#[derive(Default)]
struct ValueUsage {
    names: HashSet<String>,
}

impl Visit for ValueUsage {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Ident(ident) = expr {
            self.names.insert(ident.sym.to_string());
        }
        expr.visit_children_with(self);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if export.src.is_none() {
            for specifier in &export.specifiers {
                if let ExportSpecifier::Named(named) = specifier {
                    self.names.insert(export_name(&named.orig));
                }
            }
        }
    }

    fn visit_ts_type(&mut self, _: &TsType) {}

    fn visit_ts_expr_with_type_args(&mut self, _: &TsExprWithTypeArgs) {}

    fn visit_ts_interface_decl(&mut self, _: &TsInterfaceDecl) {}

    fn visit_ts_type_alias_decl(&mut self, _: &TsTypeAliasDecl) {}
}

fn local_type_names(module: &Module) -> HashSet<String> {
    let mut names = HashSet::new();
    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::TsInterface(decl))) => {
                names.insert(decl.id.sym.to_string());
            }
            ModuleItem::Stmt(Stmt::Decl(Decl::TsTypeAlias(decl))) => {
                names.insert(decl.id.sym.to_string());
            }
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                for specifier in &import.specifiers {
                    let local = match specifier {
                        ImportSpecifier::Named(named) if import.type_only || named.is_type_only => {
                            &named.local
                        }
                        ImportSpecifier::Default(default) if import.type_only => &default.local,
                        ImportSpecifier::Namespace(ns) if import.type_only => &ns.local,
                        _ => continue,
                    };
                    names.insert(local.sym.to_string());
                }
            }
            _ => {}
        }
    }
    names
}

fn namespace_is_type_only(body: &TsNamespaceBody) -> bool {
    match body {
        TsNamespaceBody::TsModuleBlock(block) => block.body.iter().all(|item| match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl_is_type_only(decl),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                decl_is_type_only(&export.decl)
            }
            _ => false,
        }),
        TsNamespaceBody::TsNamespaceDecl(decl) => namespace_is_type_only(&decl.body),
    }
}

fn decl_is_type_only(decl: &Decl) -> bool {
    match decl {
        Decl::TsInterface(_) | Decl::TsTypeAlias(_) => true,
        Decl::TsModule(module) => module_is_type_only(module),
        _ => false,
    }
}

fn module_is_type_only(module: &TsModuleDecl) -> bool {
    module.declare || module.body.as_ref().map(namespace_is_type_only).unwrap_or(true)
}

struct TypeStrip {
    used: HashSet<String>,
    type_names: HashSet<String>,
    errors: Vec<Error>,
}

impl TypeStrip {
    fn unsupported(&mut self, what: &str) {
        self.errors.push(Error::emit(format!(
            "{what} cannot be emitted as JavaScript; use the typescript emit target"
        )));
    }

    /// Whether `decl` disappears entirely from JavaScript output.
    fn erase_decl(&mut self, decl: &Decl) -> bool {
        match decl {
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) => true,
            Decl::Var(var) => var.declare,
            Decl::Fn(fn_decl) => fn_decl.declare || fn_decl.function.body.is_none(),
            Decl::Class(class) => class.declare,
            Decl::TsEnum(decl) => {
                if !decl.declare {
                    self.unsupported(&format!("enum `{}`", decl.id.sym));
                }
                true
            }
            Decl::TsModule(module) => {
                if !module_is_type_only(module) {
                    self.unsupported("namespace declarations");
                }
                true
            }
            _ => false,
        }
    }

    fn elide_import(&self, mut import: ImportDecl) -> Option<ImportDecl> {
        if import.type_only {
            return None;
        }
        if import.specifiers.is_empty() {
            return Some(import);
        }
        import.specifiers.retain(|specifier| match specifier {
            ImportSpecifier::Named(named) => {
                !named.is_type_only && self.used.contains(&*named.local.sym)
            }
            ImportSpecifier::Default(default) => self.used.contains(&*default.local.sym),
            ImportSpecifier::Namespace(ns) => self.used.contains(&*ns.local.sym),
        });
        (!import.specifiers.is_empty()).then_some(import)
    }

    fn strip_named_export(&self, mut export: NamedExport) -> Option<NamedExport> {
        if export.type_only {
            return None;
        }
        let had_specifiers = !export.specifiers.is_empty();
        let local = export.src.is_none();
        export.specifiers.retain(|specifier| match specifier {
            ExportSpecifier::Named(named) => {
                !named.is_type_only
                    && !(local && self.type_names.contains(&export_name(&named.orig)))
            }
            _ => true,
        });
        if had_specifiers && export.specifiers.is_empty() {
            None
        } else {
            Some(export)
        }
    }

    fn strip_module_item(&mut self, item: ModuleItem) -> Option<ModuleItem> {
        let decl = match item {
            ModuleItem::Stmt(stmt) => return self.strip_stmt(stmt).map(ModuleItem::Stmt),
            ModuleItem::ModuleDecl(decl) => decl,
        };
        let decl = match decl {
            ModuleDecl::Import(import) => ModuleDecl::Import(self.elide_import(import)?),
            ModuleDecl::ExportDecl(export) => {
                if self.erase_decl(&export.decl) {
                    return None;
                }
                ModuleDecl::ExportDecl(export)
            }
            ModuleDecl::ExportNamed(export) => {
                ModuleDecl::ExportNamed(self.strip_named_export(export)?)
            }
            ModuleDecl::ExportDefaultDecl(export)
                if matches!(export.decl, DefaultDecl::TsInterfaceDecl(_)) =>
            {
                return None
            }
            ModuleDecl::ExportAll(export) if export.type_only => return None,
            ModuleDecl::TsImportEquals(import) if import.is_type_only => return None,
            ModuleDecl::TsImportEquals(_) => {
                self.unsupported("`import = require()`");
                return None;
            }
            ModuleDecl::TsExportAssignment(_) => {
                self.unsupported("`export =`");
                return None;
            }
            ModuleDecl::TsNamespaceExport(_) => return None,
            other => other,
        };
        Some(ModuleItem::ModuleDecl(decl))
    }

    fn strip_stmt(&mut self, stmt: Stmt) -> Option<Stmt> {
        match &stmt {
            Stmt::Decl(decl) if self.erase_decl(decl) => None,
            _ => Some(stmt),
        }
    }
}

impl Fold for TypeStrip {
    fn fold_module_items(&mut self, items: Vec<ModuleItem>) -> Vec<ModuleItem> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(item) = self.strip_module_item(item) {
                out.push(item.fold_with(self));
            }
        }
        out
    }

    fn fold_stmts(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            if let Some(stmt) = self.strip_stmt(stmt) {
                out.push(stmt.fold_with(self));
            }
        }
        out
    }

    fn fold_expr(&mut self, expr: Expr) -> Expr {
        let inner = match expr {
            Expr::TsAs(expr) => expr.expr,
            Expr::TsTypeAssertion(expr) => expr.expr,
            Expr::TsNonNull(expr) => expr.expr,
            Expr::TsSatisfies(expr) => expr.expr,
            Expr::TsConstAssertion(expr) => expr.expr,
            Expr::TsInstantiation(expr) => expr.expr,
            other => return other.fold_children_with(self),
        };
        self.fold_expr(*inner)
    }

    fn fold_opt_ts_type_ann(&mut self, _: Option<Box<TsTypeAnn>>) -> Option<Box<TsTypeAnn>> {
        None
    }

    fn fold_opt_ts_type_param_decl(
        &mut self,
        _: Option<Box<TsTypeParamDecl>>,
    ) -> Option<Box<TsTypeParamDecl>> {
        None
    }

    fn fold_opt_ts_type_param_instantiation(
        &mut self,
        _: Option<Box<TsTypeParamInstantiation>>,
    ) -> Option<Box<TsTypeParamInstantiation>> {
        None
    }

    fn fold_binding_ident(&mut self, mut ident: BindingIdent) -> BindingIdent {
        ident.id.optional = false;
        ident.type_ann = None;
        ident
    }

    fn fold_params(&mut self, params: Vec<Param>) -> Vec<Param> {
        params
            .into_iter()
            .filter(|param| !matches!(&param.pat, Pat::Ident(binding) if &*binding.id.sym == "this"))
            .map(|param| param.fold_with(self))
            .collect()
    }

    fn fold_class(&mut self, class: Class) -> Class {
        let mut class = class.fold_children_with(self);
        class.implements.clear();
        class.is_abstract = false;
        class
    }

    fn fold_class_members(&mut self, members: Vec<ClassMember>) -> Vec<ClassMember> {
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let keep = match &member {
                ClassMember::TsIndexSignature(_) => false,
                ClassMember::ClassProp(prop) => !prop.declare && !prop.is_abstract,
                ClassMember::Method(method) => {
                    !method.is_abstract && method.function.body.is_some()
                }
                ClassMember::PrivateMethod(method) => method.function.body.is_some(),
                ClassMember::Constructor(ctor) => ctor.body.is_some(),
                _ => true,
            };
            if keep {
                out.push(member.fold_with(self));
            }
        }
        out
    }

    fn fold_class_prop(&mut self, prop: ClassProp) -> ClassProp {
        let mut prop = prop.fold_children_with(self);
        prop.accessibility = None;
        prop.is_optional = false;
        prop.is_override = false;
        prop.readonly = false;
        prop.definite = false;
        prop
    }

    fn fold_private_prop(&mut self, prop: PrivateProp) -> PrivateProp {
        let mut prop = prop.fold_children_with(self);
        prop.is_optional = false;
        prop.readonly = false;
        prop.definite = false;
        prop
    }

    fn fold_class_method(&mut self, method: ClassMethod) -> ClassMethod {
        let mut method = method.fold_children_with(self);
        method.accessibility = None;
        method.is_optional = false;
        method.is_override = false;
        method
    }

    fn fold_constructor(&mut self, ctor: Constructor) -> Constructor {
        if ctor
            .params
            .iter()
            .any(|param| matches!(param, ParamOrTsParamProp::TsParamProp(_)))
        {
            self.unsupported("constructor parameter properties");
        }
        let mut ctor = ctor.fold_children_with(self);
        ctor.accessibility = None;
        ctor
    }

    fn fold_var_declarator(&mut self, decl: VarDeclarator) -> VarDeclarator {
        let mut decl = decl.fold_children_with(self);
        decl.definite = false;
        decl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use crate::emit::{EmitOptions, EmitTarget, ProgramEmitter};
    use tr_core::ErrorKind;

    fn to_js(source: &str) -> Result<String> {
        let program = Program::from_source("/app/main.ts", source)?;
        let emitter = ProgramEmitter::new(
            &program,
            EmitOptions {
                target: EmitTarget::JavaScript,
                ..Default::default()
            },
        );
        let module = strip_types(program.entry().module.clone())?;
        emitter.print_module(&module)
    }

    #[test]
    fn erases_annotations_and_type_declarations() {
        let js = to_js(
            "interface Query { a: string }\n\
             type Alias = Query;\n\
             const n: number = 1 as any;\n\
             const m = n satisfies number;\n\
             function f<T>(this: Window, x?: T): T { return x!; }\n\
             export { n, f, Alias };",
        )
        .unwrap();
        assert!(!js.contains("interface"));
        assert!(!js.contains("Alias"));
        assert!(!js.contains(": number"));
        assert!(js.contains("const n = 1"));
        assert!(js.contains("function f(x)"));
        assert!(js.contains("const m = n"));
        assert!(js.contains("n, f"));
    }

    #[test]
    fn elides_imports_only_used_as_types() {
        let js = to_js(
            "import fastify, { FastifyInstance } from 'fastify';\n\
             import type { Query } from './types';\n\
             import './side-effect';\n\
             const server: FastifyInstance = fastify();",
        )
        .unwrap();
        assert!(js.contains("import fastify from 'fastify'") || js.contains("import fastify from \"fastify\""));
        assert!(!js.contains("FastifyInstance"));
        assert!(!js.contains("./types"));
        assert!(js.contains("side-effect"));
    }

    #[test]
    fn runtime_constructs_are_rejected() {
        let err = to_js("enum Color { Red }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Emit);
        let err = to_js("class A { constructor(private x: number) {} }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Emit);
        assert!(to_js("declare enum Ambient { A }\nnamespace Types { export interface T {} }").is_ok());
    }
}
