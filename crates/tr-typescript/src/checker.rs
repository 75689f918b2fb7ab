//! Type queries over the bound program.
//!
//! This is not a full type checker: it answers "what is the declared type of
//! this expression" by following annotations, initializers, imports and
//! declared return types. Anything it cannot see through yields `None`.

use swc_ecma_ast::{
    Callee, ClassMember, Expr, Ident, Lit, MemberProp, ParamOrTsParamProp, PropName,
    TsEntityName, TsFnOrConstructorType, TsParamPropParam, TsType, TsTypeElement, TsTypeRef,
    TsUnionOrIntersectionType,
};
use swc_ecma_quote::swc_common::DUMMY_SP;

use crate::binder::{
    annotation, BindingId, BindingKind, ExportTarget, ImportedName, SymbolTable, TypeDecl,
    TypeDeclKind,
};
use crate::program::FileId;

const MAX_DEPTH: usize = 32;

enum Member {
    Property(Option<Box<TsType>>),
    Initializer(Box<Expr>),
    Method(Option<Box<TsType>>),
}

enum Resolved<'a> {
    Binding(BindingId),
    Expr(&'a Expr),
}

pub struct TypeChecker {
    symbols: SymbolTable,
}

impl TypeChecker {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Declared type of `expr`, as written at its declaration.
    pub fn type_of_expr(&self, expr: &Expr) -> Option<TsType> {
        self.infer(expr, 0)
    }

    /// Canonical type node for a type: plain aliases of another reference are
    /// followed, and qualified names are rendered by their final identifier
    /// (`fastify.FastifyInstance` becomes `FastifyInstance`).
    pub fn type_to_type_node(&self, ty: &TsType) -> TsType {
        self.render(ty, 0)
    }

    /// The declaration a type name refers to. Declarations in source files
    /// take precedence over ambient ones.
    pub fn find_type_decl(&self, name: &str) -> Option<&TypeDecl> {
        let mut candidates = self.symbols.types_named(name);
        candidates
            .clone()
            .find(|decl| !self.symbols.is_declaration_file(decl.file))
            .or_else(|| candidates.next())
    }

    /// Every declaration sharing the name of `decl` and its kind, for
    /// interface merging.
    pub fn merged_decls<'a>(&'a self, decl: &'a TypeDecl) -> Vec<&'a TypeDecl> {
        match decl.kind {
            TypeDeclKind::Interface(_) => self
                .symbols
                .types_named(&decl.name)
                .filter(|other| {
                    matches!(other.kind, TypeDeclKind::Interface(_))
                        && self.symbols.is_declaration_file(other.file)
                            == self.symbols.is_declaration_file(decl.file)
                })
                .collect(),
            _ => vec![decl],
        }
    }

    /// Declared type of property `name` on a value of type `owner`.
    pub fn member_type(&self, owner: &TsType, name: &str) -> Option<TsType> {
        self.member_value(owner, name, 0)
    }

    fn infer(&self, expr: &Expr, depth: usize) -> Option<TsType> {
        if depth > MAX_DEPTH {
            return None;
        }
        let depth = depth + 1;
        match expr {
            Expr::Ident(ident) => {
                let id = self.symbols.reference(ident.span)?;
                self.binding_type(id, depth)
            }
            Expr::Paren(paren) => self.infer(&paren.expr, depth),
            Expr::TsAs(expr) => Some((*expr.type_ann).clone()),
            Expr::TsTypeAssertion(expr) => Some((*expr.type_ann).clone()),
            Expr::TsSatisfies(expr) => self.infer(&expr.expr, depth),
            Expr::TsNonNull(expr) => self.infer(&expr.expr, depth),
            Expr::TsConstAssertion(expr) => self.infer(&expr.expr, depth),
            Expr::New(new) => self.constructed_type(&new.callee).map(|name| type_ref(&name)),
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => self.call_result(callee, depth),
                _ => None,
            },
            Expr::Await(await_expr) => self.infer(&await_expr.arg, depth).map(unwrap_promise),
            Expr::Member(member) => match &member.prop {
                MemberProp::Ident(prop) => {
                    let owner = self.infer(&member.obj, depth)?;
                    self.member_value(&owner, &prop.sym, depth)
                }
                _ => None,
            },
            Expr::This(this) => self.symbols.this_class(this.span).map(type_ref),
            Expr::Seq(seq) => seq.exprs.last().and_then(|last| self.infer(last, depth)),
            Expr::Assign(assign) => self.infer(&assign.right, depth),
            _ => None,
        }
    }

    fn binding_type(&self, id: BindingId, depth: usize) -> Option<TsType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match &self.symbols.binding(id).kind {
            BindingKind::Variable {
                type_ann: Some(ty), ..
            }
            | BindingKind::Parameter { type_ann: Some(ty) } => Some((**ty).clone()),
            BindingKind::Variable {
                init: Some(init), ..
            } => self.infer(init, depth + 1),
            BindingKind::Import {
                source: Some(source),
                imported,
            } => match self.resolve_import(*source, imported, depth)? {
                Resolved::Binding(id) => self.binding_type(id, depth + 1),
                Resolved::Expr(expr) => self.infer(expr, depth + 1),
            },
            _ => None,
        }
    }

    fn resolve_import(
        &self,
        source: FileId,
        imported: &ImportedName,
        depth: usize,
    ) -> Option<Resolved<'_>> {
        match imported {
            ImportedName::Default => {
                let target = self.symbols.exports(source).default.as_ref()?;
                self.resolve_export_target(target, depth)
            }
            ImportedName::Named(name) => self.resolve_named_export(source, name, depth),
            ImportedName::Namespace => None,
        }
    }

    fn resolve_named_export(&self, file: FileId, name: &str, depth: usize) -> Option<Resolved<'_>> {
        if depth > MAX_DEPTH {
            return None;
        }
        let exports = self.symbols.exports(file);
        if let Some(target) = exports.named.get(name) {
            return self.resolve_export_target(target, depth);
        }
        exports
            .stars
            .iter()
            .find_map(|star| self.resolve_named_export(*star, name, depth + 1))
    }

    fn resolve_export_target<'a>(
        &'a self,
        target: &'a ExportTarget,
        depth: usize,
    ) -> Option<Resolved<'a>> {
        match target {
            ExportTarget::Binding(id) => Some(Resolved::Binding(*id)),
            ExportTarget::Expr(expr) => Some(Resolved::Expr(expr)),
            ExportTarget::Reexport { source, name } if name == "default" => {
                self.resolve_import(*source, &ImportedName::Default, depth + 1)
            }
            ExportTarget::Reexport { source, name } => {
                self.resolve_named_export(*source, name, depth + 1)
            }
        }
    }

    fn constructed_type(&self, callee: &Expr) -> Option<String> {
        match callee {
            Expr::Ident(ident) => {
                let class_name = self.symbols.reference(ident.span).and_then(|id| {
                    match &self.symbols.binding(id).kind {
                        BindingKind::Class { name } => Some(name.clone()),
                        BindingKind::Import {
                            source: Some(source),
                            imported,
                        } => match self.resolve_import(*source, imported, 0)? {
                            Resolved::Binding(id) => match &self.symbols.binding(id).kind {
                                BindingKind::Class { name } => Some(name.clone()),
                                _ => None,
                            },
                            Resolved::Expr(_) => None,
                        },
                        _ => None,
                    }
                });
                Some(class_name.unwrap_or_else(|| ident.sym.to_string()))
            }
            Expr::Member(member) => match &member.prop {
                MemberProp::Ident(prop) => Some(prop.sym.to_string()),
                _ => None,
            },
            Expr::Paren(paren) => self.constructed_type(&paren.expr),
            _ => None,
        }
    }

    fn call_result(&self, callee: &Expr, depth: usize) -> Option<TsType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match callee {
            Expr::Paren(paren) => self.call_result(&paren.expr, depth + 1),
            Expr::Ident(ident) => {
                let id = self.symbols.reference(ident.span)?;
                self.binding_call_result(id, depth + 1)
            }
            Expr::Member(member) => match &member.prop {
                MemberProp::Ident(prop) => {
                    let owner = self.infer(&member.obj, depth + 1)?;
                    self.method_return(&owner, &prop.sym, depth + 1)
                }
                _ => None,
            },
            other => {
                let ty = self.infer(other, depth + 1)?;
                self.fn_return(&ty, depth + 1)
            }
        }
    }

    fn binding_call_result(&self, id: BindingId, depth: usize) -> Option<TsType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match &self.symbols.binding(id).kind {
            BindingKind::Function { return_type } => return_type.as_deref().cloned(),
            BindingKind::Variable {
                type_ann: Some(ty), ..
            }
            | BindingKind::Parameter { type_ann: Some(ty) } => self.fn_return(ty, depth + 1),
            BindingKind::Variable {
                init: Some(init), ..
            } => self.expr_call_result(init, depth + 1),
            BindingKind::Import {
                source: Some(source),
                imported,
            } => match self.resolve_import(*source, imported, depth)? {
                Resolved::Binding(id) => self.binding_call_result(id, depth + 1),
                Resolved::Expr(expr) => self.expr_call_result(expr, depth + 1),
            },
            _ => None,
        }
    }

    fn expr_call_result(&self, expr: &Expr, depth: usize) -> Option<TsType> {
        match expr {
            Expr::Arrow(arrow) => annotation(&arrow.return_type).map(|ty| *ty),
            Expr::Fn(fn_expr) => annotation(&fn_expr.function.return_type).map(|ty| *ty),
            Expr::Paren(paren) => self.expr_call_result(&paren.expr, depth + 1),
            other => self.call_result(other, depth + 1),
        }
    }

    fn fn_return(&self, ty: &TsType, depth: usize) -> Option<TsType> {
        if depth > MAX_DEPTH {
            return None;
        }
        match ty {
            TsType::TsFnOrConstructorType(TsFnOrConstructorType::TsFnType(fn_type)) => {
                Some((*fn_type.type_ann.type_ann).clone())
            }
            TsType::TsParenthesizedType(paren) => self.fn_return(&paren.type_ann, depth + 1),
            TsType::TsTypeLit(lit) => call_signature(&lit.members),
            TsType::TsTypeRef(reference) => {
                let decl = self.find_type_decl(&entity_name(&reference.type_name))?;
                match &decl.kind {
                    TypeDeclKind::Alias(alias) => self.fn_return(&alias.type_ann, depth + 1),
                    TypeDeclKind::Interface(interface) => call_signature(&interface.body.body),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn member_value(&self, owner: &TsType, name: &str, depth: usize) -> Option<TsType> {
        match self.find_member(owner, name, depth)? {
            Member::Property(ty) => ty.map(|ty| *ty),
            Member::Initializer(init) => self.infer(&init, depth + 1),
            Member::Method(_) => None,
        }
    }

    fn method_return(&self, owner: &TsType, name: &str, depth: usize) -> Option<TsType> {
        match self.find_member(owner, name, depth)? {
            Member::Method(ret) => ret.map(|ty| *ty),
            Member::Property(Some(ty)) => self.fn_return(&ty, depth + 1),
            Member::Initializer(init) => self.expr_call_result(&init, depth + 1),
            Member::Property(None) => None,
        }
    }

    fn find_member(&self, owner: &TsType, name: &str, depth: usize) -> Option<Member> {
        if depth > MAX_DEPTH {
            return None;
        }
        let depth = depth + 1;
        match owner {
            TsType::TsParenthesizedType(paren) => self.find_member(&paren.type_ann, name, depth),
            TsType::TsTypeLit(lit) => element_member(&lit.members, name),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => intersection
                .types
                .iter()
                .find_map(|ty| self.find_member(ty, name, depth)),
            TsType::TsTypeRef(reference) => {
                let decl = self.find_type_decl(&entity_name(&reference.type_name))?;
                match &decl.kind {
                    TypeDeclKind::Interface(_) => {
                        let decls = self.merged_decls(decl);
                        decls.iter().find_map(|decl| {
                            let TypeDeclKind::Interface(interface) = &decl.kind else {
                                return None;
                            };
                            element_member(&interface.body.body, name).or_else(|| {
                                interface.extends.iter().find_map(|heritage| {
                                    let parent = expr_type_name(&heritage.expr)?;
                                    self.find_member(&type_ref(&parent), name, depth)
                                })
                            })
                        })
                    }
                    TypeDeclKind::Class(class) => {
                        class_member(&class.body, name).or_else(|| {
                            let parent = expr_type_name(class.super_class.as_deref()?)?;
                            self.find_member(&type_ref(&parent), name, depth)
                        })
                    }
                    TypeDeclKind::Alias(alias) => self.find_member(&alias.type_ann, name, depth),
                    TypeDeclKind::Enum(_) => None,
                }
            }
            _ => None,
        }
    }

    fn render(&self, ty: &TsType, depth: usize) -> TsType {
        match ty {
            TsType::TsParenthesizedType(paren) => self.render(&paren.type_ann, depth + 1),
            TsType::TsTypeRef(reference) => {
                let name = entity_name(&reference.type_name);
                if depth < MAX_DEPTH && reference.type_params.is_none() {
                    if let Some(TypeDeclKind::Alias(alias)) =
                        self.find_type_decl(&name).map(|decl| &decl.kind)
                    {
                        let plain = matches!(
                            &*alias.type_ann,
                            TsType::TsTypeRef(_) | TsType::TsParenthesizedType(_)
                        );
                        if alias.type_params.is_none() && plain {
                            return self.render(&alias.type_ann, depth + 1);
                        }
                    }
                }
                TsType::TsTypeRef(TsTypeRef {
                    span: reference.span,
                    type_name: TsEntityName::Ident(Ident::new(name.into(), reference.span)),
                    type_params: reference.type_params.clone(),
                })
            }
            other => other.clone(),
        }
    }
}

/// Final identifier of a possibly qualified name.
pub fn entity_name(name: &TsEntityName) -> String {
    match name {
        TsEntityName::Ident(ident) => ident.sym.to_string(),
        TsEntityName::TsQualifiedName(qualified) => qualified.right.sym.to_string(),
    }
}

pub fn type_ref(name: &str) -> TsType {
    TsType::TsTypeRef(TsTypeRef {
        span: DUMMY_SP,
        type_name: TsEntityName::Ident(Ident::new(name.into(), DUMMY_SP)),
        type_params: None,
    })
}

pub fn prop_key_name(key: &Expr) -> Option<String> {
    match key {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Lit(Lit::Num(n)) => Some(n.value.to_string()),
        _ => None,
    }
}

pub fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

fn expr_type_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => Some(prop.sym.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn unwrap_promise(ty: TsType) -> TsType {
    if let TsType::TsTypeRef(reference) = &ty {
        let name = entity_name(&reference.type_name);
        if name == "Promise" || name == "PromiseLike" {
            if let Some(params) = &reference.type_params {
                if let [inner] = params.params.as_slice() {
                    return (**inner).clone();
                }
            }
        }
    }
    ty
}

fn call_signature(elements: &[TsTypeElement]) -> Option<TsType> {
    elements.iter().find_map(|element| match element {
        TsTypeElement::TsCallSignatureDecl(signature) => {
            annotation(&signature.type_ann).map(|ty| *ty)
        }
        _ => None,
    })
}

fn element_member(elements: &[TsTypeElement], name: &str) -> Option<Member> {
    elements.iter().find_map(|element| match element {
        TsTypeElement::TsPropertySignature(prop)
            if prop_key_name(&prop.key).as_deref() == Some(name) =>
        {
            Some(Member::Property(annotation(&prop.type_ann)))
        }
        TsTypeElement::TsMethodSignature(method)
            if prop_key_name(&method.key).as_deref() == Some(name) =>
        {
            Some(Member::Method(annotation(&method.type_ann)))
        }
        _ => None,
    })
}

fn class_member(members: &[ClassMember], name: &str) -> Option<Member> {
    members.iter().find_map(|member| match member {
        ClassMember::ClassProp(prop)
            if !prop.is_static && prop_name(&prop.key).as_deref() == Some(name) =>
        {
            match (&prop.type_ann, &prop.value) {
                (None, Some(value)) => Some(Member::Initializer(value.clone())),
                (type_ann, _) => Some(Member::Property(annotation(type_ann))),
            }
        }
        ClassMember::Method(method)
            if !method.is_static && prop_name(&method.key).as_deref() == Some(name) =>
        {
            Some(Member::Method(annotation(&method.function.return_type)))
        }
        ClassMember::Constructor(ctor) => ctor.params.iter().find_map(|param| match param {
            ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                TsParamPropParam::Ident(binding) if &*binding.id.sym == name => {
                    Some(Member::Property(annotation(&binding.type_ann)))
                }
                _ => None,
            },
            ParamOrTsParamProp::Param(_) => None,
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use swc_ecma_ast::{ModuleItem, Stmt};

    use super::*;
    use crate::program::Program;
    use crate::vfs::InMemoryFileSystem;
    use crate::TsConfig;
    use std::path::Path;

    fn last_expr_type(program: &Program) -> Option<String> {
        let module = &program.entry().module;
        let expr = match module.body.last() {
            Some(ModuleItem::Stmt(Stmt::Expr(stmt))) => &stmt.expr,
            other => panic!("expected expression statement, got {other:?}"),
        };
        let checker = program.checker();
        checker
            .type_of_expr(expr)
            .map(|ty| render_name(&checker.type_to_type_node(&ty)))
    }

    fn render_name(ty: &TsType) -> String {
        match ty {
            TsType::TsTypeRef(reference) => entity_name(&reference.type_name),
            other => format!("{other:?}"),
        }
    }

    fn infer(source: &str) -> Option<String> {
        let program = Program::from_source("main.ts", source).unwrap();
        last_expr_type(&program)
    }

    #[test]
    fn follows_annotations_and_initializers() {
        assert_eq!(
            infer("interface App {}\nconst a: App = {} as any;\nconst b = a;\nb;"),
            Some("App".to_string())
        );
        assert_eq!(
            infer("class App {}\nconst a = new App();\n(a as App);"),
            Some("App".to_string())
        );
        assert_eq!(infer("const a = 1;\na;"), None);
    }

    #[test]
    fn follows_calls_awaits_and_members() {
        assert_eq!(
            infer(
                "interface App {}\n\
                 declare function create(): Promise<App>;\n\
                 async function main() { const app = await create(); return app; }\n\
                 declare const holder: { app: App };\n\
                 holder.app;"
            ),
            Some("App".to_string())
        );
        assert_eq!(
            infer("class Server { constructor(private app: Api) {} run() { return this.app; } }\ninterface Api {}\nconst s = new Server(null!);\ns.app;"),
            Some("Api".to_string())
        );
    }

    #[test]
    fn qualified_names_and_aliases_render_as_the_target_name() {
        assert_eq!(
            infer("declare namespace fastify { interface FastifyInstance {} }\ndeclare const s: fastify.FastifyInstance;\ns;"),
            Some("FastifyInstance".to_string())
        );
        assert_eq!(
            infer("interface FastifyInstance {}\ntype Server = FastifyInstance;\ndeclare const s: Server;\ns;"),
            Some("FastifyInstance".to_string())
        );
    }

    #[test]
    fn resolves_imported_factories_through_export_assignment() {
        let fs = InMemoryFileSystem::new()
            .with_file(
                "/app/node_modules/fastify/package.json",
                r#"{ "types": "index.d.ts" }"#,
            )
            .with_file(
                "/app/node_modules/fastify/index.d.ts",
                "interface FastifyInstance { get(path: string): FastifyInstance }\n\
                 declare function fastify(): FastifyInstance;\n\
                 export = fastify;",
            )
            .with_file(
                "/app/server.ts",
                "import fastify from 'fastify';\nconst server = fastify();\nserver;",
            );
        let program =
            Program::load_with(&fs, Path::new("/app/server.ts"), TsConfig::default()).unwrap();
        assert_eq!(last_expr_type(&program), Some("FastifyInstance".to_string()));
    }
}
