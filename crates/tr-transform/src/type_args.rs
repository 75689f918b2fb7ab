use std::fmt;

use swc_ecma_ast::{
    CallExpr, TsEntityName, TsKeywordTypeKind, TsType, TsTypeRef, TsUnionOrIntersectionType,
};
use tr_core::{Error, Result};

use crate::matcher::ROUTE_TYPE_ARITY;

/// The four named types of a route call, in positional order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTypeArgs {
    pub query: String,
    pub params: String,
    pub body: String,
    pub headers: String,
}

impl RouteTypeArgs {
    pub const SLOTS: [&'static str; ROUTE_TYPE_ARITY] = ["query", "params", "body", "headers"];

    pub fn from_call(call: &CallExpr) -> Result<Self> {
        let args = call
            .type_args
            .as_ref()
            .map(|args| args.params.as_slice())
            .unwrap_or_default();
        let [query, params, body, headers] = args else {
            return Err(Error::type_argument(format!(
                "a call with {} type argument(s)",
                args.len()
            )));
        };
        Ok(Self {
            query: type_argument_name(query)?,
            params: type_argument_name(params)?,
            body: type_argument_name(body)?,
            headers: type_argument_name(headers)?,
        })
    }

    pub fn names(&self) -> [&str; ROUTE_TYPE_ARITY] {
        [&self.query, &self.params, &self.body, &self.headers]
    }

    /// Slot name paired with the type name, in positional order.
    pub fn slots(&self) -> impl Iterator<Item = (&'static str, &str)> {
        Self::SLOTS.into_iter().zip(self.names())
    }
}

impl fmt::Display for RouteTypeArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.query, self.params, self.body, self.headers
        )
    }
}

/// Name of a directly referenced named type. Type arguments of the reference
/// itself are ignored.
pub fn type_argument_name(ty: &TsType) -> Result<String> {
    match ty {
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            ..
        }) => Ok(ident.sym.to_string()),
        other => Err(Error::type_argument(shape_name(other))),
    }
}

fn shape_name(ty: &TsType) -> String {
    let shape = match ty {
        TsType::TsTypeRef(_) => "a qualified type name",
        TsType::TsKeywordType(keyword) => {
            return format!("the `{}` keyword", keyword_name(keyword.kind));
        }
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(_)) => {
            "a union type"
        }
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(_)) => {
            "an intersection type"
        }
        TsType::TsLitType(_) => "a literal type",
        TsType::TsTypeLit(_) => "an object type literal",
        TsType::TsArrayType(_) => "an array type",
        TsType::TsTupleType(_) => "a tuple type",
        TsType::TsFnOrConstructorType(_) => "a function type",
        TsType::TsParenthesizedType(_) => "a parenthesized type",
        TsType::TsTypeQuery(_) => "a `typeof` query",
        _ => "an unsupported type expression",
    };
    shape.to_string()
}

fn keyword_name(kind: TsKeywordTypeKind) -> &'static str {
    use TsKeywordTypeKind::*;
    match kind {
        TsAnyKeyword => "any",
        TsUnknownKeyword => "unknown",
        TsNumberKeyword => "number",
        TsObjectKeyword => "object",
        TsBooleanKeyword => "boolean",
        TsBigIntKeyword => "bigint",
        TsStringKeyword => "string",
        TsSymbolKeyword => "symbol",
        TsVoidKeyword => "void",
        TsUndefinedKeyword => "undefined",
        TsNullKeyword => "null",
        TsNeverKeyword => "never",
        TsIntrinsicKeyword => "intrinsic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{Decl, ModuleItem, Stmt};
    use tr_core::ErrorKind;
    use tr_typescript::Program;

    fn alias_type(source: &str) -> TsType {
        let program = Program::from_source("/app/types.ts", source).unwrap();
        match program.entry().module.body.first() {
            Some(ModuleItem::Stmt(Stmt::Decl(Decl::TsTypeAlias(alias)))) => {
                (*alias.type_ann).clone()
            }
            other => panic!("expected a type alias, found {other:?}"),
        }
    }

    #[test]
    fn plain_references_resolve_to_their_name() {
        assert_eq!(type_argument_name(&alias_type("type T = Query;")).unwrap(), "Query");
        assert_eq!(
            type_argument_name(&alias_type("type T = Page<Item>;")).unwrap(),
            "Page"
        );
    }

    #[test]
    fn other_shapes_are_rejected() {
        for source in [
            "type T = A | B;",
            "type T = A & B;",
            "type T = { a: string };",
            "type T = 'x';",
            "type T = string;",
            "type T = ns.Query;",
            "type T = Query[];",
        ] {
            let err = type_argument_name(&alias_type(source)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TypeArgument, "{source}");
        }
        let err = type_argument_name(&alias_type("type T = A | B;")).unwrap_err();
        assert_eq!(err.to_string(), "cannot identify the type name of a union type");
    }
}
