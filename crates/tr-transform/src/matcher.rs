//! Recognition of route registration calls.
//!
//! The check is a heuristic: cheap structural tests run first and the
//! receiver's static type is consulted last. A receiver matches when its type
//! is a reference *named* like the expected instance type, whatever that
//! declaration actually is.

use swc_ecma_ast::{CallExpr, Callee, Expr, MemberProp, TsEntityName, TsType, TsTypeRef};
use tr_typescript::TypeChecker;

pub const ROUTE_METHODS: [&str; 8] = [
    "delete", "get", "head", "patch", "post", "put", "options", "all",
];

/// Number of type arguments a route call carries: query, params, body and
/// headers.
pub const ROUTE_TYPE_ARITY: usize = 4;

pub fn is_route_method(name: &str) -> bool {
    ROUTE_METHODS.contains(&name)
}

/// Receiver and method name of a `<receiver>.<method>(..)` call.
pub fn member_call(call: &CallExpr) -> Option<(&Expr, &str)> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = &**callee else {
        return None;
    };
    let MemberProp::Ident(method) = &member.prop else {
        return None;
    };
    Some((&*member.obj, &*method.sym))
}

pub fn is_route_call(call: &CallExpr, checker: &TypeChecker, receiver_type: &str) -> bool {
    let arity = call.type_args.as_ref().map_or(0, |args| args.params.len());
    if arity != ROUTE_TYPE_ARITY {
        return false;
    }
    let Some((receiver, method)) = member_call(call) else {
        return false;
    };
    if !is_route_method(method) {
        return false;
    }
    let Some(ty) = checker.type_of_expr(receiver) else {
        return false;
    };
    names_type(&checker.type_to_type_node(&ty), receiver_type)
}

fn names_type(ty: &TsType, name: &str) -> bool {
    matches!(
        ty,
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            ..
        }) if &*ident.sym == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_ast::{ExprStmt, ModuleItem, Stmt};
    use tr_typescript::Program;

    const PRELUDE: &str = "interface FastifyInstance { get(path: string, handler: any): void }\n\
                           interface OtherInstance { get(path: string, handler: any): void }\n\
                           declare const server: FastifyInstance;\n\
                           declare const other: OtherInstance;\n";

    fn last_call(program: &Program) -> &CallExpr {
        let items = &program.entry().module.body;
        match items.last() {
            Some(ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. }))) => match &**expr {
                Expr::Call(call) => call,
                other => panic!("expected a call, found {other:?}"),
            },
            other => panic!("expected an expression statement, found {other:?}"),
        }
    }

    fn matches(call_source: &str) -> bool {
        let source = format!("{PRELUDE}{call_source}");
        let program = Program::from_source("/app/server.ts", &source).unwrap();
        is_route_call(last_call(&program), program.checker(), "FastifyInstance")
    }

    #[test]
    fn four_type_arguments_on_the_instance_match() {
        assert!(matches("server.get<Q, P, B, H>('/ping', h);"));
        assert!(matches("server.all<Q, P, B, H>('/ping', h);"));
    }

    #[test]
    fn other_arities_are_ignored() {
        assert!(!matches("server.get<Q, P, B>('/ping', h);"));
        assert!(!matches("server.get<Q, P, B, H, X>('/ping', h);"));
        assert!(!matches("server.get('/ping', h);"));
    }

    #[test]
    fn method_names_are_case_sensitive() {
        assert!(!matches("server.GET<Q, P, B, H>('/ping', h);"));
        assert!(!matches("server.route<Q, P, B, H>('/ping', h);"));
        assert!(!matches("server['get']<Q, P, B, H>('/ping', h);"));
    }

    #[test]
    fn receiver_type_is_compared_by_name() {
        assert!(!matches("other.get<Q, P, B, H>('/ping', h);"));
        assert!(!matches("unknownThing.get<Q, P, B, H>('/ping', h);"));

        let source = format!("{PRELUDE}other.get<Q, P, B, H>('/ping', h);");
        let program = Program::from_source("/app/server.ts", &source).unwrap();
        assert!(is_route_call(
            last_call(&program),
            program.checker(),
            "OtherInstance"
        ));
    }

    #[test]
    fn method_set_is_closed() {
        for method in ROUTE_METHODS {
            assert!(is_route_method(method));
        }
        assert!(!is_route_method("Get"));
        assert!(!is_route_method("route"));
    }
}
