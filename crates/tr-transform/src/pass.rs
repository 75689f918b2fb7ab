use std::mem;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use swc_ecma_ast::{CallExpr, Expr, ExprOrSpread, Lit, Module};
use swc_ecma_visit::{Fold, FoldWith};
use tr_core::{debug, info, Error, Result, Value, ValueMap};
use tr_jsonschema::SchemaResolver;
use tr_typescript::{BeforeEmit, Program, SourceFile};

use crate::literal::{LiteralSynthesizer, SequenceMode};
use crate::matcher::{is_route_call, member_call};
use crate::type_args::RouteTypeArgs;

/// What to do when a matched route call cannot be rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failing call.
    #[default]
    Abort,
    /// Keep walking and report every failing call together.
    Collect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Receiver type name route calls are recognised by.
    pub receiver_type: String,
    pub sequence_literals: SequenceMode,
    pub on_error: ErrorPolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            receiver_type: "FastifyInstance".to_string(),
            sequence_literals: SequenceMode::Array,
            on_error: ErrorPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub method: String,
    /// Route path when it is written as a plain string.
    pub path: Option<String>,
    pub types: RouteTypeArgs,
}

#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub routes: Vec<RouteMatch>,
}

impl PassReport {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Injects `{schema: {query, params, body, headers}}` into every route call
/// of the modules it is run on.
///
/// With [`ErrorPolicy::Collect`] failing calls are left as they are and the
/// failures are held until [`RouteSchemaPass::finish`], which callers must
/// check before writing anything.
pub struct RouteSchemaPass<R> {
    resolver: R,
    options: TransformOptions,
    literals: LiteralSynthesizer,
    report: PassReport,
    errors: Vec<Error>,
}

impl<R: SchemaResolver> RouteSchemaPass<R> {
    pub fn new(resolver: R, options: TransformOptions) -> Self {
        Self {
            resolver,
            literals: LiteralSynthesizer::new(options.sequence_literals),
            options,
            report: PassReport::default(),
            errors: Vec::new(),
        }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn report(&self) -> &PassReport {
        &self.report
    }

    pub fn transform_module(
        &mut self,
        program: &Program,
        file: &SourceFile,
        module: Module,
    ) -> Result<Module> {
        let mut folder = RouteFolder {
            pass: self,
            program,
            errors: Vec::new(),
        };
        let module = module.fold_with(&mut folder);
        let errors = folder.errors;
        debug!(
            "{}: {} route(s) so far, {} failure(s) in this file",
            file.path.display(),
            self.report.len(),
            errors.len()
        );
        match self.options.on_error {
            ErrorPolicy::Abort => match errors.into_iter().next() {
                Some(err) => Err(err),
                None => Ok(module),
            },
            ErrorPolicy::Collect => {
                self.errors.extend(errors);
                Ok(module)
            }
        }
    }

    /// Hands back the report, or every failure collected so far.
    pub fn finish(&mut self) -> Result<PassReport> {
        if !self.errors.is_empty() {
            return Err(Error::aggregate(mem::take(&mut self.errors)));
        }
        Ok(mem::take(&mut self.report))
    }

    fn route_options(&self, types: &RouteTypeArgs) -> Result<Value> {
        let mut schema = ValueMap::new();
        for (slot, name) in types.slots() {
            schema.insert(slot.to_string(), Value::from(self.document(name)?));
        }
        Ok(Value::structure([("schema", Value::Structure(schema))]))
    }

    /// Schema document for one type. Documents that point at other
    /// definitions carry them along so every `$ref` resolves on its own.
    fn document(&self, name: &str) -> Result<serde_json::Value> {
        let definitions = self.resolver.schema_for(name)?;
        let mut document = definitions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::schema(name, "the generator returned no definition for it"))?;
        if has_refs(&document) {
            if let serde_json::Value::Object(object) = &mut document {
                let definitions = definitions.into_iter().collect::<serde_json::Map<_, _>>();
                object.insert(
                    "definitions".to_string(),
                    serde_json::Value::Object(definitions),
                );
            }
        }
        Ok(document)
    }

    fn rewrite(&mut self, program: &Program, call: &CallExpr) -> Result<Box<Expr>> {
        let location = program.location(call.span);
        let types = RouteTypeArgs::from_call(call).map_err(|err| err.at(location.clone()))?;
        info!("{}", types);
        let literal = self
            .route_options(&types)
            .and_then(|options| self.literals.synthesize(&options))
            .map_err(|err| err.at(location.clone()))?;
        self.report.routes.push(RouteMatch {
            file: location.file,
            line: location.line,
            column: location.column,
            method: member_call(call)
                .map(|(_, method)| method.to_string())
                .unwrap_or_default(),
            path: static_path(call),
            types,
        });
        Ok(literal)
    }
}

impl<R: SchemaResolver> BeforeEmit for RouteSchemaPass<R> {
    fn before_emit(
        &mut self,
        program: &Program,
        file: &SourceFile,
        module: Module,
    ) -> Result<Module> {
        self.transform_module(program, file, module)
    }
}

struct RouteFolder<'a, R> {
    pass: &'a mut RouteSchemaPass<R>,
    program: &'a Program,
    errors: Vec<Error>,
}

impl<R: SchemaResolver> Fold for RouteFolder<'_, R> {
    fn fold_call_expr(&mut self, call: CallExpr) -> CallExpr {
        if self.pass.options.on_error == ErrorPolicy::Abort && !self.errors.is_empty() {
            return call;
        }
        if !is_route_call(
            &call,
            self.program.checker(),
            &self.pass.options.receiver_type,
        ) {
            return call.fold_children_with(self);
        }
        match self.pass.rewrite(self.program, &call) {
            Ok(literal) => with_route_options(call, literal),
            Err(err) => {
                self.errors.push(err);
                call
            }
        }
    }
}

/// `f(path, ...rest)` becomes `f(path, options, ...rest)`.
fn with_route_options(mut call: CallExpr, options: Box<Expr>) -> CallExpr {
    let options = ExprOrSpread {
        spread: None,
        expr: options,
    };
    let at = call.args.len().min(1);
    call.args.insert(at, options);
    call
}

fn static_path(call: &CallExpr) -> Option<String> {
    let first = call.args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match &*first.expr {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => tpl
            .quasis
            .first()
            .map(|quasi| quasi.raw.to_string()),
        _ => None,
    }
}

fn has_refs(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Object(object) => {
            object.contains_key("$ref") || object.values().any(has_refs)
        }
        serde_json::Value::Array(items) => items.iter().any(has_refs),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tr_core::ErrorKind;
    use tr_jsonschema::SchemaMap;
    use tr_typescript::{EmitOptions, EmitTarget, ProgramEmitter};

    use crate::literal::read_literal;

    const PRELUDE: &str = "interface FastifyInstance { get(path: string, opts: any, handler?: any): void }\n\
                           declare const server: FastifyInstance;\n";

    /// Resolves every name to a one-property object schema.
    struct FakeResolver;

    impl SchemaResolver for FakeResolver {
        fn schema_for(&self, type_name: &str) -> Result<SchemaMap> {
            if type_name == "Missing" {
                return Err(Error::schema(type_name, "no declaration"));
            }
            let mut map = SchemaMap::new();
            map.insert(
                type_name.to_string(),
                json!({ "type": "object", "title": type_name }),
            );
            Ok(map)
        }
    }

    fn run(source: &str, options: TransformOptions) -> (Result<Vec<String>>, RouteSchemaPass<FakeResolver>) {
        let source = format!("{PRELUDE}{source}");
        let program = Program::from_source("/app/server.ts", &source).unwrap();
        let mut pass = RouteSchemaPass::new(FakeResolver, options);
        let emitter = ProgramEmitter::new(
            &program,
            EmitOptions {
                target: EmitTarget::TypeScript,
                out_dir: Some(PathBuf::from("/out")),
                ..Default::default()
            },
        );
        let hook: &mut dyn BeforeEmit = &mut pass;
        let result = emitter
            .emit(&mut [hook])
            .map(|files| files.into_iter().map(|file| file.code).collect());
        (result, pass)
    }

    fn rewritten_call(program: &Program, pass: &mut RouteSchemaPass<FakeResolver>) -> CallExpr {
        let file = program.entry();
        let module = pass
            .transform_module(program, file, file.module.clone())
            .unwrap();
        module
            .body
            .iter()
            .rev()
            .find_map(|item| {
                let expr = item.as_stmt()?.as_expr()?;
                expr.expr.as_call().cloned()
            })
            .unwrap()
    }

    #[test]
    fn schema_object_becomes_the_second_argument() {
        let source = format!("{PRELUDE}server.get<Q, P, B, H>('/ping/:bar', handler);");
        let program = Program::from_source("/app/server.ts", &source).unwrap();
        let mut pass = RouteSchemaPass::new(FakeResolver, TransformOptions::default());
        let call = rewritten_call(&program, &mut pass);

        assert_eq!(call.args.len(), 3);
        assert!(matches!(&*call.args[0].expr, Expr::Lit(Lit::Str(s)) if &*s.value == "/ping/:bar"));
        assert!(matches!(&*call.args[2].expr, Expr::Ident(i) if &*i.sym == "handler"));
        assert_eq!(call.type_args.as_ref().map(|args| args.params.len()), Some(4));

        let options = read_literal(&call.args[1].expr).unwrap();
        let expected = Value::from(json!({
            "schema": {
                "query": { "type": "object", "title": "Q" },
                "params": { "type": "object", "title": "P" },
                "body": { "type": "object", "title": "B" },
                "headers": { "type": "object", "title": "H" }
            }
        }));
        assert_eq!(options, expected);

        let report = pass.finish().unwrap();
        assert_eq!(report.len(), 1);
        let route = &report.routes[0];
        assert_eq!(route.method, "get");
        assert_eq!(route.path.as_deref(), Some("/ping/:bar"));
        assert_eq!(route.line, 3);
        assert_eq!(route.types.to_string(), "Q P B H");
    }

    #[test]
    fn non_matching_calls_print_unchanged() {
        let (result, pass) = run(
            "server.get<Q, P, B>('/three', h);\nserver.get('/', h);",
            TransformOptions::default(),
        );
        let code = result.unwrap().join("\n");
        assert!(code.contains("server.get<Q, P, B>('/three', h);"), "{code}");
        assert!(code.contains("server.get('/', h);"), "{code}");
        assert!(!code.contains("schema"));
        assert!(pass.report().is_empty());
    }

    #[test]
    fn abort_stops_at_the_first_failure() {
        let (result, pass) = run(
            "server.get<Missing, P, B, H>('/a', h);\nserver.get<A | B, P, B, H>('/b', h);",
            TransformOptions::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("server.ts:3:1"), "{err}");
        assert!(pass.report().is_empty());
    }

    #[test]
    fn collect_reports_every_failing_call() {
        let options = TransformOptions {
            on_error: ErrorPolicy::Collect,
            ..Default::default()
        };
        let (result, mut pass) = run(
            "server.get<Missing, P, B, H>('/a', h);\n\
             server.get<A | B, P, B, H>('/b', h);\n\
             server.get<Q, P, B, H>('/c', h);",
            options,
        );
        let code = result.unwrap().join("\n");
        assert!(code.contains("server.get<Missing, P, B, H>('/a', h);"), "{code}");
        assert!(code.contains("server.get<A | B, P, B, H>('/b', h);"), "{code}");
        assert!(code.contains("\"title\": \"Q\""), "{code}");
        assert_eq!(pass.report().len(), 1);

        let err = pass.finish().unwrap_err();
        match err {
            Error::Aggregate { errors } => {
                let kinds: Vec<ErrorKind> = errors.iter().map(Error::kind).collect();
                assert_eq!(kinds, vec![ErrorKind::Schema, ErrorKind::TypeArgument]);
            }
            other => panic!("expected an aggregate error, found {other:?}"),
        }
    }

    #[test]
    fn referenced_definitions_travel_with_the_document() {
        struct RefResolver;
        impl SchemaResolver for RefResolver {
            fn schema_for(&self, type_name: &str) -> Result<SchemaMap> {
                let mut map = SchemaMap::new();
                map.insert(
                    type_name.to_string(),
                    json!({ "type": "object", "properties": { "tag": { "$ref": "#/definitions/Tag" } } }),
                );
                map.insert("Tag".to_string(), json!({ "type": "string" }));
                Ok(map)
            }
        }
        let pass = RouteSchemaPass::new(RefResolver, TransformOptions::default());
        let document = pass.document("Body").unwrap();
        assert_eq!(document["definitions"]["Tag"], json!({ "type": "string" }));
        assert_eq!(document["definitions"]["Body"]["type"], json!("object"));
    }
}
