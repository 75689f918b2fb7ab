use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;
use swc_ecma_ast::{Expr, ModuleItem, Stmt};
use tr_core::{ErrorKind, Value};
use tr_jsonschema::{SchemaGenerator, SchemaOptions};
use tr_transform::{read_literal, RouteSchemaPass, TransformOptions};
use tr_typescript::{BeforeEmit, EmitOptions, InMemoryFileSystem, Program, ProgramEmitter, TsConfig};

const FASTIFY: &str = "export interface FastifyInstance {\n\
                         get<Q = any, P = any, B = any, H = any>(path: string, ...rest: any[]): FastifyInstance;\n\
                         listen(port: number): Promise<string>;\n\
                       }\n\
                       declare function fastify(opts?: { logger?: boolean }): FastifyInstance;\n\
                       export default fastify;\n";

const SERVER: &str = "import fastify from 'fastify';\n\
                      \n\
                      const server = fastify({\n\
                        logger: true\n\
                      });\n\
                      \n\
                      export interface Query {\n\
                        foo?: number\n\
                      }\n\
                      \n\
                      export interface Params {\n\
                        bar?: string\n\
                      }\n\
                      \n\
                      export interface Body {\n\
                        baz?: string\n\
                      }\n\
                      \n\
                      export interface Headers {\n\
                        a?: string\n\
                      }\n\
                      \n\
                      server.get<Query, Params, Body, Headers>('/ping/:bar', (request, reply) => {\n\
                        console.log(request.query)\n\
                      });\n\
                      \n\
                      server.get('/', (request, reply) => {\n\
                        reply.code(200).send('Hello, world!');\n\
                      });\n\
                      \n\
                      server.listen(3000).catch(e => console.log(e));\n";

fn load(server: &str) -> Program {
    let fs = InMemoryFileSystem::new()
        .with_file("/app/node_modules/fastify/index.d.ts", FASTIFY)
        .with_file("/app/server.ts", server);
    Program::load_with(&fs, Path::new("/app/server.ts"), TsConfig::default()).expect("program")
}

fn object(property: &str, ty: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { property: { "type": ty } },
        "additionalProperties": false
    })
}

#[test]
fn route_call_receives_generated_schemas() {
    let program = load(SERVER);
    let generator = SchemaGenerator::new(&program, SchemaOptions::default());
    let mut pass = RouteSchemaPass::new(&generator, TransformOptions::default());

    let file = program.entry();
    let module = pass
        .transform_module(&program, file, file.module.clone())
        .expect("transform");

    let calls: Vec<_> = module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::Stmt(Stmt::Expr(stmt)) => stmt.expr.as_call(),
            _ => None,
        })
        .collect();
    let route = calls[0];
    assert_eq!(route.args.len(), 3);
    assert!(matches!(&*route.args[2].expr, Expr::Arrow(_)));

    let options = read_literal(&route.args[1].expr).expect("literal");
    let expected = Value::from(json!({
        "schema": {
            "query": object("foo", "number"),
            "params": object("bar", "string"),
            "body": object("baz", "string"),
            "headers": object("a", "string"),
        }
    }));
    assert_eq!(options, expected);

    // the untyped route keeps its two arguments
    assert_eq!(calls[1].args.len(), 2);

    let report = pass.finish().expect("report");
    assert_eq!(report.len(), 1);
    assert_eq!(report.routes[0].types.to_string(), "Query Params Body Headers");
}

#[test]
fn emitted_javascript_carries_the_schema_object() {
    let program = load(SERVER);
    let generator = SchemaGenerator::new(&program, SchemaOptions::default());
    let mut pass = RouteSchemaPass::new(&generator, TransformOptions::default());
    let emitter = ProgramEmitter::new(&program, EmitOptions::default());

    let hook: &mut dyn BeforeEmit = &mut pass;
    let files = emitter.emit(&mut [hook]).expect("emit");
    assert_eq!(files.len(), 1);
    let code = &files[0].code;
    assert!(code.contains("\"schema\""));
    assert!(code.contains("\"additionalProperties\""));
    assert!(code.contains("'/ping/:bar'"));
    assert!(!code.contains("interface Query"));
    assert!(!code.contains("<Query"));
}

#[test]
fn unknown_type_names_abort_the_run() {
    let server = SERVER.replace("<Query, Params, Body, Headers>", "<Query, Params, Body, Missing>");
    let program = load(&server);
    let generator = SchemaGenerator::new(&program, SchemaOptions::default());
    let mut pass = RouteSchemaPass::new(&generator, TransformOptions::default());
    let emitter = ProgramEmitter::new(&program, EmitOptions::default());

    let hook: &mut dyn BeforeEmit = &mut pass;
    let err = emitter.emit(&mut [hook]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(err.to_string().contains("Missing"), "{err}");
}
