use std::fs;
use std::path::Path;

use tr_typescript::{EmitOptions, EmitTarget, Program, ProgramEmitter, TsConfig};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_project_from_disk_and_writes_javascript() {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    write(
        root,
        "tsconfig.json",
        r#"{ "compilerOptions": { "outDir": "dist", "rootDir": "src" } }"#,
    );
    write(
        root,
        "node_modules/fastify/package.json",
        r#"{ "name": "fastify", "types": "index.d.ts" }"#,
    );
    write(
        root,
        "node_modules/fastify/index.d.ts",
        "export interface FastifyInstance { listen(port: number): void }\n\
         declare function fastify(): FastifyInstance;\n\
         export default fastify;",
    );
    write(
        root,
        "src/server.ts",
        "import fastify from 'fastify';\n\
         import type { Query } from './types';\n\
         // keeps the server alive\n\
         const server = fastify();\n\
         server.listen(3000);",
    );
    write(root, "src/types.ts", "export interface Query { name: string }");

    let config = TsConfig::load(&root.join("tsconfig.json")).expect("tsconfig");
    let program = Program::load(&root.join("src/server.ts"), config).expect("program");
    assert_eq!(program.files().len(), 3);
    assert_eq!(program.emitted_files().count(), 2);

    let emitter = ProgramEmitter::new(&program, EmitOptions::from_config(program.config()));
    assert_eq!(emitter.options().target, EmitTarget::JavaScript);
    let files = emitter.emit(&mut []).expect("emit");
    ProgramEmitter::write(&files).expect("write");

    let server = fs::read_to_string(root.join("dist/server.js")).expect("server.js");
    assert!(server.contains("keeps the server alive"));
    assert!(server.contains("server.listen(3000)"));
    assert!(!server.contains("./types"));
    assert!(root.join("dist/types.js").is_file());
}
