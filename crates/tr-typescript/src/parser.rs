use std::path::Path;

use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::error::Error as SwcError;
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsConfig as TsSyntax};
use swc_ecma_quote::swc_common::comments::{Comments, SingleThreadedComments};
use swc_ecma_quote::swc_common::sync::Lrc;
use swc_ecma_quote::swc_common::{FileName, SourceMap, Span, Spanned};
use tr_core::{Error, Location, Result};

pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(".d.ts") || name.ends_with(".d.mts") || name.ends_with(".d.cts"))
        .unwrap_or(false)
}

fn is_tsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tsx"))
        .unwrap_or(false)
}

/// Parses one TypeScript source into the shared source map. Any syntax
/// error, recoverable or not, fails the parse.
pub fn parse_module(
    cm: &Lrc<SourceMap>,
    comments: &SingleThreadedComments,
    path: &Path,
    source: String,
) -> Result<Module> {
    let fm = cm.new_source_file(FileName::Real(path.to_path_buf()), source);
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: is_tsx(path),
        decorators: true,
        dts: is_declaration_file(path),
        ..Default::default()
    });
    let lexer = Lexer::new(
        syntax,
        EsVersion::EsNext,
        StringInput::from(&*fm),
        Some(comments as &dyn Comments),
    );
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module();
    let mut errors = parser.take_errors();
    match module {
        Ok(module) if errors.is_empty() => Ok(module),
        Ok(_) => Err(syntax_error(cm, errors.remove(0))),
        Err(err) => Err(syntax_error(cm, err)),
    }
}

fn syntax_error(cm: &Lrc<SourceMap>, err: SwcError) -> Error {
    Error::Syntax {
        location: location_of(cm, err.span()),
        message: err.kind().msg().to_string(),
    }
}

pub fn location_of(cm: &Lrc<SourceMap>, span: Span) -> Location {
    let loc = cm.lookup_char_pos(span.lo);
    Location::new(loc.file.name.to_string(), loc.line, loc.col_display + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_ast::ModuleItem;
    use tr_core::ErrorKind;

    fn parse(path: &str, source: &str) -> Result<Module> {
        let cm: Lrc<SourceMap> = Default::default();
        let comments = SingleThreadedComments::default();
        parse_module(&cm, &comments, Path::new(path), source.to_string())
    }

    #[test]
    fn parses_generic_route_calls() {
        let module = parse(
            "server.ts",
            "server.get<Query, Params, Body, Headers>('/ping/:bar', (request, reply) => {});",
        )
        .unwrap();
        assert_eq!(module.body.len(), 1);
        assert!(matches!(module.body[0], ModuleItem::Stmt(_)));
    }

    #[test]
    fn declaration_files_allow_ambient_syntax() {
        let module = parse(
            "index.d.ts",
            "declare function fastify(opts?: object): FastifyInstance;\nexport default fastify;",
        )
        .unwrap();
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn syntax_errors_report_their_location() {
        let err = parse("broken.ts", "const a = ;\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        match err {
            Error::Syntax { location, .. } => {
                assert_eq!(location.line, 1);
                assert!(location.file.ends_with("broken.ts"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
