use miette::Diagnostic;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::result;
use thiserror::Error;

/// A position inside a source file, 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" (at {location})"),
        None => String::new(),
    }
}

/// Stable classification of every failure the pipeline can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Load,
    Syntax,
    TypeArgument,
    Schema,
    Literal,
    Emit,
    Aggregate,
    Io,
    Generic,
}

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(typeroute::config),
        help("check tsconfig.json and typeroute.toml")
    )]
    Config(String),

    #[error("failed to load {}: {message}", path.display())]
    #[diagnostic(code(typeroute::load))]
    Load { path: PathBuf, message: String },

    #[error("syntax error at {location}: {message}")]
    #[diagnostic(code(typeroute::syntax))]
    Syntax { location: Location, message: String },

    #[error("cannot identify the type name of {found}{}", location_suffix(.location))]
    #[diagnostic(
        code(typeroute::type_argument),
        help("route type arguments must name an interface, type alias or enum directly")
    )]
    TypeArgument {
        found: String,
        location: Option<Location>,
    },

    #[error("cannot generate schema for `{type_name}`: {reason}{}", location_suffix(.location))]
    #[diagnostic(code(typeroute::schema))]
    Schema {
        type_name: String,
        reason: String,
        location: Option<Location>,
    },

    #[error("cannot serialize {what}{}", location_suffix(.location))]
    #[diagnostic(code(typeroute::literal))]
    Literal {
        what: String,
        location: Option<Location>,
    },

    #[error("emit failed: {0}")]
    #[diagnostic(code(typeroute::emit))]
    Emit(String),

    #[error("{} route call(s) could not be transformed", .errors.len())]
    #[diagnostic(code(typeroute::aggregate))]
    Aggregate {
        #[related]
        errors: Vec<Error>,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(typeroute::io))]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(typeroute::generic))]
    Generic(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn schema(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            type_name: type_name.into(),
            reason: reason.into(),
            location: None,
        }
    }

    pub fn type_argument(found: impl Into<String>) -> Self {
        Error::TypeArgument {
            found: found.into(),
            location: None,
        }
    }

    pub fn literal(what: impl Into<String>) -> Self {
        Error::Literal {
            what: what.into(),
            location: None,
        }
    }

    pub fn emit(message: impl Into<String>) -> Self {
        Error::Emit(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Load { .. } => ErrorKind::Load,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::TypeArgument { .. } => ErrorKind::TypeArgument,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::Literal { .. } => ErrorKind::Literal,
            Error::Emit(_) => ErrorKind::Emit,
            Error::Aggregate { .. } => ErrorKind::Aggregate,
            Error::Io(_) => ErrorKind::Io,
            Error::Generic(_) => ErrorKind::Generic,
        }
    }

    /// Attaches a call-site location to errors raised while transforming a
    /// route call. Errors that already carry one, or that are not tied to a
    /// call site, are returned unchanged.
    pub fn at(mut self, call_site: Location) -> Self {
        match &mut self {
            Error::TypeArgument { location, .. }
            | Error::Schema { location, .. }
            | Error::Literal { location, .. } => {
                if location.is_none() {
                    *location = Some(call_site);
                }
            }
            _ => {}
        }
        self
    }

    pub fn aggregate(mut errors: Vec<Error>) -> Self {
        if errors.len() == 1 {
            return errors.remove(0);
        }
        Error::Aggregate { errors }
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(format!("{err:#}"))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(s.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_attached_once() {
        let first = Location::new("server.ts", 3, 1);
        let second = Location::new("server.ts", 9, 1);
        let err = Error::schema("Query", "no declaration found")
            .at(first.clone())
            .at(second);
        match err {
            Error::Schema { location, .. } => assert_eq!(location, Some(first)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn messages_keep_the_literal_wording() {
        assert_eq!(
            Error::literal("function").to_string(),
            "cannot serialize function"
        );
        let located = Error::literal("symbol").at(Location::new("a.ts", 1, 2));
        assert_eq!(located.to_string(), "cannot serialize symbol (at a.ts:1:2)");
    }

    #[test]
    fn aggregate_of_one_is_the_error_itself() {
        let err = Error::aggregate(vec![Error::config("bad")]);
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = Error::aggregate(vec![Error::config("a"), Error::emit("b")]);
        assert_eq!(err.kind(), ErrorKind::Aggregate);
        assert_eq!(err.to_string(), "2 route call(s) could not be transformed");
    }

    #[test]
    fn diagnostic_codes_are_stable() {
        let err = Error::schema("Body", "cyclic");
        let code = err.code().map(|code| code.to_string());
        assert_eq!(code.as_deref(), Some("typeroute::schema"));
    }

    #[test]
    fn bail_wraps_ad_hoc_messages() {
        fn reject(name: &str) -> Result<()> {
            crate::bail!("unexpected `{}`", name);
        }
        let err = reject("x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.to_string(), "unexpected `x`");
    }
}
