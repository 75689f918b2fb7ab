//! JSON Schema documents for TypeScript type declarations.

mod generator;
mod options;

use indexmap::IndexMap;
use serde_json::Value;
use tr_core::Result;

pub use generator::SchemaGenerator;
pub use options::{Expose, SchemaOptions};

/// Schema documents keyed by type name: the requested type and every named
/// type it references.
pub type SchemaMap = IndexMap<String, Value>;

pub trait SchemaResolver {
    fn schema_for(&self, type_name: &str) -> Result<SchemaMap>;
}

impl<T: SchemaResolver + ?Sized> SchemaResolver for &T {
    fn schema_for(&self, type_name: &str) -> Result<SchemaMap> {
        (**self).schema_for(type_name)
    }
}

/// `$ref` target for a named definition.
pub fn definition_ref(name: &str) -> String {
    format!("#/definitions/{name}")
}
