use serde::{Deserialize, Serialize};

/// Which named types become `$ref` definitions instead of being inlined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expose {
    #[default]
    Export,
    All,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    pub expose: Expose,
    /// Default `additionalProperties` for objects without an index signature.
    pub additional_properties: bool,
    pub jsdoc: bool,
    pub sort_props: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            expose: Expose::Export,
            additional_properties: false,
            jsdoc: true,
            sort_props: false,
        }
    }
}
