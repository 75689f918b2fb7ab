//! Route schema injection: finds route registrations typed with four named
//! types and passes generated JSON schemas for them as route options.

pub mod literal;
pub mod matcher;
pub mod pass;
pub mod type_args;

pub use literal::{read_literal, to_literal, LiteralSynthesizer, SequenceMode};
pub use matcher::{is_route_call, ROUTE_METHODS};
pub use pass::{ErrorPolicy, PassReport, RouteMatch, RouteSchemaPass, TransformOptions};
pub use type_args::{type_argument_name, RouteTypeArgs};
