//! Command implementations for the typeroute CLI

pub mod build;
pub mod check;
pub mod schema;

pub use build::build_command;
pub use check::check_command;
pub use schema::schema_command;
