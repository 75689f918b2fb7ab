//! typeroute command-line interface.
//!
//! Loads a TypeScript program, injects JSON schemas generated from the type
//! arguments of its Fastify route registrations, and writes the result.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod driver;

pub use tr_core::{Error, Result};
