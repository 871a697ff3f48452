#![deny(clippy::all)]

/**
 * Poirot Template Compiler
 *
 * Compiles mustache-style markup into a compiled binding table plus static
 * markup, and binds compiled templates to live document trees at runtime.
 */

// Core modules
pub mod chars;
pub mod config;
pub mod error;
pub mod logging;
pub mod parse_util;

// Document provider
pub mod dom;

// Compilation pipeline
pub mod block_parser;
pub mod compiled;
pub mod compiler;
pub mod output;
pub mod scanner;

// Runtime binder
pub mod runtime;

// Re-exports
pub use compiled::{BindingDescriptor, CompiledTemplate, Markup, Reference, RenderKind};
pub use compiler::Compiler;
pub use config::CompilerConfig;
pub use dom::{ArenaDocument, Document, DomError, NodeId};
pub use error::{CompilerError, Result};
pub use runtime::{Environment, HandlerRegistry, Template, Value};

use std::sync::Arc;

/// Compile `source` with the default configuration in a fresh document.
pub fn compile(source: &str, name: &str) -> Result<CompiledTemplate> {
    let mut doc = ArenaDocument::new().with_url(name);
    Compiler::default().compile(&mut doc, source, name)
}

/// Compile `source` and bind the result in `doc`.
pub fn load(doc: &mut dyn Document, source: &str, name: &str) -> Result<Template> {
    let compiled = Compiler::default().compile(doc, source, name)?;
    Template::new(doc, Arc::new(compiled))
}
