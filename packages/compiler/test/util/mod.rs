#![allow(dead_code)]

/**
 * Shared Test Utilities
 *
 * Compile/load helpers over the arena document and small tree queries used
 * by the integration suites.
 */
use std::sync::Arc;

use poirot_compiler::dom::{ArenaDocument, Document, NodeId, NodeKind};
use poirot_compiler::logging::{LogLevel, MemoryLogger};
use poirot_compiler::runtime::{Environment, Template, Value};
use poirot_compiler::{CompiledTemplate, Compiler};

pub fn compile(source: &str) -> CompiledTemplate {
    let mut doc = ArenaDocument::new();
    Compiler::default()
        .compile(&mut doc, source, "test.html")
        .unwrap()
}

/// Compile and bind `source` in `doc` with a capturing logger.
pub fn load(doc: &mut ArenaDocument, source: &str) -> (Template, Arc<MemoryLogger>) {
    let compiled = Arc::new(compile(source));
    let logger = Arc::new(MemoryLogger::new(LogLevel::Debug));
    let env = Environment::default().with_logger(logger.clone());
    let template = Template::with_environment(doc, compiled, env).unwrap();
    (template, logger)
}

/// Render `context` and return the inner markup of the template root.
pub fn render(doc: &mut ArenaDocument, template: &Template, context: &Value) -> String {
    let root = template.render(doc, context).unwrap();
    doc.inner_markup(root).unwrap()
}

pub fn json(value: serde_json::Value) -> Value {
    Value::from(value)
}

/// Element descendants of `node` with tag `name`, in document order.
pub fn elements_by_tag(doc: &ArenaDocument, node: NodeId, name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current != node
            && doc.kind(current).unwrap() == NodeKind::Element
            && doc.tag_name(current).unwrap() == name
        {
            found.push(current);
        }
        for child in doc.children(current).unwrap().into_iter().rev() {
            stack.push(child);
        }
    }
    found
}
