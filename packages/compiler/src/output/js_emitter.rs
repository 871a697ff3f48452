//! JavaScript Emitter
//!
//! Prints compiled templates as `new Template(refs, html[, expr])`
//! expressions, and bundles of them as a CommonJS module.

use indexmap::IndexMap;

use super::emitter::EmitterContext;
use crate::compiled::{BindingDescriptor, CompiledTemplate, Reference};
use crate::config::HOST_MARKER_ATTR;

/// Module the emitted bundle requires the runtime `Template` from.
pub const DEFAULT_RUNTIME_MODULE: &str = "poirot/lib/template";

/// Expression re-creating `compiled` in the browser runtime.
pub fn emit_template(compiled: &CompiledTemplate) -> String {
    let mut out = String::from("new Template(");
    print_references(&mut out, &compiled.references);
    out.push(',');
    out.push_str(&stringify_html(&compiled.html()));
    if let Some(expr) = &compiled.block_expr {
        out.push(',');
        out.push_str(&json_string(expr));
    }
    out.push(')');
    out
}

pub fn emit_module(templates: &IndexMap<String, CompiledTemplate>) -> String {
    emit_module_with_runtime(templates, DEFAULT_RUNTIME_MODULE)
}

/// CommonJS module exporting every template under its name.
pub fn emit_module_with_runtime(
    templates: &IndexMap<String, CompiledTemplate>,
    runtime: &str,
) -> String {
    let mut ctx = EmitterContext::create_root();
    ctx.println("\"use strict\";");
    ctx.println(&format!("var Template = require({});", json_string(runtime)));
    ctx.println("module.exports = {");
    ctx.inc_indent();
    let count = templates.len();
    for (index, (name, compiled)) in templates.iter().enumerate() {
        ctx.print(&json_string(name), false);
        ctx.print(": ", false);
        ctx.print(&emit_template(compiled), false);
        ctx.println(if index + 1 < count { "," } else { "" });
    }
    ctx.dec_indent();
    ctx.println("};");
    let mut source = ctx.to_source();
    source.push('\n');
    source
}

fn print_references(out: &mut String, references: &[Vec<Reference>]) {
    out.push('[');
    for (i, slot) in references.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('[');
        for (j, reference) in slot.iter().enumerate() {
            if j > 0 {
                out.push(',');
            }
            match reference {
                Reference::Binding(descriptor) => print_descriptor(out, descriptor),
                Reference::Template(sub) => out.push_str(&emit_template(sub)),
            }
        }
        out.push(']');
    }
    out.push(']');
}

fn print_descriptor(out: &mut String, descriptor: &BindingDescriptor) {
    let mut props = vec![
        format!("tp:{}", json_string(descriptor.kind.tag())),
        format!("key:{}", json_string(&descriptor.key)),
    ];
    if let Some(attribute) = &descriptor.attribute {
        props.push(format!("at:{}", json_string(attribute)));
    }
    if let Some(block_name) = &descriptor.block_name {
        props.push(format!("bn:{}", json_string(block_name)));
    }
    out.push('{');
    out.push_str(&props.join(","));
    out.push('}');
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Markup string literal. Quotes are swapped to single quotes when the markup
/// holds more double quotes, and the literal is split on the host marker when
/// that prints shorter.
pub fn stringify_html(html: &str) -> String {
    let mut literal = json_string(html);
    let body = &literal[1..literal.len() - 1];
    if body.matches('"').count() > body.matches('\'').count() {
        literal = requote_single(body);
    }

    let quote = &literal[..1];
    let separator = format!("{},{}", quote, quote);
    let alt = format!("[{}]", literal.split(HOST_MARKER_ATTR).collect::<Vec<_>>().join(&separator));
    if alt.len() < literal.len() {
        alt
    } else {
        literal
    }
}

/// Turn the body of a double-quoted JSON literal into a single-quoted one.
fn requote_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    out.push('\'');
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
