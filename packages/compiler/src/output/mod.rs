//! Output Module
//!
//! Artifact encodings for compiled templates: JSON for tooling and the
//! JavaScript module form loaded by the browser runtime.

pub mod emitter;
pub mod js_emitter;
pub mod json;

pub use js_emitter::{emit_module, emit_template};
pub use json::{from_json, to_json, to_json_pretty};
