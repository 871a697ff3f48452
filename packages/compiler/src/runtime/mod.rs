//! Runtime
//!
//! Loads compiled templates into a document and renders data contexts into
//! them.

mod context;
mod handlers;
mod iteration;
mod template;
mod value;

use std::fmt;
use std::sync::Arc;

use crate::logging::{ConsoleLogger, Logger};

pub use context::Scope;
pub use handlers::{
    render_escaped, render_function, render_literal, render_numeral, Handler, HandlerError,
    HandlerRegistry, Target,
};
pub use iteration::Iteration;
pub use template::{BoundBinding, Template};
pub use value::{format_number, Value, ValueFn};

/// Services shared by a template and every instance derived from it.
#[derive(Clone)]
pub struct Environment {
    pub registry: Arc<HandlerRegistry>,
    /// Receives render-time handler failures.
    pub logger: Arc<dyn Logger>,
    /// Leave host markers on the live tree after binding.
    pub keep_markers: bool,
}

impl Environment {
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_keep_markers(mut self, keep: bool) -> Self {
        self.keep_markers = keep;
        self
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment {
            registry: Arc::new(HandlerRegistry::default()),
            logger: Arc::new(ConsoleLogger::default()),
            keep_markers: false,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("registry", &self.registry)
            .field("log_level", &self.logger.level())
            .field("keep_markers", &self.keep_markers)
            .finish()
    }
}
