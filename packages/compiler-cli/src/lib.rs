#![deny(clippy::all)]

/**
 * Poirot Compiler CLI
 *
 * Batch compilation of template files into a single artifact
 */
// Re-export compiler for convenience
pub use poirot_compiler as compiler;

// CLI-specific modules
pub mod config;
pub mod perform_compile;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
