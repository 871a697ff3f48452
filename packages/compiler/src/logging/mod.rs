// Logging
//
// Logger abstraction shared by the compiler trace and the render-time
// failure channel.

mod console_logger;
mod logger;

pub use console_logger::ConsoleLogger;
pub use logger::{LogLevel, Logger, MemoryLogger, NullLogger};
