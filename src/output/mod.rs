//! Output processing and sanitization.
//!
//! External tools write free-form text full of color codes and
//! interactive-terminal warnings. Everything the gateway hands back to
//! an agent goes through [`OutputSanitizer::sanitize`] first.
//!
//! # Example
//!
//! ```
//! use agent_gateway::output::OutputSanitizer;
//!
//! let raw = "\x1b[32mInstalled\x1b[0m memory\nWarning: Input is not a terminal (fd=0)\n";
//! assert_eq!(OutputSanitizer::sanitize(raw), "Installed memory");
//! ```

mod sanitizer;

pub use sanitizer::OutputSanitizer;
