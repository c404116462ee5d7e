//! Image matching for Android device automation
//!
//! Decoding of screen captures, masked template scoring and positional
//! search, plus loading of template assets.

pub mod bitmap;
pub mod config;
pub mod engine;
pub mod template;

#[cfg(test)]
mod tests;

// Re-export main types and functions
pub use bitmap::Bitmap;
pub use config::{MatchConfig, create_default_config, create_edge_config};
pub use engine::{MatchEngine, MatchError, MatchResult};
pub use template::{Template, TemplateError, TemplateLibrary, TemplateResult};
