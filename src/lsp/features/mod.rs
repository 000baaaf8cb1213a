//! Native-aware LSP features
//!
//! Each module turns catalog data plus cursor context into protocol types and
//! does no I/O; the backend resolves documents, files and natives first.

pub mod commands;
pub mod completion;
pub mod hover;
pub mod markdown;
pub mod signature_help;
