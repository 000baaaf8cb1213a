//! FiveM/RedM native language server
//!
//! - [`resources`]: resource discovery, manifest parsing and script classification
//! - [`natives`]: native descriptors, per-game catalog and signature rendering
//! - [`lsp`]: the tower-lsp backend and its completion, hover and signature help features

pub mod config;
pub mod errors;
pub mod logging;
pub mod lsp;
pub mod natives;
pub mod resources;
