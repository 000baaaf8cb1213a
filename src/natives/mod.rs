//! Native descriptors, the per-game catalog and signature rendering.

pub mod catalog;
pub mod language;
pub mod model;
pub mod signature;
pub mod type_mapper;

pub use catalog::{JsonDirectorySource, NativeCatalog, NativeSource};
pub use language::ScriptLanguage;
pub use model::{Apiset, Example, NativeDescriptor, OrganizedNatives, Parameter};
pub use type_mapper::{TypePosition, map_type};
