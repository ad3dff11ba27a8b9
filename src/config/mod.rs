//! Hierarchical config store
//!
//! This module provides the INI-style store and its file format:
//! - **store**: sections, inheritance and typed value access
//! - **loader** / **save**: chunked reader and writer, with optional encryption
//! - **value**: literal values with list, random range and typed cache handling

mod crypt;
mod error;
mod loader;
mod save;
pub mod scalar;
mod section;
mod store;
mod value;

// Re-export commonly used types
pub use crypt::Cipher;
pub use error::ConfigError;
pub use section::Section;
pub use store::{ConfigStore, SectionSnapshot};
pub use value::{ValueCell, ValueKind};
