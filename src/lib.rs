//! Hierarchical INI-style config store with an inline text markup and line
//! layout engine built on top of it.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod font;
pub mod locale;
pub mod text;
pub mod types;
