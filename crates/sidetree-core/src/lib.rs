//! Core types for sidetree.
//!
//! This crate provides the immutable node model, the semantic mode flags,
//! path relations used for invalidation, settings and shared error types.

mod config;
mod error;
mod mode;
mod node;
mod paths;

pub use config::{ConfigError, IgnoreMatcher, Ignored, Settings, SettingsBuilder};
pub use error::{ScanError, WalkError};
pub use mode::Mode;
pub use node::{Children, Node, NodeIter, NodeRef};
pub use paths::{Index, Selection, ancestors, ancestors_of, cross_over, is_relative_to, parents_of};
