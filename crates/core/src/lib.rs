//! Core traits and types for the essay correction service
//!
//! This crate provides the foundational pieces shared by all other crates:
//! - Trait seams for pluggable backends (completion models, embedders,
//!   passage stores, cross-encoders)
//! - The reference passage domain types
//! - The shared error type

pub mod error;
pub mod passage;
pub mod traits;

pub use error::{Error, Result};
pub use passage::{Passage, PassageMetadata, ScoredPassage};
pub use traits::{CompletionModel, CrossEncoder, Embedder, PassageStore};
