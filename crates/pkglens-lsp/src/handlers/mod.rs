//! LSP protocol handlers.
//!
//! - [`code_lens`]: file counts over the `files` field, resolved lazily
//! - [`hover`]: package metadata for the dependency under the cursor
//! - [`commands`]: `workspace/executeCommand` targets
//!
//! Handlers load unknown documents from disk on demand and degrade to an
//! empty result on any failure.

pub mod code_lens;
pub mod commands;
pub mod hover;
