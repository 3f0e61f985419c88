//! Core plumbing for pkglens.
//!
//! This crate holds the pieces every other crate in the workspace leans on:
//!
//! - **HTTP cache**: freshness window plus ETag / Last-Modified revalidation
//! - **Errors**: [`LensError`] and the crate-wide [`Result`] alias
//! - **Positions**: [`LineIndex`] for byte offset ↔ LSP position conversion

pub mod cache;
pub mod error;
pub mod position;

pub use cache::{CachedResponse, HttpCache};
pub use error::{LensError, Result};
pub use position::{LineIndex, range_contains};
