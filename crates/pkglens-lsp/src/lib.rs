//! pkglens language server.
//!
//! Annotates `package.json` with the files each `files` pattern publishes
//! (code lenses) and describes dependencies on hover. The [`Backend`] is
//! served over stdio by the `pkglens` binary.

pub mod config;
pub mod document;
pub mod handlers;
pub mod server;

#[cfg(test)]
mod test_utils;

pub use config::LensConfig;
pub use server::Backend;
