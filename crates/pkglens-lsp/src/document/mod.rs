//! Document management module.
//!
//! - `state`: open documents and shared server state
//! - `loader`: disk-based loading for documents the client never opened

mod loader;
mod state;

pub use loader::{ensure_document_loaded, file_path, load_document_from_disk};
pub use state::{DocumentKind, DocumentState, ServerState};
