//! Test utilities for creating mock LSP clients and configs.

#[cfg(test)]
pub(crate) mod test_helpers {
    use crate::config::LensConfig;
    use crate::server::Backend;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower_lsp_server::Client;

    /// Creates a client that is not connected to anything, plus a default
    /// config, for handlers that need both.
    pub fn create_test_client_and_config() -> (Client, Arc<RwLock<LensConfig>>) {
        let (service, _socket) = tower_lsp_server::LspService::build(Backend::new).finish();
        let client = service.inner().client.clone();
        let config = Arc::new(RwLock::new(LensConfig::default()));
        (client, config)
    }
}
