use crate::config::LensConfig;
use crate::document::{DocumentKind, DocumentState, ServerState, file_path};
use crate::handlers::commands::{SHOW_FILES_COMMAND, handle_show_files};
use crate::handlers::{code_lens, hover};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{
    CodeLens, CodeLensOptions, CodeLensParams, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    ExecuteCommandOptions, ExecuteCommandParams, Hover, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp_server::{Client, LanguageServer, jsonrpc::Result};

pub struct Backend {
    pub(crate) client: Client,
    state: Arc<ServerState>,
    config: Arc<RwLock<LensConfig>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(ServerState::new()),
            config: Arc::new(RwLock::new(LensConfig::default())),
        }
    }

    #[doc(hidden)]
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            code_lens_provider: Some(CodeLensOptions {
                resolve_provider: Some(true),
            }),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: vec![SHOW_FILES_COMMAND.into()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Workspace folders, falling back to the root URI for older clients.
    fn workspace_roots(params: &InitializeParams) -> Vec<PathBuf> {
        if let Some(folders) = &params.workspace_folders {
            return folders
                .iter()
                .filter_map(|folder| file_path(&folder.uri))
                .collect();
        }

        #[allow(deprecated)]
        let root = params.root_uri.as_ref();
        root.and_then(file_path).map(|p| vec![p]).unwrap_or_default()
    }

    fn store(&self, uri: tower_lsp_server::ls_types::Uri, content: String) {
        match DocumentKind::from_uri(&uri) {
            Some(kind) => self.state.update_document(uri, DocumentState::new(kind, content)),
            None => tracing::debug!("unsupported file type: {:?}", uri),
        }
    }
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing pkglens server");

        if let Some(init_options) = params.initialization_options.clone()
            && let Some(config) = LensConfig::from_settings(init_options)
        {
            tracing::debug!("loaded configuration: {:?}", config);
            *self.config.write().await = config;
        }

        let cache_config = { self.config.read().await.cache.clone() };
        self.state.set_cache(&cache_config).await;
        self.state
            .set_workspace_roots(Self::workspace_roots(&params))
            .await;

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "pkglens".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("pkglens server initialized");
        self.client
            .log_message(MessageType::INFO, "pkglens ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down pkglens server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document opened: {:?}", uri);
        self.store(uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().next_back() {
            self.store(uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {:?}", uri);
        self.state.remove_document(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(config) = LensConfig::from_settings(params.settings) else {
            return;
        };

        let cache_changed = self.config.read().await.cache != config.cache;
        if cache_changed {
            self.state.set_cache(&config.cache).await;
        }
        tracing::debug!("configuration updated: {:?}", config);
        *self.config.write().await = config;

        if let Err(e) = self.client.code_lens_refresh().await {
            tracing::debug!("code_lens_refresh not supported: {:?}", e);
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        Ok(hover::handle_hover(Arc::clone(&self.state), params, Arc::clone(&self.config)).await)
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        Ok(
            code_lens::handle_code_lens(Arc::clone(&self.state), params, Arc::clone(&self.config))
                .await,
        )
    }

    async fn code_lens_resolve(&self, params: CodeLens) -> Result<CodeLens> {
        Ok(code_lens::handle_code_lens_resolve(
            Arc::clone(&self.state),
            params,
            Arc::clone(&self.config),
        )
        .await)
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        tracing::info!("execute_command: {:?}", params.command);

        if params.command == SHOW_FILES_COMMAND {
            return Ok(handle_show_files(&self.client, &params.arguments).await);
        }

        tracing::warn!("unknown command: {}", params.command);
        Ok(None)
    }
}
