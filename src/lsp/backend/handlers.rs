//! LSP protocol handler implementations
//!
//! `tower_lsp::LanguageServer` for [`CfxBackend`]:
//! - Lifecycle (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Settings (did_change_configuration, execute_command)
//! - Native features (completion, hover, signature_help)

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tower_lsp::jsonrpc::{self, Result as LspResult};
use tower_lsp::lsp_types::{
    CompletionList, CompletionOptions, CompletionOptionsCompletionItem, CompletionParams,
    CompletionResponse, DidChangeConfigurationParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, Hover, HoverParams, HoverProviderCapability, InitializeParams,
    InitializeResult, InitializedParams, MessageType, ServerCapabilities, ServerInfo,
    SignatureHelp, SignatureHelpOptions, SignatureHelpParams, TextDocumentSyncCapability,
    TextDocumentSyncKind,
};
use tower_lsp::LanguageServer;
use tracing::{debug, info, warn};

use super::state::CfxBackend;
use crate::lsp::document::LspDocument;
use crate::lsp::features::commands::{
    LIST_NATIVES, TOGGLE_INSERT_PARENTHESES, all_commands, native_listing, uri_argument,
};
use crate::lsp::features::completion::{CompletionRequest, completion_items};
use crate::lsp::features::hover::{native_hover, word_at};
use crate::lsp::features::signature_help::{call_context, native_signature_help};
use crate::resources::paths::is_manifest;

/// Completion triggers on any identifier character.
fn completion_trigger_characters() -> Vec<String> {
    ('A'..='Z')
        .chain('a'..='z')
        .chain(std::iter::once('_'))
        .map(String::from)
        .collect()
}

/// Workspace folders, falling back to `root_uri`.
fn workspace_roots(params: &InitializeParams) -> Vec<PathBuf> {
    let folders: Vec<PathBuf> = params
        .workspace_folders
        .iter()
        .flatten()
        .filter_map(|folder| folder.uri.to_file_path().ok())
        .collect();
    if !folders.is_empty() {
        return folders;
    }

    #[allow(deprecated)]
    let root = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok());
    root.into_iter().collect()
}

#[tower_lsp::async_trait]
impl LanguageServer for CfxBackend {
    /// Records the workspace roots and client settings, then advertises capabilities.
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        debug!("Received initialize: {:?}", params);

        let roots = workspace_roots(&params);
        if roots.is_empty() {
            warn!("Client sent no usable workspace folder; only the default game applies");
        }
        info!("Workspace roots: {:?}", roots);
        self.index.set_workspace_roots(roots);

        if let Some(options) = &params.initialization_options {
            let config = self.config().merged_with(options);
            self.apply_config(config);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string(), " ".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(completion_trigger_characters()),
                    all_commit_characters: None,
                    resolve_provider: Some(false),
                    completion_item: Some(CompletionOptionsCompletionItem {
                        label_details_support: Some(true),
                    }),
                    work_done_progress_options: Default::default(),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: all_commands(),
                    work_done_progress_options: Default::default(),
                }),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Scans the workspace and starts watching it.
    async fn initialized(&self, _params: InitializedParams) {
        self.index_workspace().await;

        let roots = self.index.workspace_roots();
        if let Err(e) = self.start_file_watcher(&roots) {
            warn!("Failed to start file watcher: {}", e);
        }

        self.client
            .log_message(
                MessageType::INFO,
                format!("Indexed {} resource(s)", self.index.resource_count()),
            )
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        info!("Received shutdown request");
        let _ = self.shutdown_tx.send(());
        self.file_watcher.lock().take();
        self.index.clear_all_caches();
        self.catalog().invalidate_all();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        debug!("Opened {} ({}, v{})", item.uri, item.language_id, item.version);

        let document = LspDocument::new(item.uri.clone(), item.language_id, &item.text, item.version);
        self.documents.insert(item.uri, Arc::new(document));
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(document) = self.document(&uri) else {
            warn!("Change for unknown document {}", uri);
            return;
        };

        if !document.apply(&params.content_changes, params.text_document.version).await {
            warn!("Ignoring stale change v{} for {}", params.text_document.version, uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Closed {}", params.text_document.uri);
        self.documents.remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let config = self.config().merged_with(&params.settings);
        debug!("Configuration now {:?}", config);
        self.apply_config(config);
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(document) = self.document(&uri) else {
            return Ok(None);
        };
        if document.path.as_deref().is_some_and(is_manifest) {
            return Ok(None);
        }

        let context = self.file_context(&document).await;
        let candidates = self.visible_natives(&context).await;
        let config = self.config();

        let (line_prefix, text_before) = {
            let state = document.state.read().await;
            (state.line_prefix(&position), state.text_before(&position))
        };
        let request = CompletionRequest {
            line_prefix: &line_prefix,
            text_before: &text_before,
            language: context.language,
            fence: &context.fence,
            insert_parentheses: config.insert_parentheses,
            max_results: config.max_completion_items,
        };

        let items = completion_items(&candidates, &request);
        debug!("{} completion item(s) out of {} candidate(s)", items.len(), candidates.len());
        if items.is_empty() {
            return Ok(None);
        }
        // ranking depends on the whole token, so ask to be called again as it grows
        Ok(Some(CompletionResponse::List(CompletionList {
            is_incomplete: true,
            items,
        })))
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(document) = self.document(&uri) else {
            return Ok(None);
        };

        let line = document.state.read().await.line(position.line as usize);
        let Some(word) = word_at(&line, position.character) else {
            return Ok(None);
        };

        let context = self.file_context(&document).await;
        let Some(native) = self.find_native(&context, &word.word).await else {
            return Ok(None);
        };
        Ok(Some(native_hover(
            &native,
            context.language,
            &context.fence,
            word.range(position.line),
        )))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> LspResult<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(document) = self.document(&uri) else {
            return Ok(None);
        };

        let line_prefix = document.state.read().await.line_prefix(&position);
        let Some(call) = call_context(&line_prefix) else {
            return Ok(None);
        };

        let context = self.file_context(&document).await;
        let Some(native) = self.find_native(&context, &call.name).await else {
            return Ok(None);
        };
        Ok(Some(native_signature_help(&native, context.language, call.active_parameter)))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        debug!("Executing {} with {:?}", params.command, params.arguments);

        match params.command.as_str() {
            LIST_NATIVES => {
                let uri = uri_argument(&params.arguments)
                    .ok_or_else(|| jsonrpc::Error::invalid_params("expected a document URI"))?;
                let Some(document) = self.document(&uri) else {
                    return Err(jsonrpc::Error::invalid_params(format!("{} is not open", uri)));
                };

                let context = self.file_context(&document).await;
                let natives = self.visible_natives(&context).await;
                let rows = native_listing(&natives, context.language);
                serde_json::to_value(rows)
                    .map(Some)
                    .map_err(|_| jsonrpc::Error::internal_error())
            }
            TOGGLE_INSERT_PARENTHESES => {
                let enabled = self.toggle_insert_parentheses();
                info!("insertParentheses is now {}", enabled);
                Ok(Some(Value::Bool(enabled)))
            }
            other => Err(jsonrpc::Error::invalid_params(format!("unknown command {}", other))),
        }
    }
}
