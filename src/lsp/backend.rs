use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::lsp::document::LspDocument;
use crate::natives::{JsonDirectorySource, NativeCatalog, NativeDescriptor, ScriptLanguage};
use crate::resources::{LocalFs, ResourceIndex, ScriptType};

mod handlers;
mod state;
mod watcher;

pub use state::CfxBackend;

/// What the backend knows about the file behind a document.
#[derive(Debug, Clone)]
pub(crate) struct FileContext {
    pub(crate) path: Option<PathBuf>,
    pub(crate) script_type: ScriptType,
    pub(crate) games: Vec<String>,
    pub(crate) language: Option<ScriptLanguage>,
    pub(crate) fence: String,
}

impl CfxBackend {
    /// Creates a backend reading native data from the default locations plus
    /// `config.natives_dirs`.
    pub fn new(client: Client, config: ServerConfig) -> Self {
        let catalog = Self::json_catalog(&config);
        Self::with_catalog(client, config, catalog)
    }

    /// Creates a backend over an existing catalog.
    pub fn with_catalog(client: Client, config: ServerConfig, catalog: Arc<NativeCatalog>) -> Self {
        let index = ResourceIndex::new(Arc::new(LocalFs::new()));
        index.set_default_game(config.default_game.clone());
        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        Self {
            client,
            index: Arc::new(index),
            catalog: Arc::new(RwLock::new(catalog)),
            documents: Arc::new(DashMap::new()),
            config: Arc::new(RwLock::new(config)),
            file_watcher: Arc::new(Mutex::new(None)),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    fn json_catalog(config: &ServerConfig) -> Arc<NativeCatalog> {
        let source = JsonDirectorySource::with_default_locations(config.natives_dirs.clone());
        Arc::new(NativeCatalog::new(Arc::new(source)))
    }

    pub fn index(&self) -> &Arc<ResourceIndex> {
        &self.index
    }

    pub fn catalog(&self) -> Arc<NativeCatalog> {
        Arc::clone(&self.catalog.read())
    }

    pub fn config(&self) -> ServerConfig {
        self.config.read().clone()
    }

    pub fn document(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    /// Install a new configuration, pushing the parts other components care about.
    pub(crate) fn apply_config(&self, config: ServerConfig) {
        let previous = std::mem::replace(&mut *self.config.write(), config.clone());

        if previous.default_game != config.default_game {
            info!("Default game is now {}", config.default_game);
            self.index.set_default_game(config.default_game.clone());
        }
        if previous.natives_dirs != config.natives_dirs {
            info!("Native data directories changed, reloading catalog");
            *self.catalog.write() = Self::json_catalog(&config);
        }
    }

    /// Flip `insertParentheses`, returning the new value.
    pub(crate) fn toggle_insert_parentheses(&self) -> bool {
        let mut config = self.config.write();
        config.insert_parentheses = !config.insert_parentheses;
        config.insert_parentheses
    }

    /// Rebuild the resource index from the workspace roots.
    pub async fn index_workspace(&self) {
        self.index.scan_workspace().await;
        info!("Workspace has {} resource(s)", self.index.resource_count());
    }

    /// Script type and games of the document's file, rescanning its resource
    /// once when the file is not classified yet.
    pub(crate) async fn file_context(&self, document: &LspDocument) -> FileContext {
        let (script_type, games) = match &document.path {
            Some(path) => (
                self.index.ensure_classified(path).await,
                self.index.get_game_support(path),
            ),
            None => (ScriptType::Unknown, vec![self.index.default_game()]),
        };
        debug!(
            "{} is a {} script for {:?}",
            document.uri, script_type, games
        );

        FileContext {
            path: document.path.clone(),
            script_type,
            games,
            language: document.language,
            fence: document.language_id.clone(),
        }
    }

    /// Natives visible to a file with `context`.
    pub(crate) async fn visible_natives(&self, context: &FileContext) -> Vec<Arc<NativeDescriptor>> {
        self.catalog()
            .natives_for(&context.games, context.script_type)
            .await
    }

    /// Exact-name lookup across the games of a file with `context`.
    pub(crate) async fn find_native(&self, context: &FileContext, name: &str) -> Option<Arc<NativeDescriptor>> {
        self.catalog().find(&context.games, name).await
    }
}
