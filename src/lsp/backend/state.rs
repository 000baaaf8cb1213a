//! Backend state
//!
//! `CfxBackend` is cheap to clone; every field is shared behind an `Arc` so
//! the watcher task and the request handlers see the same index, catalog and
//! documents.

use std::sync::Arc;

use dashmap::DashMap;
use notify::RecommendedWatcher;
use parking_lot::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::config::ServerConfig;
use crate::lsp::document::LspDocument;
use crate::natives::NativeCatalog;
use crate::resources::ResourceIndex;

/// The language server backend.
#[derive(Clone)]
pub struct CfxBackend {
    pub(super) client: Client,
    pub(super) index: Arc<ResourceIndex>,
    /// Replaced wholesale when the natives directories change.
    pub(super) catalog: Arc<RwLock<Arc<NativeCatalog>>>,
    pub(super) documents: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) config: Arc<RwLock<ServerConfig>>,
    pub(super) file_watcher: Arc<Mutex<Option<RecommendedWatcher>>>,
    pub(super) shutdown_tx: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl std::fmt::Debug for CfxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfxBackend")
            .field("index", &self.index)
            .field("catalog", &self.catalog.read())
            .field("documents", &self.documents.len())
            .field("config", &*self.config.read())
            .finish()
    }
}
