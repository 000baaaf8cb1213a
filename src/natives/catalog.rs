//! Native catalog: per-game native buckets with memoized retrieval
//!
//! The catalog sits at the boundary with the native data feed. Fetching and
//! refreshing the feed is someone else's job; the catalog only reads the
//! `natives.<game>.json` files a [`NativeSource`] hands it and keeps them in
//! memory for the lifetime of the process, until explicitly invalidated.
//!
//! Failures never propagate: an unreadable or missing feed yields empty
//! buckets (not memoized, so a later request retries).

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::model::{NativeDescriptor, OrganizedNatives};
use crate::errors::CatalogError;
use crate::resources::ScriptType;

/// Supplies the raw natives of one game.
#[async_trait]
pub trait NativeSource: Send + Sync {
    async fn load(&self, game: &str) -> Result<OrganizedNatives, CatalogError>;

    /// Human readable description for logs.
    fn describe(&self) -> String;
}

/// Game ids double as file name fragments, so keep them to `[a-z0-9_]+`.
pub fn is_valid_game_id(game: &str) -> bool {
    !game.is_empty()
        && game
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Reads `natives.<game>.json` from the first directory that has a parsable copy.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    directories: Vec<PathBuf>,
}

impl JsonDirectorySource {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    /// User data directory followed by `extra` directories (e.g. from the command line).
    ///
    /// - Linux: ~/.config/cfx-natives/
    /// - macOS: ~/Library/Application Support/cfx-natives/
    /// - Windows: %APPDATA%\cfx-natives\
    pub fn with_default_locations(extra: Vec<PathBuf>) -> Self {
        let mut directories = Vec::with_capacity(extra.len() + 1);
        if let Some(config_dir) = dirs::config_dir() {
            directories.push(config_dir.join("cfx-natives"));
        }
        directories.extend(extra);
        Self::new(directories)
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn file_name(game: &str) -> String {
        format!("natives.{}.json", game)
    }

    async fn load_file(path: PathBuf) -> Result<OrganizedNatives, CatalogError> {
        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| CatalogError::Io { path: path.clone(), source })?;
        serde_json::from_str(&data).map_err(|source| CatalogError::Json { path, source })
    }
}

#[async_trait]
impl NativeSource for JsonDirectorySource {
    async fn load(&self, game: &str) -> Result<OrganizedNatives, CatalogError> {
        let file_name = Self::file_name(game);
        let mut last_error = None;

        for dir in &self.directories {
            let path = dir.join(&file_name);
            if !path.is_file() {
                continue;
            }
            match Self::load_file(path).await {
                Ok(natives) => return Ok(natives),
                Err(e) => {
                    warn!("Skipping unusable native data: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CatalogError::NotFound {
            game: game.to_string(),
            searched: self.directories.len(),
        }))
    }

    fn describe(&self) -> String {
        format!("json files in {:?}", self.directories)
    }
}

/// Memoized native buckets per game key.
pub struct NativeCatalog {
    source: Arc<dyn NativeSource>,
    cache: DashMap<String, Arc<OrganizedNatives>>,
}

impl std::fmt::Debug for NativeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeCatalog")
            .field("source", &self.source.describe())
            .field("cached_games", &self.cache.len())
            .finish()
    }
}

impl NativeCatalog {
    pub fn new(source: Arc<dyn NativeSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    /// Natives for `game`, loading them on first use.
    pub async fn get(&self, game: &str) -> Arc<OrganizedNatives> {
        if let Some(cached) = self.cache.get(game) {
            return Arc::clone(cached.value());
        }

        match self.load(game).await {
            Ok(natives) => {
                info!("Loaded {} natives for {}", natives.len(), game);
                let natives = Arc::new(natives);
                self.cache.insert(game.to_string(), Arc::clone(&natives));
                natives
            }
            Err(e) => {
                warn!("Failed to load natives for {}: {}", game, e);
                Arc::new(OrganizedNatives::default())
            }
        }
    }

    async fn load(&self, game: &str) -> Result<OrganizedNatives, CatalogError> {
        if !is_valid_game_id(game) {
            return Err(CatalogError::InvalidGame(game.to_string()));
        }
        debug!("Loading natives for {} from {}", game, self.source.describe());
        self.source.load(game).await
    }

    pub fn invalidate(&self, game: &str) {
        self.cache.remove(game);
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, game: &str) -> bool {
        self.cache.contains_key(game)
    }

    /// Natives visible to a script of `script_type` across `games`.
    ///
    /// Client scripts see client + shared, server scripts see server + shared,
    /// shared and unclassified scripts see everything. Duplicates (same name
    /// and hash) keep their first occurrence.
    pub async fn natives_for(
        &self,
        games: &[String],
        script_type: ScriptType,
    ) -> Vec<Arc<NativeDescriptor>> {
        let mut seen = HashSet::new();
        let mut natives = Vec::new();

        for game in games {
            let organized = self.get(game).await;
            let buckets: [&[Arc<NativeDescriptor>]; 3] = match script_type {
                ScriptType::Client => [&organized.client, &organized.shared, &[]],
                ScriptType::Server => [&organized.server, &organized.shared, &[]],
                ScriptType::Shared | ScriptType::Unknown => {
                    [&organized.client, &organized.server, &organized.shared]
                }
            };

            for native in buckets.into_iter().flatten() {
                if seen.insert((native.name.clone(), native.hash.clone())) {
                    natives.push(Arc::clone(native));
                }
            }
        }

        natives
    }

    /// Exact name lookup across `games`, first game first.
    pub async fn find(&self, games: &[String], name: &str) -> Option<Arc<NativeDescriptor>> {
        for game in games {
            if let Some(native) = self.get(game).await.find(name) {
                return Some(Arc::clone(native));
            }
        }
        None
    }
}
