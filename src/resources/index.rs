//! Workspace resource index
//!
//! # Architecture
//!
//! ```text
//!   scan_workspace ──► discover manifests ──► rayon: load_resource ──┐
//!                                                                     ├─► commit (write lock)
//!   apply_event ────► rescan_resource ──► spawn_blocking: load ──────┘        │
//!                                                                              ▼
//!   get_script_type / get_game_support ◄── DashMap memo ◄── IndexState (RwLock)
//! ```
//!
//! Resources are keyed by root directory. Glob expansion never descends into a
//! directory that holds its own manifest, so every file belongs to at most one
//! resource, and within it to at most one of the client/server/shared sets.
//!
//! Every mutation draws a ticket from a monotonic counter. A rescan is only
//! committed when its ticket is newer than the last commit (or clear) of the
//! same root and newer than the last full scan; otherwise the stale result is
//! dropped. Memo entries under a root are purged inside the same write-locked
//! section that changes the root's resource.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use super::ScriptType;
use super::events::WorkspaceEvent;
use super::fs::WorkspaceFs;
use super::manifest::{Manifest, parse_manifest_text};
use super::paths::{MANIFEST_NAMES, is_manifest, is_within, normalize, normalize_pattern};
use crate::errors::IndexError;

/// Game assumed when a resource declares none.
pub const DEFAULT_GAME: &str = "gta5";

/// A directory with a manifest and the files its patterns resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub client_files: BTreeSet<PathBuf>,
    pub server_files: BTreeSet<PathBuf>,
    pub shared_files: BTreeSet<PathBuf>,
}

impl Resource {
    fn empty(root: PathBuf, manifest: Manifest) -> Self {
        Self {
            root,
            manifest,
            client_files: BTreeSet::new(),
            server_files: BTreeSet::new(),
            shared_files: BTreeSet::new(),
        }
    }

    pub fn files(&self, script_type: ScriptType) -> Option<&BTreeSet<PathBuf>> {
        match script_type {
            ScriptType::Client => Some(&self.client_files),
            ScriptType::Server => Some(&self.server_files),
            ScriptType::Shared => Some(&self.shared_files),
            ScriptType::Unknown => None,
        }
    }

    fn files_mut(&mut self, script_type: ScriptType) -> Option<&mut BTreeSet<PathBuf>> {
        match script_type {
            ScriptType::Client => Some(&mut self.client_files),
            ScriptType::Server => Some(&mut self.server_files),
            ScriptType::Shared => Some(&mut self.shared_files),
            ScriptType::Unknown => None,
        }
    }

    pub fn script_type_of(&self, path: &Path) -> Option<ScriptType> {
        ScriptType::CLAIM_ORDER
            .into_iter()
            .find(|script_type| self.files(*script_type).is_some_and(|files| files.contains(path)))
    }

    /// Move `path` into the `script_type` set, out of any other.
    fn claim(&mut self, path: PathBuf, script_type: ScriptType) {
        for other in ScriptType::CLAIM_ORDER {
            if other != script_type {
                if let Some(files) = self.files_mut(other) {
                    files.remove(&path);
                }
            }
        }
        if let Some(files) = self.files_mut(script_type) {
            files.insert(path);
        }
    }

    /// Drop every claimed file under `dir` (a nested resource took them over).
    fn release_under(&mut self, dir: &Path) {
        for script_type in ScriptType::CLAIM_ORDER {
            if let Some(files) = self.files_mut(script_type) {
                files.retain(|path| !is_within(path, dir));
            }
        }
    }

    pub fn file_count(&self) -> usize {
        self.client_files.len() + self.server_files.len() + self.shared_files.len()
    }
}

#[derive(Debug)]
struct IndexState {
    roots: Vec<PathBuf>,
    default_game: String,
    resources: BTreeMap<PathBuf, Resource>,
    /// Ticket of the last commit or clear per root.
    committed: HashMap<PathBuf, u64>,
    /// Ticket of the last committed full scan (or `clear_all_caches`).
    scan_ticket: u64,
}

impl IndexState {
    /// Deepest resource whose root is `path` or one of its ancestors.
    fn owning_resource(&self, path: &Path) -> Option<&Resource> {
        path.ancestors().find_map(|dir| self.resources.get(dir))
    }

    fn last_ticket(&self, root: &Path) -> u64 {
        self.committed
            .get(root)
            .copied()
            .unwrap_or(0)
            .max(self.scan_ticket)
    }
}

/// Owned index of every resource in the workspace; share it behind an `Arc`.
pub struct ResourceIndex {
    fs: Arc<dyn WorkspaceFs>,
    state: RwLock<IndexState>,
    script_types: DashMap<PathBuf, ScriptType>,
    game_support: DashMap<PathBuf, Vec<String>>,
    /// Root ticket at which an unclassified file last triggered a self-repair rescan.
    repaired: DashMap<PathBuf, u64>,
    tickets: AtomicU64,
}

impl std::fmt::Debug for ResourceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ResourceIndex")
            .field("roots", &state.roots)
            .field("resources", &state.resources.len())
            .field("cached_script_types", &self.script_types.len())
            .finish()
    }
}

impl ResourceIndex {
    pub fn new(fs: Arc<dyn WorkspaceFs>) -> Self {
        Self {
            fs,
            state: RwLock::new(IndexState {
                roots: Vec::new(),
                default_game: DEFAULT_GAME.to_string(),
                resources: BTreeMap::new(),
                committed: HashMap::new(),
                scan_ticket: 0,
            }),
            script_types: DashMap::new(),
            game_support: DashMap::new(),
            repaired: DashMap::new(),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn set_workspace_roots(&self, roots: Vec<PathBuf>) {
        self.state.write().roots = roots;
    }

    pub fn workspace_roots(&self) -> Vec<PathBuf> {
        self.state.read().roots.clone()
    }

    pub fn default_game(&self) -> String {
        self.state.read().default_game.clone()
    }

    /// Change the fallback game. Memoized game support is dropped with it.
    pub fn set_default_game(&self, game: impl Into<String>) {
        let mut state = self.state.write();
        state.default_game = game.into();
        self.game_support.clear();
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run filesystem work on the blocking pool.
    async fn blocking<T, F>(&self, work: F) -> Result<T, IndexError>
    where
        F: FnOnce(&dyn WorkspaceFs) -> T + Send + 'static,
        T: Send + 'static,
    {
        let fs = Arc::clone(&self.fs);
        Ok(tokio::task::spawn_blocking(move || work(fs.as_ref())).await?)
    }

    /// Rebuild the whole index from the workspace roots.
    pub async fn scan_workspace(&self) {
        let ticket = self.next_ticket();
        let roots = self.workspace_roots();
        let started = Instant::now();
        info!("Scanning {} workspace root(s) for resources", roots.len());

        match self.blocking(move |fs| scan_roots(fs, &roots)).await {
            Ok(resources) => {
                let count = resources.len();
                if self.commit_scan(ticket, resources) {
                    info!("Indexed {} resource(s) in {:?}", count, started.elapsed());
                }
            }
            Err(e) => warn!("Workspace scan failed: {}", e),
        }
    }

    fn commit_scan(&self, ticket: u64, mut resources: BTreeMap<PathBuf, Resource>) -> bool {
        let mut state = self.state.write();
        if ticket < state.scan_ticket {
            debug!("Discarding workspace scan #{} (newer scan #{} committed)", ticket, state.scan_ticket);
            return false;
        }

        // Rescans and clears that landed while this scan was running are newer; keep them.
        let newer: Vec<PathBuf> = state
            .committed
            .iter()
            .filter(|(_, committed)| **committed > ticket)
            .map(|(root, _)| root.clone())
            .collect();
        let mut kept = Vec::new();
        for root in newer {
            match state.resources.remove(&root) {
                Some(resource) => {
                    resources.insert(root.clone(), resource);
                    kept.push(root);
                }
                None => {
                    resources.remove(&root);
                }
            }
        }
        // Ancestors loaded by this scan may still claim files of a newer nested resource.
        for root in &kept {
            for (other_root, other) in resources.iter_mut() {
                if other_root != root && is_within(root, other_root) {
                    other.release_under(root);
                }
            }
        }

        state.resources = resources;
        state.committed.retain(|_, committed| *committed > ticket);
        state.scan_ticket = ticket;
        self.script_types.clear();
        self.game_support.clear();
        self.repaired.clear();
        true
    }

    /// Read and parse one manifest. `None` when it cannot be read.
    pub async fn parse_manifest(&self, path: &Path) -> Option<Manifest> {
        let path = path.to_path_buf();
        match self.blocking(move |fs| read_manifest(fs, &path)).await {
            Ok(Ok(manifest)) => Some(manifest),
            Ok(Err(e)) | Err(e) => {
                warn!("Failed to parse manifest: {}", e);
                None
            }
        }
    }

    /// Re-derive the resource owning `manifest_path`, replacing the previous entry.
    ///
    /// If the directory also holds the preferred manifest name, that one is used.
    pub async fn rescan_resource(&self, manifest_path: &Path) {
        let ticket = self.next_ticket();
        let path = manifest_path.to_path_buf();

        let loaded = self
            .blocking(move |fs| {
                let resolved = path
                    .parent()
                    .and_then(|dir| preferred_manifest(fs, dir))
                    .unwrap_or(path);
                load_resource(fs, &resolved)
            })
            .await;

        match loaded {
            Ok(Ok(resource)) => {
                self.commit_resource(ticket, resource);
            }
            Ok(Err(e)) | Err(e) => {
                warn!("Failed to rescan resource at {}: {}", manifest_path.display(), e)
            }
        }
    }

    fn commit_resource(&self, ticket: u64, resource: Resource) -> bool {
        let mut state = self.state.write();
        let root = resource.root.clone();
        let last = state.last_ticket(&root);
        if ticket < last {
            debug!("Discarding stale rescan #{} of {} (last #{})", ticket, root.display(), last);
            return false;
        }

        for (other_root, other) in state.resources.iter_mut() {
            if *other_root != root && is_within(&root, other_root) {
                other.release_under(&root);
            }
        }

        debug!(
            "Indexed resource {} ({} client, {} server, {} shared)",
            root.display(),
            resource.client_files.len(),
            resource.server_files.len(),
            resource.shared_files.len()
        );
        state.resources.insert(root.clone(), resource);
        state.committed.insert(root.clone(), ticket);
        self.purge_under(&root);
        true
    }

    /// Forget the resource at `root` and every memo entry beneath it.
    pub fn clear_resource_cache(&self, root: &Path) {
        let ticket = self.next_ticket();
        let mut state = self.state.write();
        if state.resources.remove(root).is_some() {
            debug!("Removed resource {}", root.display());
        }
        state.committed.insert(root.to_path_buf(), ticket);
        self.purge_under(root);
    }

    /// Drop every resource and memo entry. In-flight rescans are discarded.
    pub fn clear_all_caches(&self) {
        let ticket = self.next_ticket();
        let mut state = self.state.write();
        state.resources.clear();
        state.committed.clear();
        state.scan_ticket = ticket;
        self.script_types.clear();
        self.game_support.clear();
        self.repaired.clear();
    }

    // Callers hold the state write lock.
    fn purge_under(&self, root: &Path) {
        self.script_types.retain(|path, _| !is_within(path, root));
        self.game_support.retain(|path, _| !is_within(path, root));
    }

    /// Classify `path`; `Unknown` when no resource claims it.
    pub fn get_script_type(&self, path: &Path) -> ScriptType {
        let state = self.state.read();
        if let Some(cached) = self.script_types.get(path).map(|entry| *entry) {
            return cached;
        }

        let script_type = state
            .owning_resource(path)
            .and_then(|resource| resource.script_type_of(path))
            .unwrap_or_default();
        trace!("Classified {} as {}", path.display(), script_type);
        self.script_types.insert(path.to_path_buf(), script_type);
        script_type
    }

    /// Games the owning resource declares; never empty.
    pub fn get_game_support(&self, path: &Path) -> Vec<String> {
        let state = self.state.read();
        if let Some(cached) = self.game_support.get(path).map(|entry| entry.value().clone()) {
            return cached;
        }

        let games = state
            .owning_resource(path)
            .map(|resource| resource.manifest.games())
            .filter(|games| !games.is_empty())
            .unwrap_or_else(|| vec![state.default_game.clone()]);
        self.game_support.insert(path.to_path_buf(), games.clone());
        games
    }

    /// Nearest ancestor of `path` that is a resource root.
    pub fn get_resource_path_from_file(&self, path: &Path) -> Option<PathBuf> {
        let state = self.state.read();
        path.ancestors()
            .skip(1)
            .find(|dir| state.resources.contains_key(*dir))
            .map(Path::to_path_buf)
    }

    pub fn resource(&self, root: &Path) -> Option<Resource> {
        self.state.read().resources.get(root).cloned()
    }

    /// Snapshot of every resource, ordered by root.
    pub fn resources(&self) -> Vec<Resource> {
        self.state.read().resources.values().cloned().collect()
    }

    pub fn resource_count(&self) -> usize {
        self.state.read().resources.len()
    }

    /// Rescan `path` once if it is unclassified but sits inside a known resource.
    ///
    /// The rescan happens at most once per state of the owning resource: until
    /// that resource is committed or cleared again, the file stays `Unknown`.
    pub async fn ensure_classified(&self, path: &Path) -> ScriptType {
        let script_type = self.get_script_type(path);
        if script_type != ScriptType::Unknown {
            return script_type;
        }
        let Some(root) = self.get_resource_path_from_file(path) else {
            return script_type;
        };

        let before = self.root_ticket(&root);
        if self.repaired.get(path).is_some_and(|entry| *entry == before) {
            return script_type;
        }

        debug!("{} is unclassified inside {}, rescanning", path.display(), root.display());
        self.rescan_root(&root).await;
        self.repaired.insert(path.to_path_buf(), self.root_ticket(&root));
        self.get_script_type(path)
    }

    fn root_ticket(&self, root: &Path) -> u64 {
        self.state.read().last_ticket(root)
    }

    async fn rescan_root(&self, root: &Path) {
        let manifest = self
            .state
            .read()
            .resources
            .get(root)
            .map(|resource| resource.manifest.path.clone())
            .unwrap_or_else(|| root.join(MANIFEST_NAMES[0]));
        self.rescan_resource(&manifest).await;
    }

    async fn rescan_owner(&self, path: &Path) {
        if let Some(root) = self.get_resource_path_from_file(path) {
            self.rescan_root(&root).await;
        }
    }

    /// Repair the index after a filesystem change.
    pub async fn apply_event(&self, event: WorkspaceEvent) {
        trace!("Applying {:?}", event);
        match event {
            WorkspaceEvent::Created(path) => self.apply_created(&path).await,
            WorkspaceEvent::Changed(path) => {
                if is_manifest(&path) {
                    self.rescan_resource(&path).await;
                }
            }
            WorkspaceEvent::Removed(path) => self.apply_removed(&path).await,
            WorkspaceEvent::Renamed { from, to } => {
                self.apply_removed(&from).await;
                self.apply_created(&to).await;
            }
        }
    }

    async fn apply_created(&self, path: &Path) {
        if is_manifest(path) {
            self.rescan_resource(path).await;
            return;
        }

        if self.fs.is_dir(path) {
            let dir = path.to_path_buf();
            match self.blocking(move |fs| discover_manifests(fs, &[dir])).await {
                Ok(manifests) => {
                    for manifest in manifests {
                        self.rescan_resource(&manifest).await;
                    }
                }
                Err(e) => warn!("Failed to look for resources in {}: {}", path.display(), e),
            }
        }

        self.rescan_owner(path).await;
    }

    async fn apply_removed(&self, path: &Path) {
        if is_manifest(path) {
            let Some(dir) = path.parent().map(Path::to_path_buf) else {
                return;
            };
            self.clear_resource_cache(&dir);

            let lookup = dir.clone();
            match self.blocking(move |fs| preferred_manifest(fs, &lookup)).await {
                Ok(Some(remaining)) => self.rescan_resource(&remaining).await,
                Ok(None) => self.rescan_owner(&dir).await,
                Err(e) => warn!("Failed to inspect {}: {}", dir.display(), e),
            }
            return;
        }

        let removed_roots: Vec<PathBuf> = self
            .state
            .read()
            .resources
            .keys()
            .filter(|root| is_within(root, path))
            .cloned()
            .collect();
        for root in &removed_roots {
            self.clear_resource_cache(root);
        }

        self.rescan_owner(path).await;
    }
}

/// First existing manifest in `dir`, by name preference.
fn preferred_manifest(fs: &dyn WorkspaceFs, dir: &Path) -> Option<PathBuf> {
    MANIFEST_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| fs.file_exists(path))
}

fn has_manifest(fs: &dyn WorkspaceFs, dir: &Path) -> bool {
    preferred_manifest(fs, dir).is_some()
}

/// Every manifest under `roots`, one per directory.
fn discover_manifests(fs: &dyn WorkspaceFs, roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut by_dir: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    for root in roots {
        // Least preferred first so the preferred name overwrites it.
        for name in MANIFEST_NAMES.iter().rev() {
            match fs.find_files(root, &format!("**/{}", name)) {
                Ok(found) => {
                    for manifest in found {
                        if let Some(dir) = manifest.parent() {
                            by_dir.insert(dir.to_path_buf(), manifest);
                        }
                    }
                }
                Err(e) => warn!("Manifest discovery failed under {}: {}", root.display(), e),
            }
        }
    }
    by_dir.into_values().collect()
}

fn scan_roots(fs: &dyn WorkspaceFs, roots: &[PathBuf]) -> BTreeMap<PathBuf, Resource> {
    let manifests = discover_manifests(fs, roots);
    debug!("Found {} manifest(s)", manifests.len());

    manifests
        .par_iter()
        .filter_map(|path| match load_resource(fs, path) {
            Ok(resource) => Some((resource.root.clone(), resource)),
            Err(e) => {
                warn!("Skipping resource: {}", e);
                None
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

fn read_manifest(fs: &dyn WorkspaceFs, path: &Path) -> Result<Manifest, IndexError> {
    let text = fs.read_to_string(path)?;
    Ok(parse_manifest_text(path, &text))
}

fn load_resource(fs: &dyn WorkspaceFs, manifest_path: &Path) -> Result<Resource, IndexError> {
    let root = manifest_path
        .parent()
        .ok_or_else(|| IndexError::NoResourceRoot(manifest_path.to_path_buf()))?
        .to_path_buf();
    let manifest = read_manifest(fs, manifest_path)?;

    let mut probe = NestedResourceProbe::new(fs, &root);
    let mut claims = Vec::new();
    for script_type in ScriptType::CLAIM_ORDER {
        for pattern in manifest.patterns(script_type) {
            for file in expand_pattern(fs, &root, pattern) {
                if !is_manifest(&file) && !probe.is_nested(&file) {
                    claims.push((file, script_type));
                }
            }
        }
    }

    let mut resource = Resource::empty(root, manifest);
    for (file, script_type) in claims {
        resource.claim(file, script_type);
    }
    Ok(resource)
}

/// Files one manifest pattern resolves to, restricted to the resource root.
fn expand_pattern(fs: &dyn WorkspaceFs, root: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = normalize_pattern(pattern);
    if pattern.is_empty() {
        return Vec::new();
    }
    if pattern.starts_with('@') {
        trace!("Skipping cross-resource reference {}", pattern);
        return Vec::new();
    }
    if Path::new(&pattern).is_absolute() || !is_within(&normalize(&root.join(&pattern)), root) {
        warn!("Skipping pattern {:?} outside resource {}", pattern, root.display());
        return Vec::new();
    }

    match fs.find_files(root, &pattern) {
        Ok(files) => files.into_iter().filter(|file| is_within(file, root)).collect(),
        Err(e) => {
            warn!("Skipping pattern in {}: {}", root.display(), e);
            Vec::new()
        }
    }
}

/// Answers "does this file live in a nested resource?" with per-directory memoization.
struct NestedResourceProbe<'a> {
    fs: &'a dyn WorkspaceFs,
    root: &'a Path,
    dirs: HashMap<PathBuf, bool>,
}

impl<'a> NestedResourceProbe<'a> {
    fn new(fs: &'a dyn WorkspaceFs, root: &'a Path) -> Self {
        Self {
            fs,
            root,
            dirs: HashMap::new(),
        }
    }

    fn is_nested(&mut self, file: &Path) -> bool {
        let Some(parent) = file.parent() else {
            return false;
        };
        for dir in parent.ancestors() {
            if dir == self.root || !is_within(dir, self.root) {
                return false;
            }
            let fs = self.fs;
            let nested = *self
                .dirs
                .entry(dir.to_path_buf())
                .or_insert_with(|| has_manifest(fs, dir));
            if nested {
                return true;
            }
        }
        false
    }
}
