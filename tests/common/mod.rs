//! Shared fixtures for integration tests: temporary workspaces and an
//! in-memory native source.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use cfx_natives_language_server::errors::{CatalogError, IndexError};
use cfx_natives_language_server::natives::{
    Apiset, Example, NativeCatalog, NativeDescriptor, NativeSource, OrganizedNatives, Parameter,
};
use cfx_natives_language_server::resources::{LocalFs, ResourceIndex, WorkspaceFs};

/// A throwaway workspace directory.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("relative path has a parent")).expect("mkdir");
        fs::write(&path, contents).expect("write");
        path
    }

    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).expect("remove dir");
        } else {
            fs::remove_file(path).expect("remove file");
        }
    }

    /// A resource index rooted at this workspace, not yet scanned.
    pub fn index(&self) -> ResourceIndex {
        self.index_with(Arc::new(LocalFs::new()))
    }

    pub fn index_with(&self, fs: Arc<dyn WorkspaceFs>) -> ResourceIndex {
        let index = ResourceIndex::new(fs);
        index.set_workspace_roots(vec![self.root().to_path_buf()]);
        index
    }
}

/// The local disk, with reads counted and selected paths made unreadable.
#[derive(Default)]
pub struct ScriptedFs {
    unreadable: Mutex<HashSet<PathBuf>>,
    reads: AtomicUsize,
}

impl ScriptedFs {
    pub fn deny_read(&self, path: PathBuf) {
        self.unreadable.lock().insert(path);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl WorkspaceFs for ScriptedFs {
    fn find_files(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>, IndexError> {
        LocalFs.find_files(root, pattern)
    }

    fn file_exists(&self, path: &Path) -> bool {
        LocalFs.file_exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFs.is_dir(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, IndexError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unreadable.lock().contains(path) {
            return Err(IndexError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            });
        }
        LocalFs.read_to_string(path)
    }
}

/// Natives served from memory, counting loads.
#[derive(Default)]
pub struct StaticSource {
    games: HashMap<String, OrganizedNatives>,
    pub loads: AtomicUsize,
}

impl StaticSource {
    pub fn with_game(mut self, game: &str, natives: OrganizedNatives) -> Self {
        self.games.insert(game.to_string(), natives);
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeSource for StaticSource {
    async fn load(&self, game: &str) -> Result<OrganizedNatives, CatalogError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.games.get(game).cloned().ok_or(CatalogError::NotFound {
            game: game.to_string(),
            searched: 0,
        })
    }

    fn describe(&self) -> String {
        format!("static source with {} game(s)", self.games.len())
    }
}

pub fn native(name: &str, apiset: Apiset, params: &[(&str, &str)], return_type: &str) -> Arc<NativeDescriptor> {
    let params = params
        .iter()
        .map(|(name, type_name)| Parameter::new(*name, *type_name))
        .collect();
    let mut native = NativeDescriptor::new(name, params, return_type);
    native.apiset = apiset;
    native.hash = format!("0x{:016X}", name.len());
    Arc::new(native)
}

/// A small GTA V style native set.
pub fn gta5_natives() -> OrganizedNatives {
    let mut player_ped = NativeDescriptor::clone(&native("PLAYER_PED_ID", Apiset::Client, &[], "Ped"));
    player_ped.namespace = "PLAYER".to_string();
    player_ped.description = "Gets the local player's ped.".to_string();
    player_ped.examples = vec![Example {
        lang: "lua".to_string(),
        code: "local ped = PlayerPedId()".to_string(),
    }];

    OrganizedNatives {
        client: vec![
            Arc::new(player_ped),
            native(
                "SET_ENTITY_COORDS",
                Apiset::Client,
                &[("entity", "Entity"), ("x", "float"), ("y", "float"), ("z", "float")],
                "void",
            ),
            native("GET_ENTITY_COORDS", Apiset::Client, &[("entity", "Entity"), ("alive", "BOOL")], "Vector3"),
        ],
        server: vec![native("GET_PLAYER_PED", Apiset::Server, &[("playerSrc", "char*")], "Entity")],
        shared: vec![native("GET_HASH_KEY", Apiset::Shared, &[("model", "char*")], "Hash")],
    }
}

/// RedM natives sharing nothing with [`gta5_natives`].
pub fn rdr3_natives() -> OrganizedNatives {
    OrganizedNatives {
        client: vec![native("SET_PED_SCALE", Apiset::Client, &[("ped", "Ped"), ("scale", "float")], "void")],
        server: Vec::new(),
        shared: Vec::new(),
    }
}

pub fn catalog(source: StaticSource) -> Arc<NativeCatalog> {
    Arc::new(NativeCatalog::new(Arc::new(source)))
}
