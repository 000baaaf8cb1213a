//! Integration tests for resource discovery and script classification
//!
//! Every test builds a real workspace in a temp dir and drives the index
//! through its public API.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use indoc::indoc;

use cfx_natives_language_server::resources::{GameDeclaration, ResourceIndex, ScriptType, WorkspaceEvent};
use common::{ScriptedFs, Workspace};

const BASIC_MANIFEST: &str = indoc! {r#"
    fx_version 'cerulean'
    game 'gta5'

    description 'client_script "not/a/pattern.lua" inside a string'

    client_scripts {
        'client/*.lua',
    }
    server_script 'server/main.lua'
    shared_scripts { 'config.lua', 'shared/**/*.lua' }
"#};

fn basic_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write("res/fxmanifest.lua", BASIC_MANIFEST);
    ws.write("res/client/a.lua", "");
    ws.write("res/client/b.lua", "");
    ws.write("res/client/nested/c.lua", "");
    ws.write("res/server/main.lua", "");
    ws.write("res/config.lua", "");
    ws.write("res/shared/util/math.lua", "");
    ws.write("res/readme.lua", "");
    ws
}

async fn scanned(ws: &Workspace) -> ResourceIndex {
    let index = ws.index();
    index.scan_workspace().await;
    index
}

#[tokio::test]
async fn test_scan_classifies_declared_scripts() {
    let ws = basic_workspace();
    let index = scanned(&ws).await;

    assert_eq!(index.resource_count(), 1);
    assert_eq!(index.get_script_type(&ws.path("res/client/a.lua")), ScriptType::Client);
    assert_eq!(index.get_script_type(&ws.path("res/client/b.lua")), ScriptType::Client);
    assert_eq!(index.get_script_type(&ws.path("res/server/main.lua")), ScriptType::Server);
    assert_eq!(index.get_script_type(&ws.path("res/config.lua")), ScriptType::Shared);
    assert_eq!(index.get_script_type(&ws.path("res/shared/util/math.lua")), ScriptType::Shared);

    // `*` does not cross directories
    assert_eq!(index.get_script_type(&ws.path("res/client/nested/c.lua")), ScriptType::Unknown);
    // not declared at all
    assert_eq!(index.get_script_type(&ws.path("res/readme.lua")), ScriptType::Unknown);
    // outside every resource
    assert_eq!(index.get_script_type(&ws.path("loose.lua")), ScriptType::Unknown);
}

#[tokio::test]
async fn test_manifest_directives_parse() {
    let ws = basic_workspace();
    let index = ws.index();

    let manifest = index.parse_manifest(&ws.path("res/fxmanifest.lua")).await.unwrap();
    assert_eq!(manifest.client_scripts, vec!["client/*.lua"]);
    assert_eq!(manifest.server_scripts, vec!["server/main.lua"]);
    assert_eq!(manifest.shared_scripts, vec!["config.lua", "shared/**/*.lua"]);
    assert_eq!(manifest.game, Some(GameDeclaration::Single("gta5".to_string())));

    assert!(index.parse_manifest(&ws.path("missing/fxmanifest.lua")).await.is_none());
}

#[tokio::test]
async fn test_block_and_single_forms_concatenate() {
    let ws = Workspace::new();
    ws.write(
        "res/fxmanifest.lua",
        indoc! {r#"
            client_script "single.lua"
            client_scripts { "a.lua", "b.lua" }
        "#},
    );

    let manifest = ws.index().parse_manifest(&ws.path("res/fxmanifest.lua")).await.unwrap();
    assert_eq!(manifest.client_scripts, vec!["a.lua", "b.lua", "single.lua"]);
}

#[tokio::test]
async fn test_each_file_claimed_once() {
    let ws = Workspace::new();
    ws.write(
        "res/fxmanifest.lua",
        indoc! {r#"
            client_scripts { '*.lua' }
            server_scripts { 'both.lua' }
            shared_script 'both.lua'
        "#},
    );
    ws.write("res/both.lua", "");
    ws.write("res/only_client.lua", "");

    let index = scanned(&ws).await;
    let resource = index.resource(&ws.path("res")).unwrap();
    let both = ws.path("res/both.lua");

    let claims = [&resource.client_files, &resource.server_files, &resource.shared_files]
        .iter()
        .filter(|set| set.contains(&both))
        .count();
    assert_eq!(claims, 1);
    // the last category listing a file wins
    assert_eq!(index.get_script_type(&both), ScriptType::Shared);
    assert_eq!(index.get_script_type(&ws.path("res/only_client.lua")), ScriptType::Client);
    // the manifest is never a script of its own resource
    assert!(!resource.client_files.contains(&ws.path("res/fxmanifest.lua")));
}

#[tokio::test]
async fn test_rescan_refreshes_cached_classification() {
    let ws = basic_workspace();
    let index = scanned(&ws).await;
    let file = ws.path("res/client/a.lua");
    assert_eq!(index.get_script_type(&file), ScriptType::Client);

    let manifest = ws.write("res/fxmanifest.lua", "server_scripts { 'client/*.lua' }\n");
    index.rescan_resource(&manifest).await;
    assert_eq!(index.get_script_type(&file), ScriptType::Server);

    index.clear_resource_cache(&ws.path("res"));
    assert_eq!(index.get_script_type(&file), ScriptType::Unknown);
    assert!(index.resource(&ws.path("res")).is_none());
}

#[tokio::test]
async fn test_scan_is_idempotent() {
    let ws = basic_workspace();
    ws.write("other/__resource.lua", "client_script 'x.lua'\n");
    ws.write("other/x.lua", "");
    let index = scanned(&ws).await;

    let first = index.resources();
    index.scan_workspace().await;
    assert_eq!(index.resources(), first);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn test_default_game_fallback() {
    let ws = Workspace::new();
    ws.write("plain/fxmanifest.lua", "client_script 'a.lua'\n");
    ws.write("plain/a.lua", "");
    ws.write("multi/fxmanifest.lua", "games { 'gta5', 'rdr3' }\nclient_script 'a.lua'\n");
    ws.write("multi/a.lua", "");
    let index = scanned(&ws).await;

    assert_eq!(index.get_game_support(&ws.path("plain/a.lua")), vec!["gta5"]);
    assert_eq!(index.get_game_support(&ws.path("multi/a.lua")), vec!["gta5", "rdr3"]);
    assert_eq!(index.get_game_support(&ws.path("nowhere.lua")), vec!["gta5"]);

    index.set_default_game("rdr3");
    assert_eq!(index.get_game_support(&ws.path("plain/a.lua")), vec!["rdr3"]);
}

#[tokio::test]
async fn test_sibling_prefix_is_not_containment() {
    let ws = Workspace::new();
    ws.write("res1/fxmanifest.lua", "game 'gta5'\nclient_script 'a.lua'\n");
    ws.write("res10/fxmanifest.lua", "game 'rdr3'\nclient_script 'a.lua'\n");
    ws.write("res1/a.lua", "");
    let file = ws.write("res10/a.lua", "");
    let index = scanned(&ws).await;

    assert_eq!(index.get_game_support(&file), vec!["rdr3"]);
    assert_eq!(index.get_resource_path_from_file(&file), Some(ws.path("res10")));
    assert_eq!(index.get_resource_path_from_file(&ws.path("res1/a.lua")), Some(ws.path("res1")));
}

#[tokio::test]
async fn test_nested_resource_owns_its_files() {
    let ws = Workspace::new();
    ws.write("outer/fxmanifest.lua", "game 'gta5'\nclient_scripts { '**/*.lua' }\n");
    ws.write("outer/inner/fxmanifest.lua", "game 'rdr3'\nserver_script 'main.lua'\n");
    let outer_file = ws.write("outer/client.lua", "");
    let inner_file = ws.write("outer/inner/main.lua", "");
    let index = scanned(&ws).await;

    assert_eq!(index.get_script_type(&outer_file), ScriptType::Client);
    assert_eq!(index.get_script_type(&inner_file), ScriptType::Server);
    assert_eq!(index.get_game_support(&inner_file), vec!["rdr3"]);

    let outer = index.resource(&ws.path("outer")).unwrap();
    assert!(!outer.client_files.contains(&inner_file));
    assert!(!outer.client_files.contains(&ws.path("outer/inner/fxmanifest.lua")));
}

#[tokio::test]
async fn test_fxmanifest_preferred_over_legacy_name() {
    let ws = Workspace::new();
    ws.write("res/__resource.lua", "client_script 'legacy.lua'\n");
    ws.write("res/fxmanifest.lua", "client_script 'modern.lua'\n");
    ws.write("res/legacy.lua", "");
    ws.write("res/modern.lua", "");
    let index = scanned(&ws).await;

    assert_eq!(index.resource_count(), 1);
    assert_eq!(index.get_script_type(&ws.path("res/modern.lua")), ScriptType::Client);
    assert_eq!(index.get_script_type(&ws.path("res/legacy.lua")), ScriptType::Unknown);

    // rescanning through the legacy name still resolves the preferred manifest
    index.rescan_resource(&ws.path("res/__resource.lua")).await;
    assert_eq!(
        index.resource(&ws.path("res")).map(|r| r.manifest.path),
        Some(ws.path("res/fxmanifest.lua"))
    );
}

#[tokio::test]
async fn test_ensure_classified_rescans_once() {
    let ws = basic_workspace();
    let index = scanned(&ws).await;

    let late = ws.write("res/client/late.lua", "");
    assert_eq!(index.get_script_type(&late), ScriptType::Unknown);
    assert_eq!(index.ensure_classified(&late).await, ScriptType::Client);
    assert_eq!(index.ensure_classified(&ws.path("res/readme.lua")).await, ScriptType::Unknown);
}

#[tokio::test]
async fn test_events_keep_index_in_sync() {
    let ws = basic_workspace();
    let index = scanned(&ws).await;

    // new script matching a glob
    let created = ws.write("res/client/new.lua", "");
    index.apply_event(WorkspaceEvent::Created(created.clone())).await;
    assert_eq!(index.get_script_type(&created), ScriptType::Client);

    // manifest edit
    let manifest = ws.write("res/fxmanifest.lua", "game 'rdr3'\nshared_scripts { 'client/*.lua' }\n");
    index.apply_event(WorkspaceEvent::Changed(manifest.clone())).await;
    assert_eq!(index.get_script_type(&created), ScriptType::Shared);
    assert_eq!(index.get_game_support(&created), vec!["rdr3"]);

    // script removed
    ws.remove("res/client/new.lua");
    index.apply_event(WorkspaceEvent::Removed(created.clone())).await;
    let resource = index.resource(&ws.path("res")).unwrap();
    assert!(!resource.shared_files.contains(&created));

    // manifest removed
    ws.remove("res/fxmanifest.lua");
    index.apply_event(WorkspaceEvent::Removed(manifest)).await;
    assert_eq!(index.resource_count(), 0);
    assert_eq!(index.get_script_type(&ws.path("res/client/a.lua")), ScriptType::Unknown);
}

#[tokio::test]
async fn test_new_resource_directory_and_rename() {
    let ws = Workspace::new();
    let index = scanned(&ws).await;
    assert_eq!(index.resource_count(), 0);

    ws.write("fresh/fxmanifest.lua", "client_script 'a.lua'\n");
    ws.write("fresh/a.lua", "");
    index.apply_event(WorkspaceEvent::Created(ws.path("fresh"))).await;
    assert_eq!(index.get_script_type(&ws.path("fresh/a.lua")), ScriptType::Client);

    std::fs::rename(ws.path("fresh"), ws.path("renamed")).unwrap();
    index
        .apply_event(WorkspaceEvent::Renamed {
            from: ws.path("fresh"),
            to: ws.path("renamed"),
        })
        .await;

    let roots: Vec<PathBuf> = index.resources().into_iter().map(|r| r.root).collect();
    assert_eq!(roots, vec![ws.path("renamed")]);
    assert_eq!(index.get_script_type(&ws.path("renamed/a.lua")), ScriptType::Client);
}

#[tokio::test]
async fn test_clear_all_caches() {
    let ws = basic_workspace();
    let index = scanned(&ws).await;
    assert_eq!(index.get_script_type(&ws.path("res/config.lua")), ScriptType::Shared);

    index.clear_all_caches();
    assert_eq!(index.resource_count(), 0);
    assert_eq!(index.get_script_type(&ws.path("res/config.lua")), ScriptType::Unknown);
}

#[tokio::test]
async fn test_unreadable_manifest_does_not_abort_scan() {
    let ws = basic_workspace();
    let broken = ws.write("broken/fxmanifest.lua", "client_script 'a.lua'\n");
    ws.write("broken/a.lua", "");

    let fs = Arc::new(ScriptedFs::default());
    fs.deny_read(broken);
    let index = ws.index_with(fs);
    index.scan_workspace().await;

    assert_eq!(index.resource_count(), 1);
    assert!(index.resource(&ws.path("broken")).is_none());
    assert_eq!(index.get_script_type(&ws.path("res/client/a.lua")), ScriptType::Client);
    assert_eq!(index.get_script_type(&ws.path("broken/a.lua")), ScriptType::Unknown);
}

#[tokio::test]
async fn test_unreadable_manifest_keeps_previous_entry() {
    let ws = basic_workspace();
    let fs = Arc::new(ScriptedFs::default());
    let index = ws.index_with(fs.clone());
    index.scan_workspace().await;
    let before = index.resource(&ws.path("res")).unwrap();

    let manifest = ws.write("res/fxmanifest.lua", "server_script 'client/a.lua'\n");
    fs.deny_read(manifest.clone());
    index.rescan_resource(&manifest).await;

    assert_eq!(index.resource(&ws.path("res")), Some(before));
    assert_eq!(index.get_script_type(&ws.path("res/client/a.lua")), ScriptType::Client);
}

#[tokio::test]
async fn test_unlisted_file_rescans_once_per_resource_state() {
    let ws = basic_workspace();
    let fs = Arc::new(ScriptedFs::default());
    let index = ws.index_with(fs.clone());
    index.scan_workspace().await;

    let readme = ws.path("res/readme.lua");
    let reads = fs.read_count();
    assert_eq!(index.ensure_classified(&readme).await, ScriptType::Unknown);
    assert_eq!(fs.read_count(), reads + 1);

    for _ in 0..5 {
        assert_eq!(index.ensure_classified(&readme).await, ScriptType::Unknown);
    }
    assert_eq!(fs.read_count(), reads + 1);

    // once the manifest changes, the file gets another chance
    let manifest = ws.write("res/fxmanifest.lua", "shared_script 'readme.lua'\n");
    index.apply_event(WorkspaceEvent::Changed(manifest)).await;
    assert_eq!(index.ensure_classified(&readme).await, ScriptType::Shared);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_scripts_and_resources() {
    use std::os::unix::fs::symlink;

    let ws = Workspace::new();
    ws.write(
        "res/fxmanifest.lua",
        indoc! {r#"
            client_scripts { 'client/*.lua' }
            server_script 'server/a.lua'
        "#},
    );
    let target = ws.write("shared_code/a.lua", "");
    std::fs::create_dir_all(ws.path("res/client")).unwrap();
    std::fs::create_dir_all(ws.path("res/server")).unwrap();
    symlink(&target, ws.path("res/client/a.lua")).unwrap();
    symlink(&target, ws.path("res/server/a.lua")).unwrap();

    let outside = Workspace::new();
    outside.write("real_res/fxmanifest.lua", "client_script 'main.lua'\n");
    outside.write("real_res/main.lua", "");
    symlink(outside.path("real_res"), ws.path("linked_res")).unwrap();

    let index = scanned(&ws).await;

    assert_eq!(index.get_script_type(&ws.path("res/client/a.lua")), ScriptType::Client);
    assert_eq!(index.get_script_type(&ws.path("res/server/a.lua")), ScriptType::Server);
    assert!(index.resource(&ws.path("linked_res")).is_some());
    assert_eq!(index.get_script_type(&ws.path("linked_res/main.lua")), ScriptType::Client);
}
