//! End-to-end scenarios over the full stack: façade, executor, envelope,
//! datasource, workspace, and reconciliation.

use buttercup_core::{
    Archive, ButtercupError, Credentials, Datasource, ExecutorConfig, FileDatasource, Flattener,
    TextDatasource, Workspace,
};
use futures_lite::future::block_on;

fn quiet_archive() -> Archive {
    Archive::with_config(ExecutorConfig::without_padding())
}

fn password(raw: &str) -> Credentials {
    Credentials::from_password(raw)
}

fn scratch_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("buttercup-e2e-{}-{}.bcup", std::process::id(), name))
}

/// Create a group with one entry, save, reload with the same password, and
/// find everything intact.
#[test]
fn create_save_reload() {
    let path = scratch_path("create-save-reload");

    let mut archive = Archive::new();
    let banking = archive.create_group("Banking").unwrap();
    let login = archive.group_mut(&banking).unwrap().create_entry().unwrap();
    let mut handle = archive.entry_mut(&login).unwrap();
    handle.set_property("username", "alice").unwrap();
    handle.set_property("password", "p").unwrap();

    let mut workspace = Workspace::new(
        archive,
        Box::new(FileDatasource::new(&path)),
        password("hunter2"),
    );
    block_on(workspace.save()).unwrap();

    // Reload through a completely fresh datasource
    let mut fresh_source = FileDatasource::new(&path);
    let lines = block_on(fresh_source.load(&password("hunter2"))).unwrap();
    let reloaded = Archive::from_history(&lines).unwrap();

    assert!(reloaded.structurally_equals(workspace.archive()));
    let groups = reloaded.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].title(), "Banking");
    let entries = groups[0].entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].property("username"), Some("alice"));
    assert_eq!(entries[0].property("password"), Some("p"));

    std::fs::remove_file(&path).ok();
}

/// Reloading with the wrong password fails authentication and leaves the
/// local archive untouched.
#[test]
fn wrong_password_rejected() {
    let mut archive = quiet_archive();
    let banking = archive.create_group("Banking").unwrap();
    let entry = archive.group_mut(&banking).unwrap().create_entry().unwrap();
    archive
        .entry_mut(&entry)
        .unwrap()
        .set_property("password", "p")
        .unwrap();

    let mut workspace = Workspace::new(archive, Box::new(TextDatasource::new()), password("hunter2"));
    block_on(workspace.save()).unwrap();
    let history_before = workspace.archive().history();

    workspace.update_primary_credentials(password("hunter3"));
    let err = block_on(workspace.update()).unwrap_err();
    assert!(matches!(err, ButtercupError::AuthenticationFailure));
    assert_eq!(workspace.archive().history(), history_before);
}

/// Non-conflicting concurrent edits both survive an update.
#[test]
fn non_conflicting_concurrent_edits_merge() {
    let mut base = quiet_archive();
    let shared = base.create_group("Shared").unwrap();

    // Remote adds E2 from the common point and saves
    let mut remote = Archive::from_history(&base.history()).unwrap();
    let e2 = remote.group_mut(&shared).unwrap().create_entry().unwrap();
    remote
        .entry_mut(&e2)
        .unwrap()
        .set_property("username", "remote-user")
        .unwrap();
    let mut remote_store = TextDatasource::new();
    block_on(remote_store.save(&remote.history(), &password("hunter2"))).unwrap();

    // Local adds E1 from the same common point
    let mut local = Archive::from_history(&base.history()).unwrap();
    let e1 = local.group_mut(&shared).unwrap().create_entry().unwrap();
    local
        .entry_mut(&e1)
        .unwrap()
        .set_property("username", "local-user")
        .unwrap();

    let mut datasource = TextDatasource::new();
    datasource.set_content(remote_store.content().unwrap());
    let mut workspace = Workspace::new(local, Box::new(datasource), password("hunter2"));
    block_on(workspace.update()).unwrap();

    let merged = workspace.archive();
    let group = merged.find_group_by_id(&shared).unwrap();
    assert_eq!(group.entries().len(), 2);
    assert!(merged.find_entry_by_id(&e1).is_some());
    assert!(merged.find_entry_by_id(&e2).is_some());
}

/// A local edit beats a concurrent remote delete: both tails diverged, so
/// the destructive command is stripped and the entry survives edited.
#[test]
fn concurrent_edit_beats_delete() {
    let mut base = quiet_archive();
    let shared = base.create_group("Shared").unwrap();
    let entry = base.group_mut(&shared).unwrap().create_entry().unwrap();
    base.entry_mut(&entry)
        .unwrap()
        .set_property("password", "original")
        .unwrap();

    // Remote deletes the entry
    let mut remote = Archive::from_history(&base.history()).unwrap();
    remote.entry_mut(&entry).unwrap().delete().unwrap();
    let mut remote_store = TextDatasource::new();
    block_on(remote_store.save(&remote.history(), &password("hunter2"))).unwrap();

    // Local edits the entry's password
    let mut local = Archive::from_history(&base.history()).unwrap();
    local
        .entry_mut(&entry)
        .unwrap()
        .set_property("password", "edited")
        .unwrap();

    let mut datasource = TextDatasource::new();
    datasource.set_content(remote_store.content().unwrap());
    let mut workspace = Workspace::new(local, Box::new(datasource), password("hunter2"));
    block_on(workspace.update()).unwrap();

    let survivor = workspace.archive().find_entry_by_id(&entry).unwrap();
    assert_eq!(survivor.property("password"), Some("edited"));
}

/// Moving a group into its own descendant is rejected without touching the
/// archive or its dirty state.
#[test]
fn move_into_descendant_rejected() {
    let mut archive = quiet_archive();
    let outer = archive.create_group("Outer").unwrap();
    let inner = archive
        .group_mut(&outer)
        .unwrap()
        .create_group("Inner")
        .unwrap();

    archive.clear_dirty_state();
    let history_before = archive.history();

    let err = archive
        .group_mut(&outer)
        .unwrap()
        .move_to(&inner)
        .unwrap_err();
    assert!(matches!(err, ButtercupError::InvalidMove { .. }));
    assert_eq!(archive.history(), history_before);
    assert!(!archive.is_dirty());

    // The tree still has Inner under Outer
    let outer_view = archive.find_group_by_id(&outer).unwrap();
    assert_eq!(outer_view.groups()[0].id(), inner);
}

/// Flattening a long history is idempotent and preserves the tree.
#[test]
fn flatten_is_idempotent_over_large_history() {
    let mut archive = quiet_archive();
    let group = archive.create_group("Bulk").unwrap();
    let entry = archive.group_mut(&group).unwrap().create_entry().unwrap();
    while archive.history().len() < 500 {
        let value = format!("value-{}", archive.history().len());
        archive
            .entry_mut(&entry)
            .unwrap()
            .set_property("churn", &value)
            .unwrap();
    }
    let original = Archive::from_history(&archive.history()).unwrap();

    let flattener = Flattener::new(0);
    flattener.flatten(&mut archive).unwrap();
    let first_len = archive.history().len();

    flattener.flatten(&mut archive).unwrap();
    assert_eq!(archive.history().len(), first_len);
    assert!(archive.structurally_equals(&original));
}

/// Padding cadence inserts pad lines, and they are transparent to replay.
#[test]
fn padding_is_transparent_end_to_end() {
    let mut padded = Archive::new();
    let group = padded.create_group("Banking").unwrap();
    padded
        .group_mut(&group)
        .unwrap()
        .set_attribute("icon", "bank")
        .unwrap();

    let history = padded.history();
    assert!(history.iter().any(|line| line.starts_with("pad ")));

    let stripped: Vec<String> = history
        .iter()
        .filter(|line| !line.starts_with("pad "))
        .cloned()
        .collect();
    let replayed = Archive::from_history(&stripped).unwrap();
    assert!(padded.structurally_equals(&replayed));
}

/// The dirty flag follows the save lifecycle across edits and reloads.
#[test]
fn dirty_discipline_across_saves() {
    let mut archive = quiet_archive();
    archive.create_group("Banking").unwrap();
    let mut workspace = Workspace::new(archive, Box::new(TextDatasource::new()), password("pw"));

    assert!(workspace.archive().is_dirty());
    block_on(workspace.save()).unwrap();
    assert!(!workspace.archive().is_dirty());

    workspace
        .archive_mut()
        .set_attribute("color", "blue")
        .unwrap();
    assert!(workspace.archive().is_dirty());
    block_on(workspace.save()).unwrap();
    assert!(!workspace.archive().is_dirty());
}
