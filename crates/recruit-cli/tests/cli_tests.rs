use pretty_assertions::assert_eq;
use recruit_cli::{execute, render_tree, CommandError, LocalIdentityProvider, TreeCommand};
use recruit_sync::{JsonFileStore, SessionPhase, SyncConfig, SyncController};
use recruit_test_utils::name_at;
use std::path::Path;
use std::sync::Arc;

async fn open(data_dir: &Path, identity: Option<&str>) -> SyncController {
    let store = Arc::new(JsonFileStore::new(data_dir));
    let provider = LocalIdentityProvider::new(data_dir, identity.map(str::to_string));
    let sync = SyncController::new(SyncConfig::default(), store);
    sync.connect(&provider).await;
    assert_eq!(sync.wait_until_settled().await, SessionPhase::Ready);
    sync
}

fn set(path: &str, name: &str) -> TreeCommand {
    TreeCommand::Set {
        path: path.to_string(),
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_edits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let sync = open(dir.path(), Some("alice")).await;
        execute(&sync, &set("0", "Alice")).await.unwrap();
        execute(&sync, &set("0.2", "Carol")).await.unwrap();
        sync.flush().await;
    }

    let sync = open(dir.path(), Some("alice")).await;
    let tree = sync.tree();
    assert_eq!(name_at(&tree, "0"), "Alice");
    assert_eq!(name_at(&tree, "0.2"), "Carol");
    assert!(render_tree(&tree).contains("[0.2] ○ Carol"));
}

#[tokio::test]
async fn test_identities_have_separate_trees() {
    let dir = tempfile::tempdir().unwrap();
    {
        let sync = open(dir.path(), Some("alice")).await;
        execute(&sync, &set("1", "Only Alice")).await.unwrap();
    }

    let sync = open(dir.path(), Some("bob")).await;
    assert_eq!(name_at(&sync.tree(), "1"), "");
}

#[tokio::test]
async fn test_anonymous_session_reuses_stored_identity() {
    let dir = tempfile::tempdir().unwrap();
    let first_identity = {
        let sync = open(dir.path(), None).await;
        execute(&sync, &set("2", "Anon's pick")).await.unwrap();
        sync.identity().unwrap()
    };

    let sync = open(dir.path(), None).await;
    assert_eq!(sync.identity(), Some(first_identity));
    assert_eq!(name_at(&sync.tree(), "2"), "Anon's pick");
}

#[tokio::test]
async fn test_clear_collapses_and_reset_blanks() {
    let dir = tempfile::tempdir().unwrap();
    let sync = open(dir.path(), Some("alice")).await;

    execute(&sync, &set("0", "Alice")).await.unwrap();
    execute(&sync, &set("0.0", "Bob")).await.unwrap();
    let tree = execute(&sync, &TreeCommand::Clear { path: "0".into() })
        .await
        .unwrap();
    assert_eq!(tree.len(), 4);

    execute(&sync, &set("1", "Dana")).await.unwrap();
    let tree = execute(&sync, &TreeCommand::Reset).await.unwrap();
    assert_eq!(tree.filled_count(), 0);
}

#[tokio::test]
async fn test_unknown_path_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let sync = open(dir.path(), Some("alice")).await;
    let err = execute(&sync, &set("0.0", "Too deep")).await.unwrap_err();
    assert!(matches!(err, CommandError::UnknownPath(_)));
}
