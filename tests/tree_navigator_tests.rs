mod common;

use std::sync::Arc;

use common::{Call, MockTransport, entry, sha};
use ggnav::detail::DetailSource;
use ggnav::error::NOT_FOUND_MESSAGE;
use ggnav::transport::FileRequest;
use ggnav::tree::{ROOT, TreeEntry};
use ggnav::{
    CommitResolver, FetchStatus, Fetched, LoadOutcome, NavError, Notice, SelectOutcome, Session,
    SessionConfig, TreeNavigator,
};

const COMMIT: usize = 0xc0ffee;

fn top_level() -> Vec<TreeEntry> {
    vec![
        entry("src", "src", "directory", &sha(1)),
        entry("README.md", "README.md", "modified file", &sha(2)),
        entry("vendor", "vendor", "", &sha(3)),
    ]
}

async fn setup() -> (TreeNavigator<MockTransport>, Arc<MockTransport>, Arc<Session>) {
    let (session, _notices) = Session::new(SessionConfig::default());
    session.set_initial_tree(top_level()).await;
    let transport = MockTransport::new();
    (
        TreeNavigator::new(session.clone(), transport.clone()),
        transport,
        session,
    )
}

#[tokio::test]
async fn test_root_expansion_uses_initial_tree() {
    let (navigator, transport, _session) = setup().await;

    let children = navigator.expand(ROOT).await.unwrap();

    let names: Vec<&str> = children.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["src", "README.md", "vendor"]);
    assert!(children[0].is_dir());
    assert!(children[1].is_file());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_directory_children_fetched_once() {
    let (navigator, transport, _session) = setup().await;
    transport.set_tree(
        &sha(1),
        vec![
            entry("lib.rs", "src/lib.rs", "file", &sha(10)),
            entry("bin", "src/bin", "directory", &sha(11)),
        ],
    );
    navigator.expand(ROOT).await.unwrap();

    let first = navigator.expand("src").await.unwrap();
    let second = navigator.expand("src").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(
        transport.calls(),
        vec![Call::Tree(sha(1), Some("src".to_string()))]
    );
}

#[tokio::test]
async fn test_expanding_file_or_reference_has_no_children() {
    let (navigator, transport, _session) = setup().await;
    navigator.expand(ROOT).await.unwrap();

    assert!(navigator.expand("README.md").await.unwrap().is_empty());
    assert!(navigator.expand("vendor").await.unwrap().is_empty());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_path_is_an_error() {
    let (navigator, transport, _session) = setup().await;

    assert_eq!(
        navigator.expand("nope").await.unwrap_err(),
        NavError::UnknownNode("nope".into())
    );
    assert_eq!(
        navigator.select("nope").await.unwrap_err(),
        NavError::UnknownNode("nope".into())
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_selecting_file_twice_fetches_once() {
    let (navigator, transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();

    assert_eq!(
        navigator.select("README.md").await.unwrap(),
        SelectOutcome::Fetched(FetchStatus::Success)
    );
    assert_eq!(
        navigator.select("README.md").await.unwrap(),
        SelectOutcome::Cached
    );

    assert_eq!(transport.file_calls(), 1);
    let detail = session.detail().await;
    assert_eq!(detail.title(), Some("README.md"));
    assert_eq!(detail.revision(), 2);
    assert_eq!(
        detail.source(),
        Some(&DetailSource::File {
            path: "README.md".into(),
            content_id: sha(2),
        })
    );
}

#[tokio::test]
async fn test_eager_content_needs_no_fetch() {
    let (navigator, transport, session) = setup().await;
    let mut eager = entry("notes.txt", "notes.txt", "created file", &sha(20));
    eager.metadata.content = Some("<pre>hello</pre>".into());
    session.set_initial_tree(vec![eager]).await;
    navigator.expand(ROOT).await.unwrap();

    let outcome = navigator.select("notes.txt").await.unwrap();

    assert_eq!(outcome, SelectOutcome::Cached);
    assert_eq!(transport.call_count(), 0);
    assert_eq!(session.detail().await.content(), Some("<pre>hello</pre>"));
}

#[tokio::test]
async fn test_nested_children_supplied_up_front() {
    let (navigator, transport, session) = setup().await;
    let mut dir = entry("docs", "docs", "directory", &sha(30));
    dir.children = Some(vec![entry("guide.md", "docs/guide.md", "file", &sha(31))]);
    session.set_initial_tree(vec![dir]).await;
    navigator.expand(ROOT).await.unwrap();

    let children = navigator.expand("docs").await.unwrap();

    assert_eq!(children.len(), 1);
    assert_eq!(children[0].full_name, "docs/guide.md");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_selecting_directory_is_not_a_file() {
    let (navigator, transport, _session) = setup().await;
    navigator.expand(ROOT).await.unwrap();

    assert_eq!(
        navigator.select("src").await.unwrap(),
        SelectOutcome::NotAFile
    );
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_modified_file_requests_diff() {
    let (navigator, transport, session) = setup().await;
    let mut modified = entry("main.rs", "src/main.rs", "modified file", &sha(40));
    modified.metadata.old_sha = Some(sha(41));
    session.set_initial_tree(vec![modified]).await;
    navigator.expand(ROOT).await.unwrap();
    transport.set_file(
        &sha(40),
        Ok(Fetched::success(
            r#"<table><tr><td><a name="changed_line"></a>+ fn main()</td></tr></table>"#.into(),
        )),
    );

    navigator.select("src/main.rs").await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![Call::File(FileRequest {
            content_id: sha(40),
            compare_to: Some(sha(41)),
            filename_hint: Some("src/main.rs".into()),
        })]
    );
    assert!(session.detail().await.has_jump_link());
}

#[tokio::test]
async fn test_plain_file_has_no_jump_link() {
    let (navigator, _transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();

    navigator.select("README.md").await.unwrap();

    assert!(!session.detail().await.has_jump_link());
}

#[tokio::test]
async fn test_file_select_shares_gate_with_commit_load() {
    let (navigator, transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();
    let resolver = CommitResolver::new(session.clone(), transport.clone());
    let release = transport.hold_next();

    let pending = {
        let navigator = navigator.clone();
        tokio::spawn(async move { navigator.select("README.md").await })
    };
    while transport.file_calls() == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        resolver.load_commit(&sha(COMMIT)).await.unwrap(),
        LoadOutcome::Dropped
    );
    assert_eq!(
        navigator.select("README.md").await.unwrap(),
        SelectOutcome::Dropped
    );
    assert_eq!(transport.detail_calls(), 0);

    release.send(()).unwrap();
    assert_eq!(
        pending.await.unwrap().unwrap(),
        SelectOutcome::Fetched(FetchStatus::Success)
    );
    assert!(!session.gate().is_busy());
}

#[tokio::test]
async fn test_failed_file_fetch_releases_gate() {
    let (session, mut notices) = Session::new(SessionConfig::default());
    session.set_initial_tree(top_level()).await;
    let transport = MockTransport::new();
    let navigator = TreeNavigator::new(session.clone(), transport.clone());
    navigator.expand(ROOT).await.unwrap();
    transport.set_file(
        &sha(2),
        Err(ggnav::FetchError::NotFound {
            target: format!("/sha/{}", sha(2)),
        }),
    );

    assert!(navigator.select("README.md").await.is_err());

    assert!(!session.gate().is_busy());
    assert!(session.tree().cached_content("README.md").is_none());
    assert_eq!(session.detail().await.content(), None);
    assert_eq!(
        notices.recv().await,
        Some(Notice::Alert(NOT_FOUND_MESSAGE.to_string()))
    );
}

#[tokio::test]
async fn test_commit_tree_replaces_previous_tree() {
    let (navigator, transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();
    transport.set_tree(
        &sha(COMMIT),
        vec![entry("Cargo.toml", "Cargo.toml", "file", &sha(50))],
    );

    let count = navigator.load_commit_tree(&sha(COMMIT)).await.unwrap();

    assert_eq!(count, 1);
    assert!(session.tree().node("src").is_none());
    let children = navigator.expand(ROOT).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].full_name, "Cargo.toml");
    assert_eq!(transport.calls(), vec![Call::Tree(sha(COMMIT), None)]);
}

#[tokio::test]
async fn test_children_fetched_for_old_commit_are_discarded() {
    let (navigator, transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();
    transport.set_tree(&sha(1), vec![entry("old.rs", "src/old.rs", "file", &sha(10))]);
    let release = transport.hold_next();

    let pending = {
        let navigator = navigator.clone();
        tokio::spawn(async move { navigator.expand("src").await })
    };
    while transport.tree_calls() == 0 {
        tokio::task::yield_now().await;
    }

    transport.set_tree(
        &sha(COMMIT),
        vec![entry("src", "src", "directory", &sha(60))],
    );
    transport.set_tree(&sha(60), vec![entry("new.rs", "src/new.rs", "file", &sha(61))]);
    navigator.load_commit_tree(&sha(COMMIT)).await.unwrap();

    release.send(()).unwrap();
    assert!(pending.await.unwrap().unwrap().is_empty());
    assert!(session.tree().node("src/old.rs").is_none());

    navigator.expand(ROOT).await.unwrap();
    let children = navigator.expand("src").await.unwrap();
    let names: Vec<&str> = children.iter().map(|c| c.full_name.as_str()).collect();
    assert_eq!(names, vec!["src/new.rs"]);
    assert_eq!(transport.tree_calls(), 3);
    assert!(
        transport
            .calls()
            .contains(&Call::Tree(sha(60), Some("src".to_string())))
    );
}

#[tokio::test]
async fn test_file_loaded_for_old_commit_is_discarded() {
    let (navigator, transport, session) = setup().await;
    navigator.expand(ROOT).await.unwrap();
    let release = transport.hold_next();

    let pending = {
        let navigator = navigator.clone();
        tokio::spawn(async move { navigator.select("README.md").await })
    };
    while transport.file_calls() == 0 {
        tokio::task::yield_now().await;
    }

    transport.set_tree(
        &sha(COMMIT),
        vec![entry("README.md", "README.md", "modified file", &sha(62))],
    );
    navigator.load_commit_tree(&sha(COMMIT)).await.unwrap();

    release.send(()).unwrap();
    assert_eq!(
        pending.await.unwrap().unwrap(),
        SelectOutcome::Discarded
    );
    assert!(!session.gate().is_busy());
    assert_eq!(session.detail().await.content(), None);
    assert!(session.tree().cached_content("README.md").is_none());

    navigator.expand(ROOT).await.unwrap();
    assert_eq!(
        navigator.select("README.md").await.unwrap(),
        SelectOutcome::Fetched(FetchStatus::Success)
    );
    assert_eq!(transport.file_calls(), 2);
    assert_eq!(
        session.detail().await.content(),
        Some(format!("<pre>{}</pre>", sha(62)).as_str())
    );
}
