//! End-to-end tests for sessions writing to document collections.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;

use taskpad_app::{
    DocumentCollection, MemoryCollection, PersistenceGateway, ProjectConfig, Screen, Submission, TodoSession,
};
use taskpad_core::TaskDocument;
use taskpad_store_git::GitCollection;
use tempfile::TempDir;
use tokio::runtime::Handle;

fn add_task<C: DocumentCollection>(session: &mut TodoSession<C>, title: &str, date: Option<&str>) -> Submission {
    session.open_create_form();
    let form = session.form_mut().expect("form is open");
    form.set_title(title);
    if let Some(date) = date {
        form.toggle_date_limit();
        form.set_date(date);
    }
    session.submit_form().expect("submit succeeds")
}

#[tokio::test]
async fn failed_remote_write_keeps_local_task() {
    let (gateway, feed) =
        PersistenceGateway::new(MemoryCollection::failing("permission denied"), "tasks", Handle::current());
    let mut session = TodoSession::with_gateway(gateway, feed);

    let submission = add_task(&mut session, "Buy milk", None);
    assert_eq!(session.screen(), Screen::List);
    submission.save.expect("new tasks are saved").await.unwrap();

    let failures = session.drain_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task.id, submission.task);
    assert!(failures[0].error.to_string().contains("permission denied"));

    assert_eq!(session.tasks().len(), 1);
    assert_eq!(session.tasks()[0].title, "Buy milk");
}

#[tokio::test]
async fn saves_land_in_the_configured_collection() {
    let config = ProjectConfig::from_toml("[persistence]\ncollection = \"chores\"\n").unwrap();
    let mut session = TodoSession::from_config(&config, MemoryCollection::new(), Handle::current());
    assert!(session.is_persistent());

    let first = add_task(&mut session, "Buy milk", None);
    let second = add_task(&mut session, "Pay rent", Some("05/05/2025"));
    first.save.unwrap().await.unwrap();
    second.save.unwrap().await.unwrap();

    session.toggle(first.task).unwrap();
    assert!(session.drain_failures().is_empty());

    let written = session_documents(&session, "chores").await;
    let mut titles: Vec<_> = written.iter().map(|doc| doc.title.as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Buy milk", "Pay rent"]);
}

#[tokio::test]
async fn disabled_persistence_skips_remote_writes() {
    let config = ProjectConfig::from_toml("[persistence]\nenabled = false\n").unwrap();
    let mut session = TodoSession::from_config(&config, MemoryCollection::new(), Handle::current());

    let submission = add_task(&mut session, "Buy milk", None);
    assert!(submission.save.is_none());
    assert!(!session.is_persistent());
    assert_eq!(session.tasks().len(), 1);
}

#[tokio::test]
async fn git_collection_receives_task_documents() {
    let temp = TempDir::new().unwrap();
    git2::Repository::init(temp.path()).unwrap();
    fs::create_dir(temp.path().join(".taskpad")).unwrap();
    fs::write(temp.path().join(".taskpad/config.toml"), "[persistence]\ncollection = \"tasks\"\n").unwrap();

    let config = ProjectConfig::from_workdir(temp.path()).unwrap();
    let collection = Arc::new(GitCollection::open(temp.path()).unwrap());
    let mut session = TodoSession::from_config(&config, Arc::clone(&collection), Handle::current());

    let first = add_task(&mut session, "Buy milk", None);
    first.save.unwrap().await.unwrap();
    let second = add_task(&mut session, "Pay rent", Some("05/05/2025"));
    second.save.unwrap().await.unwrap();
    assert!(session.drain_failures().is_empty());

    let documents = collection.documents("tasks").await.unwrap();
    assert_eq!(
        documents,
        vec![
            TaskDocument {
                title: "Buy milk".into(),
                date: None,
            },
            TaskDocument {
                title: "Pay rent".into(),
                date: Some("05/05/2025".into()),
            },
        ]
    );
}

async fn session_documents<C: DocumentCollection>(session: &TodoSession<C>, name: &str) -> Vec<TaskDocument> {
    session
        .collection()
        .expect("session persists")
        .documents(name)
        .await
        .map_err(Into::into)
        .unwrap_or_else(|err: anyhow::Error| panic!("read documents: {err}"))
}
