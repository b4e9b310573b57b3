//! End-to-end sync and push handler tests against the in-memory store

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use sitedeploy::error::{DeployError, Result};
use sitedeploy::settings::Settings;
use sitedeploy::sync::{plan_directory, sync_directory, MemoryConnector, MemoryStore};
use sitedeploy::webhook::{
    Builder, CredentialProvider, Credentials, DeployOutcome, NoCredentials, PushHandler,
    SourceFetcher, StaticCredentials, TriggerEvent,
};
use sitedeploy::{config::HandlerConfig, SyncAction};

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

// ============================================================================
// DIRECTORY SYNC SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_changed_index_uploaded_and_stale_deleted() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "same");
    write(dir.path(), "index.html", "<h1>home</h1>");

    let store = MemoryStore::new("blog");
    store.insert("a.txt", b"same".to_vec());
    store.insert("old.txt", b"stale".to_vec());

    let plan = plan_directory(dir.path(), &store).await.unwrap();
    assert_eq!(plan.upload_keys(), vec!["index.html"]);
    assert_eq!(plan.delete_keys(), vec!["old.txt"]);
    assert_eq!(plan.unchanged, vec!["a.txt".to_string()]);
}

#[tokio::test]
async fn test_markdown_index_published_as_html() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.md", "# home");

    let store = MemoryStore::new("blog");
    let report = sync_directory(dir.path(), &store, &Settings::default().resolver())
        .await
        .unwrap();

    assert_eq!(store.keys(), vec!["index.html".to_string()]);
    assert_eq!(
        report.actions,
        vec![SyncAction::Upload {
            key: "index.html".to_string(),
            content_type: Some("text/html".to_string()),
            bytes: 6,
        }]
    );
}

#[tokio::test]
async fn test_settings_override_content_type() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "alpha");
    write(dir.path(), "feed", "<feed/>");

    let settings = Settings::parse(
        r#"{"bucket": "other-bucket", "content-type": {"a.txt": "text/plain; charset=utf-8", "feed": "application/atom+xml"}}"#,
    )
    .unwrap();
    assert_eq!(settings.bucket_or("blog"), "other-bucket");

    let store = MemoryStore::new(settings.bucket_or("blog"));
    sync_directory(dir.path(), &store, &settings.resolver())
        .await
        .unwrap();

    assert_eq!(
        store.object("a.txt").unwrap().content_type.as_deref(),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(
        store.object("feed").unwrap().content_type.as_deref(),
        Some("application/atom+xml")
    );
}

#[tokio::test]
async fn test_second_sync_is_a_no_op() {
    let dir = tempdir().unwrap();
    write(dir.path(), "index.html", "home");
    write(dir.path(), "css/site.css", "body{}");
    write(dir.path(), "posts/hello/index.md", "hello");

    let store = MemoryStore::new("blog");
    store.insert("posts/", Vec::new());
    let resolver = Settings::default().resolver();

    let first = sync_directory(dir.path(), &store, &resolver).await.unwrap();
    assert_eq!(first.uploaded(), 3);
    assert_eq!(first.deleted(), 0);

    let second = sync_directory(dir.path(), &store, &resolver).await.unwrap();
    assert!(second.actions.is_empty());
    assert_eq!(second.unchanged, 3);
    assert!(store.keys().contains(&"posts/".to_string()));
}

// ============================================================================
// PUSH HANDLER WITH FAKE COLLABORATORS
// ============================================================================

/// Copies a canned project tree into the work dir
struct FakeFetcher {
    work: PathBuf,
    files: Vec<(&'static str, &'static str)>,
    seen: Arc<Mutex<Vec<(String, String, Option<Credentials>)>>>,
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(
        &self,
        full_name: &str,
        branch: &str,
        credentials: Option<&Credentials>,
    ) -> Result<PathBuf> {
        self.seen.lock().push((
            full_name.to_string(),
            branch.to_string(),
            credentials.cloned(),
        ));
        let root = self.work.join("project");
        for (rel, body) in &self.files {
            write(&root, rel, body);
        }
        Ok(root)
    }
}

/// Copies `src/` into the output dir and exits with the given code
struct FakeBuilder {
    exit_code: i32,
    calls: Arc<Mutex<usize>>,
}

fn exit_status(code: i32) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}

#[async_trait]
impl Builder for FakeBuilder {
    async fn build(&self, source_root: &Path, output_dir: &str) -> Result<ExitStatus> {
        *self.calls.lock() += 1;
        let src = source_root.join("src");
        let out = source_root.join(output_dir);
        for entry in walkdir::WalkDir::new(&src) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let rel = entry.path().strip_prefix(&src).unwrap();
                let dest = out.join(rel);
                std::fs::create_dir_all(dest.parent().unwrap())?;
                std::fs::copy(entry.path(), dest)?;
            }
        }
        Ok(exit_status(self.exit_code))
    }
}

struct FailingCredentials;

#[async_trait]
impl CredentialProvider for FailingCredentials {
    async fn resolve(&self) -> Result<Option<Credentials>> {
        Err(DeployError::Credentials("key service unavailable".to_string()))
    }
}

struct Harness {
    _work: TempDir,
    handler: PushHandler,
    connector: MemoryConnector,
    fetches: Arc<Mutex<Vec<(String, String, Option<Credentials>)>>>,
    builds: Arc<Mutex<usize>>,
}

fn harness(
    files: Vec<(&'static str, &'static str)>,
    exit_code: i32,
    credentials: Box<dyn CredentialProvider>,
) -> Harness {
    let work = tempdir().unwrap();
    let connector = MemoryConnector::new();
    let fetches = Arc::new(Mutex::new(Vec::new()));
    let builds = Arc::new(Mutex::new(0));

    let handler = PushHandler::new(
        HandlerConfig {
            work_dir: work.path().to_path_buf(),
            ..Default::default()
        },
        credentials,
        Box::new(FakeFetcher {
            work: work.path().to_path_buf(),
            files,
            seen: fetches.clone(),
        }),
        Box::new(FakeBuilder {
            exit_code,
            calls: builds.clone(),
        }),
        Box::new(connector.clone()),
    );

    Harness {
        _work: work,
        handler,
        connector,
        fetches,
        builds,
    }
}

fn push_event(reference: &str) -> TriggerEvent {
    let payload = serde_json::json!({
        "ref": reference,
        "repository": {"name": "blog", "full_name": "alice/blog"}
    });
    let sns = serde_json::json!({"Records": [{"Sns": {"Message": payload.to_string()}}]});
    TriggerEvent::from_value(sns).unwrap()
}

#[tokio::test]
async fn test_push_to_default_branch_deploys() {
    let h = harness(
        vec![("Makefile", "all:"), ("src/index.md", "home"), ("src/a.txt", "a")],
        0,
        Box::new(StaticCredentials(Credentials::parse("bot:secret").unwrap())),
    );
    h.connector.store("blog").insert("old.txt", b"old".to_vec());

    let outcome = h.handler.handle(&push_event("refs/heads/master")).await.unwrap();

    let DeployOutcome::Deployed { bucket, report, .. } = outcome else {
        panic!("expected a deployment");
    };
    assert_eq!(bucket, "blog");
    assert_eq!(report.uploaded(), 2);
    assert_eq!(report.deleted(), 1);
    assert_eq!(
        h.connector.store("blog").keys(),
        vec!["a.txt".to_string(), "index.html".to_string()]
    );

    let fetches = h.fetches.lock();
    assert_eq!(fetches[0].0, "alice/blog");
    assert_eq!(fetches[0].1, "master");
    assert_eq!(fetches[0].2.as_ref().unwrap().username, "bot");
}

#[tokio::test]
async fn test_other_branch_does_nothing() {
    let h = harness(vec![("src/index.md", "home")], 0, Box::new(NoCredentials));

    let outcome = h.handler.handle(&push_event("refs/heads/feature")).await.unwrap();
    assert_eq!(
        outcome,
        DeployOutcome::Skipped {
            reference: "refs/heads/feature".to_string(),
            expected: "refs/heads/master".to_string(),
        }
    );
    assert!(h.fetches.lock().is_empty());
    assert_eq!(*h.builds.lock(), 0);
    assert!(h.connector.connected_buckets().is_empty());
}

#[tokio::test]
async fn test_settings_redirect_bucket() {
    let h = harness(
        vec![
            ("s3.json", r#"{"bucket": "other-bucket", "content-type": {"a.txt": "text/plain"}}"#),
            ("src/a.txt", "a"),
        ],
        0,
        Box::new(NoCredentials),
    );

    h.handler.handle(&push_event("refs/heads/master")).await.unwrap();
    assert_eq!(h.connector.connected_buckets(), vec!["other-bucket".to_string()]);
    assert_eq!(
        h.connector
            .store("other-bucket")
            .object("a.txt")
            .unwrap()
            .content_type
            .as_deref(),
        Some("text/plain")
    );
}

#[tokio::test]
async fn test_build_failure_leaves_bucket_alone() {
    let h = harness(vec![("src/a.txt", "a")], 2, Box::new(NoCredentials));

    let err = h.handler.handle(&push_event("refs/heads/master")).await.unwrap_err();
    assert!(matches!(err, DeployError::Build(_)));
    assert!(h.connector.connected_buckets().is_empty());
}

#[tokio::test]
async fn test_malformed_settings_abort_before_listing() {
    let h = harness(
        vec![("s3.json", "{not json"), ("src/a.txt", "a")],
        0,
        Box::new(NoCredentials),
    );

    let err = h.handler.handle(&push_event("refs/heads/master")).await.unwrap_err();
    assert!(matches!(err, DeployError::Settings(_)));
    assert!(h.connector.connected_buckets().is_empty());
}

#[tokio::test]
async fn test_credential_failure_stops_before_fetch() {
    let h = harness(vec![("src/a.txt", "a")], 0, Box::new(FailingCredentials));

    let err = h.handler.handle(&push_event("refs/heads/master")).await.unwrap_err();
    assert!(matches!(err, DeployError::Credentials(_)));
    assert!(h.fetches.lock().is_empty());
}
