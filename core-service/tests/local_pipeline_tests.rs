//! End-to-end tests over local directories and spool queues
//!
//! Each test lays out backend directories in a temp dir, describes them in a
//! remote configuration file and drives `schedule`, `compile` and
//! `synchronize` through the bootstrapped [`CoreService`].

use core_runtime::config::{RemoteConfigService, RuntimeConfig, TargetFailurePolicy};
use core_service::{bootstrap, CoreError, CoreService};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const JOB_LIST: &str = r#"[
    {"name": "reports",
     "source": {"remote": "inbox", "root": "incoming", "pattern": "\\.csv$", "delete": true},
     "targets": [
        {"remote": "archive", "root": "out", "pattern": "{{.Dir}}/{{.Name}}.{{.Extension}}",
         "dateFormat": "", "timeFormat": ""},
        {"remote": "arch/ive", "root": "copy", "pattern": "{{.Name}}.{{.Extension}}",
         "dateFormat": "", "timeFormat": ""}
     ]}
]"#;

struct Layout {
    dir: TempDir,
}

impl Layout {
    fn new() -> Self {
        let layout = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        for backend in ["config", "inbox", "archive", "state"] {
            std::fs::create_dir_all(layout.backend(backend)).unwrap();
        }

        let remotes = format!(
            r#"{{
                "config":  {{ "type": "local", "root": {:?} }},
                "inbox":   {{ "type": "local", "root": {:?} }},
                "archive": {{ "type": "local", "root": {:?} }},
                "state":   {{ "type": "local", "root": {:?} }}
            }}"#,
            layout.backend("config"),
            layout.backend("inbox"),
            layout.backend("archive"),
            layout.backend("state"),
        );
        std::fs::write(layout.remotes_file(), remotes).unwrap();
        layout.write("config", "jobs.json", JOB_LIST);
        layout
    }

    fn backend(&self, name: &str) -> PathBuf {
        self.dir.path().join("remotes").join(name)
    }

    fn remotes_file(&self) -> PathBuf {
        self.dir.path().join("remotes.json")
    }

    fn write(&self, backend: &str, path: &str, contents: &str) {
        let full = self.backend(backend).join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    fn read(&self, backend: &str, path: &str) -> Option<String> {
        std::fs::read_to_string(self.backend(backend).join(path)).ok()
    }

    fn exists(&self, backend: &str, path: &str) -> bool {
        self.backend(backend).join(path).exists()
    }

    fn config(&self) -> RuntimeConfig {
        RuntimeConfig::builder()
            .job_config("config", "jobs.json")
            .data_remote("state")
            .data_root("transferless")
            .queue_root(self.dir.path().join("queues"))
            .remote_config(RemoteConfigService::File(self.remotes_file()))
            .target_failure_policy(TargetFailurePolicy::Continue)
            .build()
            .unwrap()
    }

    async fn service(&self) -> CoreService {
        bootstrap(self.config()).await.unwrap()
    }
}

fn pending(queue_root: &Path, queue: &str) -> usize {
    std::fs::read_dir(queue_root.join(queue).join("pending"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_schedule_compile_synchronize() {
    let layout = Layout::new();
    layout.write("inbox", "incoming/2024/q1.csv", "a,b\n1,2\n");
    layout.write("inbox", "incoming/notes.txt", "skip me");

    let service = layout.service().await;
    let queue_root = service.config().queue_root.clone();

    let scheduled = service.schedule().await.unwrap();
    assert_eq!(scheduled.scheduled, vec!["reports"]);
    assert_eq!(pending(&queue_root, &service.config().job_queue), 1);

    let compiled = service
        .compile_worker()
        .unwrap()
        .drain_until_empty()
        .await
        .unwrap();
    assert_eq!(compiled.succeeded, 1);
    assert_eq!(pending(&queue_root, &service.config().transfer_queue), 1);
    assert_eq!(
        layout.read("state", "transferless/mutex/reports").as_deref(),
        Some("false")
    );
    assert!(layout.exists("state", "transferless/modtime/reports"));

    let synced = service
        .synchronize_worker()
        .drain_until_empty()
        .await
        .unwrap();
    assert_eq!(synced.succeeded, 1);
    assert_eq!(synced.failed(), 0);

    assert_eq!(
        layout.read("archive", "out/2024/q1.csv").as_deref(),
        Some("a,b\n1,2\n")
    );
    assert_eq!(
        layout.read("archive", "copy/q1.csv").as_deref(),
        Some("a,b\n1,2\n")
    );
    assert!(!layout.exists("inbox", "incoming/2024/q1.csv"));
    assert!(layout.exists("inbox", "incoming/notes.txt"));
}

#[tokio::test]
async fn test_second_compilation_enqueues_nothing() {
    let layout = Layout::new();
    layout.write("inbox", "incoming/q1.csv", "1");

    let service = layout.service().await;
    let worker = service.compile_worker().unwrap();

    service.schedule().await.unwrap();
    worker.drain_until_empty().await.unwrap();
    service.schedule().await.unwrap();
    worker.drain_until_empty().await.unwrap();

    let queue_root = &service.config().queue_root;
    assert_eq!(pending(queue_root, &service.config().transfer_queue), 1);
}

#[tokio::test]
async fn test_locked_job_is_acknowledged_without_transfers() {
    let layout = Layout::new();
    layout.write("inbox", "incoming/q1.csv", "1");
    layout.write("state", "transferless/mutex/reports", "true");

    let service = layout.service().await;
    service.schedule().await.unwrap();
    let report = service
        .compile_worker()
        .unwrap()
        .drain_until_empty()
        .await
        .unwrap();

    assert_eq!(report.succeeded, 1);
    let queue_root = &service.config().queue_root;
    assert_eq!(pending(queue_root, &service.config().job_queue), 0);
    assert_eq!(pending(queue_root, &service.config().transfer_queue), 0);
    assert_eq!(
        layout.read("state", "transferless/mutex/reports").as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn test_missing_job_list_fails_schedule() {
    let layout = Layout::new();
    std::fs::remove_file(layout.backend("config").join("jobs.json")).unwrap();

    let service = layout.service().await;
    assert!(matches!(
        service.schedule().await,
        Err(CoreError::Sync(_))
    ));
}

#[tokio::test]
async fn test_compile_requires_data_remote() {
    let layout = Layout::new();
    let mut config = layout.config();
    config.data_remote = None;

    let service = bootstrap(config).await.unwrap();
    assert!(matches!(
        service.compile_worker(),
        Err(CoreError::CapabilityMissing { .. })
    ));
}

#[tokio::test]
async fn test_missing_remote_config_file_fails_bootstrap() {
    let layout = Layout::new();
    let mut config = layout.config();
    config.remote_config = RemoteConfigService::File(layout.dir.path().join("absent.json"));

    assert!(matches!(
        bootstrap(config).await,
        Err(CoreError::InitializationFailed(_))
    ));
}
