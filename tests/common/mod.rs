//! Shared helpers for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use cos_direct_upload::{
    FailureKind, Result, TaskManager, TaskNotifier, TaskRequest, TaskState, UploadProgress,
    UploadReceipt, UploadSink,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Everything a sink observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Progress(u64, u64),
    TaskState(u16),
    Success(String),
    Failure(FailureKind),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<(u64, u64)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Progress(sent, total) => Some((sent, total)),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SinkEvent::Success(_)))
            .count()
    }

    pub fn failures(&self) -> Vec<FailureKind> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Failure(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }
}

impl UploadSink for RecordingSink {
    fn on_progress(&self, progress: UploadProgress) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Progress(progress.bytes_sent, progress.total_bytes));
    }

    fn on_task_state(&self, state: &TaskState) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::TaskState(state.response_code));
    }

    fn on_success(&self, receipt: &UploadReceipt) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Success(receipt.object_key.clone()));
    }

    fn on_failure(&self, kind: FailureKind, _detail: &str) {
        self.events.lock().unwrap().push(SinkEvent::Failure(kind));
    }
}

/// One step a scripted task performs after submission
#[derive(Debug, Clone)]
pub enum Step {
    Progress(u64, u64),
    Complete(usize),
    Fail(u16, String),
}

/// A supervised mechanism that replays a fixed script from a spawned task
pub struct ScriptedTaskManager {
    script: Vec<Step>,
    requests: Mutex<Vec<TaskRequest>>,
}

impl ScriptedTaskManager {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TaskRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskManager for ScriptedTaskManager {
    async fn submit(&self, request: TaskRequest, notifier: TaskNotifier) -> Result<()> {
        let path = request.files[0].locator.to_string();
        self.requests.lock().unwrap().push(request);
        let script = self.script.clone();

        tokio::spawn(async move {
            for step in script {
                tokio::task::yield_now().await;
                match step {
                    Step::Progress(sent, total) => notifier.progress(sent, total),
                    Step::Complete(count) => notifier.complete(
                        (0..count)
                            .map(|_| TaskState::new(path.clone(), 200, "ok"))
                            .collect(),
                    ),
                    Step::Fail(code, message) => {
                        notifier.fail(vec![TaskState::new(path.clone(), code, message)])
                    }
                }
            }
        });

        Ok(())
    }
}

/// Successful signing envelope with fixed credentials
pub fn sign_body(host: &str, key: &str) -> String {
    serde_json::json!({
        "code": 0,
        "data": {
            "cosHost": host,
            "cosKey": key,
            "authorization": "auth1",
            "securityToken": "tok1"
        }
    })
    .to_string()
}

pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn staged_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
