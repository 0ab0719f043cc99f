//! Notification bridge for supervised transfers
//!
//! A supervised transfer reports through three asynchronous notifications:
//! progress, complete and fail. This module funnels them into an optional
//! progress sink plus a single terminal value that can be awaited as a future.

use crate::upload::task::TaskState;
use crate::upload::types::{UploadProgress, UploadSink};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Terminal notification of a supervised transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskTerminal {
    /// The task reported completion for every state in the batch
    Complete(Vec<TaskState>),
    /// The task reported failure for every state in the batch
    Fail(Vec<TaskState>),
    /// Every notifier was dropped before a terminal notification arrived
    Abandoned,
}

#[derive(Default)]
struct NotifierState {
    terminal: Option<TaskTerminal>,
    waker: Option<Waker>,
    last_sent: Option<u64>,
    progress_events: usize,
}

/// Shared state between the notifier handles and the completion future
struct NotifierContext {
    state: Mutex<NotifierState>,
    sink: Option<Arc<dyn UploadSink>>,
    handles: AtomicUsize,
    id: u64,
}

impl NotifierContext {
    fn lock(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn progress(&self, bytes_sent: u64, total_bytes: u64) {
        let mut state = self.lock();
        if state.terminal.is_some() {
            log::debug!("task {}: progress after terminal ignored", self.id);
            return;
        }
        if matches!(state.last_sent, Some(last) if bytes_sent < last) {
            log::debug!(
                "task {}: non-monotonic progress {} dropped",
                self.id,
                bytes_sent
            );
            return;
        }
        state.last_sent = Some(bytes_sent);
        state.progress_events += 1;

        // Delivered under the lock so no progress can trail the terminal value.
        if let Some(sink) = self.sink.as_ref() {
            sink.on_progress(UploadProgress::new(bytes_sent, total_bytes));
        }
    }

    fn finish(&self, terminal: TaskTerminal) {
        let waker = {
            let mut state = self.lock();
            if state.terminal.is_some() {
                log::debug!("task {}: duplicate terminal notification ignored", self.id);
                return;
            }

            if let (Some(sink), TaskTerminal::Complete(states) | TaskTerminal::Fail(states)) =
                (self.sink.as_ref(), &terminal)
            {
                for task_state in states {
                    sink.on_task_state(task_state);
                }
            }

            log::debug!("task {}: terminal notification {:?}", self.id, terminal);
            state.terminal = Some(terminal);
            state.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Handle through which a transfer mechanism reports progress and terminal events
///
/// Cloning yields another handle to the same transfer. The first terminal
/// notification wins; when the last handle is dropped without one, the
/// transfer resolves as [`TaskTerminal::Abandoned`].
pub struct TaskNotifier {
    context: Arc<NotifierContext>,
}

impl TaskNotifier {
    /// Identifier of the transfer this handle reports for
    pub fn task_id(&self) -> u64 {
        self.context.id
    }

    /// Intermediate progress
    pub fn progress(&self, bytes_sent: u64, total_bytes: u64) {
        self.context.progress(bytes_sent, total_bytes);
    }

    /// Terminal success for a batch of task states
    pub fn complete(&self, states: Vec<TaskState>) {
        self.context.finish(TaskTerminal::Complete(states));
    }

    /// Terminal failure for a batch of task states
    pub fn fail(&self, states: Vec<TaskState>) {
        self.context.finish(TaskTerminal::Fail(states));
    }
}

impl Clone for TaskNotifier {
    fn clone(&self) -> Self {
        self.context.handles.fetch_add(1, Ordering::SeqCst);
        Self {
            context: self.context.clone(),
        }
    }
}

impl Drop for TaskNotifier {
    fn drop(&mut self) {
        if self.context.handles.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.context.finish(TaskTerminal::Abandoned);
        }
    }
}

impl std::fmt::Debug for TaskNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskNotifier")
            .field("task_id", &self.context.id)
            .finish()
    }
}

/// A future resolved by the first terminal notification of a transfer
pub struct TaskCompletion {
    context: Arc<NotifierContext>,
}

impl TaskCompletion {
    /// Identifier of the transfer this future waits for
    pub fn task_id(&self) -> u64 {
        self.context.id
    }

    /// Number of progress events forwarded so far
    pub fn progress_events(&self) -> usize {
        self.context.lock().progress_events
    }

    /// The terminal notification, if one has arrived
    pub fn terminal(&self) -> Option<TaskTerminal> {
        self.context.lock().terminal.clone()
    }
}

impl Future for TaskCompletion {
    type Output = TaskTerminal;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.context.lock();
        match state.terminal.as_ref() {
            Some(terminal) => Poll::Ready(terminal.clone()),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Create the notifier handed to the transfer mechanism and the future awaiting it
pub fn task_channel(sink: Option<Arc<dyn UploadSink>>) -> (TaskNotifier, TaskCompletion) {
    let context = Arc::new(NotifierContext {
        state: Mutex::new(NotifierState::default()),
        sink,
        handles: AtomicUsize::new(1),
        id: NEXT_TASK_ID.fetch_add(1, Ordering::SeqCst),
    });

    (
        TaskNotifier {
            context: context.clone(),
        },
        TaskCompletion { context },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::upload::types::UploadReceipt;

    #[derive(Default)]
    struct RecordingSink {
        progress: Mutex<Vec<(u64, u64)>>,
        task_states: Mutex<Vec<TaskState>>,
    }

    impl UploadSink for RecordingSink {
        fn on_progress(&self, progress: UploadProgress) {
            self.progress
                .lock()
                .unwrap()
                .push((progress.bytes_sent, progress.total_bytes));
        }

        fn on_task_state(&self, state: &TaskState) {
            self.task_states.lock().unwrap().push(state.clone());
        }

        fn on_success(&self, _receipt: &UploadReceipt) {}

        fn on_failure(&self, _kind: FailureKind, _detail: &str) {}
    }

    fn state(path: &str) -> TaskState {
        TaskState::new(path, 0, "ok")
    }

    #[test]
    fn test_task_ids_are_unique() {
        let (first, _a) = task_channel(None);
        let (second, _b) = task_channel(None);
        assert_ne!(first.task_id(), second.task_id());
    }

    #[test]
    fn test_progress_forwarded_to_sink() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, completion) = task_channel(Some(sink.clone()));

        notifier.progress(512, 1024);
        notifier.progress(1024, 1024);

        assert_eq!(*sink.progress.lock().unwrap(), vec![(512, 1024), (1024, 1024)]);
        assert_eq!(completion.progress_events(), 2);
        assert!(completion.terminal().is_none());
    }

    #[test]
    fn test_decreasing_progress_is_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, _completion) = task_channel(Some(sink.clone()));

        notifier.progress(600, 1000);
        notifier.progress(300, 1000);
        notifier.progress(600, 1000);

        assert_eq!(*sink.progress.lock().unwrap(), vec![(600, 1000), (600, 1000)]);
    }

    #[test]
    fn test_first_terminal_wins() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, completion) = task_channel(Some(sink.clone()));

        notifier.complete(vec![state("a"), state("b")]);
        notifier.fail(vec![state("c")]);
        notifier.progress(10, 10);

        assert_eq!(
            completion.terminal(),
            Some(TaskTerminal::Complete(vec![state("a"), state("b")]))
        );
        assert_eq!(sink.task_states.lock().unwrap().len(), 2);
        assert!(sink.progress.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dropping_every_handle_abandons() {
        let (notifier, completion) = task_channel(None);
        let clone = notifier.clone();

        drop(notifier);
        assert!(completion.terminal().is_none());

        drop(clone);
        assert_eq!(completion.terminal(), Some(TaskTerminal::Abandoned));
    }

    #[test]
    fn test_drop_after_terminal_keeps_terminal() {
        let (notifier, completion) = task_channel(None);
        notifier.fail(vec![state("x")]);
        drop(notifier);

        assert_eq!(completion.terminal(), Some(TaskTerminal::Fail(vec![state("x")])));
    }

    #[tokio::test]
    async fn test_completion_future_resolves_from_other_task() {
        let (notifier, completion) = task_channel(None);

        let handle = tokio::spawn(async move {
            tokio::task::yield_now().await;
            notifier.progress(1, 2);
            notifier.complete(vec![state("done")]);
        });

        let terminal = completion.await;
        handle.await.unwrap();
        assert_eq!(terminal, TaskTerminal::Complete(vec![state("done")]));
    }

    #[test]
    fn test_completion_pending_until_terminal() {
        let (notifier, completion) = task_channel(None);
        let mut completion = tokio_test::task::spawn(completion);

        tokio_test::assert_pending!(completion.poll());
        notifier.progress(1, 2);
        assert!(!completion.is_woken());

        notifier.complete(vec![state("done")]);
        assert!(completion.is_woken());
        assert_eq!(
            tokio_test::assert_ready!(completion.poll()),
            TaskTerminal::Complete(vec![state("done")])
        );
    }

    #[tokio::test]
    async fn test_completion_future_already_finished() {
        let (notifier, completion) = task_channel(None);
        notifier.fail(vec![]);

        assert_eq!(completion.await, TaskTerminal::Fail(vec![]));
    }
}
