//! Per-archive save channels.
//!
//! A save channel is a FIFO queue of tasks executed strictly one at a time:
//! a task's completion is observed before the next task begins. Channels
//! live in a process-wide registry keyed by archive ID, created lazily and
//! never torn down. Queued tasks can be cancelled until the moment they
//! start; once running they go to completion, so a save never leaves a
//! partial encrypted write behind.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll, Waker};

/// Scheduling priority for a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPriority {
    /// Run in enqueue order
    #[default]
    Normal,
    /// Jump ahead of queued normal tasks (never ahead of the running one)
    High,
}

/// Introspection snapshot of one queued task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    /// Enqueue sequence number
    pub seq: u64,
    /// Scheduling priority
    pub priority: TaskPriority,
    /// Caller-supplied tag (e.g. `"saving"`)
    pub stack: String,
    /// True if the task is currently executing
    pub running: bool,
}

#[derive(Debug)]
struct TaskSlot {
    seq: u64,
    priority: TaskPriority,
    stack: String,
}

#[derive(Debug, Default)]
struct ChannelState {
    next_seq: u64,
    queue: Vec<TaskSlot>,
    running: Option<u64>,
    wakers: HashMap<u64, Waker>,
}

/// A FIFO task queue for one archive. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct SaveChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl SaveChannel {
    /// A fresh standalone channel (tests, or non-registry use).
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task slot. The task body is supplied to [`QueuedTask::run`].
    pub fn enqueue(&self, priority: TaskPriority, stack: impl Into<String>) -> QueuedTask {
        let mut state = self.state.lock().expect("save channel poisoned");
        let seq = state.next_seq;
        state.next_seq += 1;
        let slot = TaskSlot {
            seq,
            priority,
            stack: stack.into(),
        };
        let position = match priority {
            TaskPriority::Normal => state.queue.len(),
            TaskPriority::High => state
                .queue
                .iter()
                .position(|s| {
                    s.priority == TaskPriority::Normal && state.running != Some(s.seq)
                })
                .unwrap_or(state.queue.len()),
        };
        state.queue.insert(position, slot);
        QueuedTask {
            state: Arc::clone(&self.state),
            seq,
            settled: false,
        }
    }

    /// Snapshot of queued and running tasks, in execution order.
    pub fn tasks(&self) -> Vec<TaskInfo> {
        let state = self.state.lock().expect("save channel poisoned");
        state
            .queue
            .iter()
            .map(|slot| TaskInfo {
                seq: slot.seq,
                priority: slot.priority,
                stack: slot.stack.clone(),
                running: state.running == Some(slot.seq),
            })
            .collect()
    }

    /// True if nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock().expect("save channel poisoned");
        state.queue.is_empty() && state.running.is_none()
    }
}

/// The process-wide channel for an archive ID.
pub fn channel_for_archive(archive_id: &str) -> SaveChannel {
    static CHANNELS: OnceLock<Mutex<HashMap<String, SaveChannel>>> = OnceLock::new();
    let channels = CHANNELS.get_or_init(|| Mutex::new(HashMap::new()));
    channels
        .lock()
        .expect("channel registry poisoned")
        .entry(archive_id.to_string())
        .or_default()
        .clone()
}

/// A slot in a save channel, waiting for its turn.
#[derive(Debug)]
pub struct QueuedTask {
    state: Arc<Mutex<ChannelState>>,
    seq: u64,
    settled: bool,
}

impl QueuedTask {
    /// A handle that can cancel this task until it starts executing.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            state: Arc::clone(&self.state),
            seq: self.seq,
        }
    }

    /// Wait for this task's turn, then execute `work`.
    ///
    /// Returns `None` if the task was cancelled before it started. Once
    /// `work` begins it always runs to completion.
    pub async fn run<T, F>(mut self, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let acquired = Turn {
            state: Arc::clone(&self.state),
            seq: self.seq,
        }
        .await;
        if !acquired {
            self.settled = true;
            return None;
        }
        let result = work.await;
        release(&self.state, self.seq);
        self.settled = true;
        Some(result)
    }
}

impl Drop for QueuedTask {
    fn drop(&mut self) {
        if !self.settled {
            // Dropped mid-wait or mid-run: free the slot so the channel
            // never deadlocks
            release(&self.state, self.seq);
        }
    }
}

/// Cancels a queued task before it starts.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<Mutex<ChannelState>>,
    seq: u64,
}

impl CancelHandle {
    /// Attempt to cancel. Returns `false` if the task already started (or
    /// already finished); a started task runs to completion.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock().expect("save channel poisoned");
        if state.running == Some(self.seq) {
            return false;
        }
        let Some(position) = state.queue.iter().position(|s| s.seq == self.seq) else {
            return false;
        };
        state.queue.remove(position);
        // Wake the cancelled waiter so its turn future resolves to false
        if let Some(waker) = state.wakers.remove(&self.seq) {
            waker.wake();
        }
        wake_head(&mut state);
        true
    }
}

struct Turn {
    state: Arc<Mutex<ChannelState>>,
    seq: u64,
}

impl Future for Turn {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let mut state = self.state.lock().expect("save channel poisoned");
        if !state.queue.iter().any(|s| s.seq == self.seq) {
            // Cancelled while waiting
            return Poll::Ready(false);
        }
        let is_head = state.queue.first().map(|s| s.seq) == Some(self.seq);
        if is_head && state.running.is_none() {
            state.running = Some(self.seq);
            state.wakers.remove(&self.seq);
            Poll::Ready(true)
        } else {
            state.wakers.insert(self.seq, cx.waker().clone());
            Poll::Pending
        }
    }
}

fn release(state: &Arc<Mutex<ChannelState>>, seq: u64) {
    let mut state = state.lock().expect("save channel poisoned");
    if state.running == Some(seq) {
        state.running = None;
    }
    state.queue.retain(|s| s.seq != seq);
    state.wakers.remove(&seq);
    wake_head(&mut state);
}

fn wake_head(state: &mut ChannelState) {
    if state.running.is_some() {
        return;
    }
    if let Some(head) = state.queue.first() {
        if let Some(waker) = state.wakers.remove(&head.seq) {
            waker.wake();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::{block_on, poll_once};
    use std::cell::RefCell;

    #[test]
    fn test_tasks_run_in_enqueue_order() {
        let channel = SaveChannel::new();
        let order = RefCell::new(Vec::new());

        let first = channel.enqueue(TaskPriority::Normal, "saving");
        let second = channel.enqueue(TaskPriority::Normal, "saving");

        // The second task cannot start while the first is still queued
        let mut second_run = Box::pin(second.run(async {
            order.borrow_mut().push(2);
        }));
        assert!(block_on(poll_once(second_run.as_mut())).is_none());

        block_on(first.run(async {
            order.borrow_mut().push(1);
        }))
        .unwrap();
        block_on(second_run).unwrap();

        assert_eq!(*order.borrow(), vec![1, 2]);
        assert!(channel.is_idle());
    }

    #[test]
    fn test_failure_does_not_block_the_queue() {
        let channel = SaveChannel::new();
        let first = channel.enqueue(TaskPriority::Normal, "saving");
        let second = channel.enqueue(TaskPriority::Normal, "saving");

        let failed: Option<Result<(), &str>> = block_on(first.run(async { Err("boom") }));
        assert_eq!(failed, Some(Err("boom")));

        let ok: Option<Result<(), &str>> = block_on(second.run(async { Ok(()) }));
        assert_eq!(ok, Some(Ok(())));
    }

    #[test]
    fn test_high_priority_jumps_queued_normals() {
        let channel = SaveChannel::new();
        let _normal_a = channel.enqueue(TaskPriority::Normal, "saving");
        let _normal_b = channel.enqueue(TaskPriority::Normal, "saving");
        let urgent = channel.enqueue(TaskPriority::High, "flush");

        // Nothing has started yet, so the high-priority task leads
        let tasks = channel.tasks();
        assert_eq!(tasks[0].seq, urgent.seq);
        assert_eq!(tasks[0].priority, TaskPriority::High);
        assert_eq!(tasks[1].seq, 0);
        assert_eq!(tasks[2].seq, 1);
    }

    #[test]
    fn test_high_priority_never_preempts_running_task() {
        let channel = SaveChannel::new();
        let running = channel.enqueue(TaskPriority::Normal, "saving");

        block_on(running.run(async {
            let urgent = channel.enqueue(TaskPriority::High, "flush");
            // The running head keeps its slot; the urgent task queues behind
            let tasks = channel.tasks();
            assert!(tasks[0].running);
            assert_eq!(tasks[1].seq, urgent.seq);
            drop(urgent);
        }))
        .unwrap();
    }

    #[test]
    fn test_cancel_before_start() {
        let channel = SaveChannel::new();
        let first = channel.enqueue(TaskPriority::Normal, "saving");
        let second = channel.enqueue(TaskPriority::Normal, "saving");

        let handle = second.cancel_handle();
        assert!(handle.cancel());
        assert!(!handle.cancel());

        assert_eq!(block_on(first.run(async { 7 })), Some(7));
        assert_eq!(block_on(second.run(async { 8 })), None);
        assert!(channel.is_idle());
    }

    #[test]
    fn test_cannot_cancel_running_task() {
        let channel = SaveChannel::new();
        let task = channel.enqueue(TaskPriority::Normal, "saving");
        let handle = task.cancel_handle();

        block_on(task.run(async move {
            // Already running: cancellation must refuse
            assert!(!handle.cancel());
        }))
        .unwrap();
    }

    #[test]
    fn test_cancelled_head_unblocks_successor() {
        let channel = SaveChannel::new();
        let first = channel.enqueue(TaskPriority::Normal, "saving");
        let second = channel.enqueue(TaskPriority::Normal, "saving");

        assert!(first.cancel_handle().cancel());
        assert_eq!(block_on(first.run(async { 1 })), None);
        assert_eq!(block_on(second.run(async { 2 })), Some(2));
    }

    #[test]
    fn test_dropped_task_frees_the_channel() {
        let channel = SaveChannel::new();
        let first = channel.enqueue(TaskPriority::Normal, "saving");
        drop(first);

        let second = channel.enqueue(TaskPriority::Normal, "saving");
        assert_eq!(block_on(second.run(async { 5 })), Some(5));
    }

    #[test]
    fn test_registry_returns_same_channel_per_archive() {
        let a1 = channel_for_archive("registry-archive-a");
        let a2 = channel_for_archive("registry-archive-a");
        let b = channel_for_archive("registry-archive-b");

        let task = a1.enqueue(TaskPriority::Normal, "saving");
        assert_eq!(a2.tasks().len(), 1);
        assert!(b.is_idle());
        drop(task);

        assert!(a2.is_idle());
    }

    #[test]
    fn test_stack_tag_is_introspectable() {
        let channel = SaveChannel::new();
        let _task = channel.enqueue(TaskPriority::Normal, "saving");
        assert_eq!(channel.tasks()[0].stack, "saving");
    }
}
