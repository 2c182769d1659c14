//! Timers and cancellable scheduled tasks.
//!
//! Every delayed callback the controller schedules (transition class
//! removal, flash message dismissal) is a [`ScheduledTask`] whose
//! [`TaskHandle`] can cancel it. [`TaskRegistry`] ties handles to the element
//! that owns them, so swapping or removing that element cancels whatever is
//! still pending against it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use crate::Dom;

/// Host clock capable of async delays and deferred callbacks.
pub trait Timer {
    /// Resolve after `ms` milliseconds.
    fn sleep(&self, ms: u32) -> impl Future<Output = ()>;

    /// Run `task` after `ms` milliseconds.
    ///
    /// Implementations must call [`ScheduledTask::run`], which skips the job
    /// if the task was cancelled in the meantime.
    fn defer(&self, ms: u32, task: ScheduledTask);
}

#[derive(Debug, Default)]
struct TaskState {
    cancelled: Cell<bool>,
    finished: Cell<bool>,
}

/// A deferred job plus its cancellation state.
pub struct ScheduledTask {
    state: Rc<TaskState>,
    job: Box<dyn FnOnce()>,
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("cancelled", &self.state.cancelled.get())
            .finish_non_exhaustive()
    }
}

impl ScheduledTask {
    /// Wrap a job, returning the task and a handle to cancel it.
    pub fn new(job: impl FnOnce() + 'static) -> (Self, TaskHandle) {
        let state = Rc::new(TaskState::default());
        let handle = TaskHandle {
            state: Rc::clone(&state),
        };
        (
            Self {
                state,
                job: Box::new(job),
            },
            handle,
        )
    }

    /// Run the job unless cancelled.
    pub fn run(self) {
        if !self.state.cancelled.get() {
            (self.job)();
        }
        self.state.finished.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }
}

/// Cancellation handle for a [`ScheduledTask`].
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Rc<TaskState>,
}

impl TaskHandle {
    /// Prevent the job from running. No effect once it has run.
    pub fn cancel(&self) {
        if !self.state.finished.get() {
            self.state.cancelled.set(true);
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// True once the task ran or was cancelled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.finished.get() || self.state.cancelled.get()
    }
}

/// Defer `job` on `timer`, returning its handle.
pub fn schedule(timer: &impl Timer, ms: u32, job: impl FnOnce() + 'static) -> TaskHandle {
    let (task, handle) = ScheduledTask::new(job);
    timer.defer(ms, task);
    handle
}

/// Pending tasks keyed by the element that owns them.
#[derive(Debug)]
pub struct TaskRegistry<N> {
    entries: RefCell<Vec<(N, TaskHandle)>>,
}

impl<N> Default for TaskRegistry<N> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<N: Clone + PartialEq> TaskRegistry<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `job` owned by `owner`.
    pub fn schedule(
        &self,
        timer: &impl Timer,
        owner: &N,
        ms: u32,
        job: impl FnOnce() + 'static,
    ) -> TaskHandle {
        let handle = schedule(timer, ms, job);
        let mut entries = self.entries.borrow_mut();
        entries.retain(|(_, h)| !h.is_settled());
        entries.push((owner.clone(), handle.clone()));
        handle
    }

    /// Cancel every pending task owned by `owner`. Returns how many were cancelled.
    pub fn cancel_owned(&self, owner: &N) -> usize {
        let mut cancelled = 0;
        self.entries.borrow_mut().retain(|(o, handle)| {
            if o != owner {
                return !handle.is_settled();
            }
            if !handle.is_settled() {
                handle.cancel();
                cancelled += 1;
            }
            false
        });
        cancelled
    }

    /// Cancel tasks whose owner is no longer attached to `dom` and drop
    /// settled entries.
    pub fn prune<D: Dom<Node = N>>(&self, dom: &D) {
        self.entries.borrow_mut().retain(|(owner, handle)| {
            if handle.is_settled() {
                return false;
            }
            if !dom.is_connected(owner) {
                handle.cancel();
                return false;
            }
            true
        });
    }

    /// Number of tasks still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, h)| !h.is_settled())
            .count()
    }
}

/// Shared document, timer and task registry for element-owned delayed work.
///
/// Jobs scheduled with [`after`](Self::after) run only if their owner is
/// still attached when they fire, and receive the scheduler so they can
/// chain further steps.
pub struct Scheduler<D: Dom, T> {
    dom: Rc<D>,
    timer: Rc<T>,
    tasks: Rc<TaskRegistry<D::Node>>,
}

impl<D: Dom, T> Clone for Scheduler<D, T> {
    fn clone(&self) -> Self {
        Self {
            dom: Rc::clone(&self.dom),
            timer: Rc::clone(&self.timer),
            tasks: Rc::clone(&self.tasks),
        }
    }
}

impl<D: Dom, T> fmt::Debug for Scheduler<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.tasks.pending())
            .finish_non_exhaustive()
    }
}

impl<D, T> Scheduler<D, T>
where
    D: Dom + 'static,
    D::Node: 'static,
    T: Timer + 'static,
{
    pub fn new(dom: Rc<D>, timer: Rc<T>) -> Self {
        Self {
            dom,
            timer,
            tasks: Rc::new(TaskRegistry::new()),
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Run `job` after `ms`, owned by `owner`.
    pub fn after(
        &self,
        owner: &D::Node,
        ms: u32,
        job: impl FnOnce(&Self, &D::Node) + 'static,
    ) -> TaskHandle {
        let scheduler = self.clone();
        let node = owner.clone();
        self.tasks.schedule(&*self.timer, owner, ms, move || {
            if scheduler.dom.is_connected(&node) {
                job(&scheduler, &node);
            }
        })
    }

    /// Cancel pending work owned by `owner`.
    pub fn cancel_owned(&self, owner: &D::Node) -> usize {
        self.tasks.cancel_owned(owner)
    }

    /// Cancel work whose owner has been detached.
    pub fn prune(&self) {
        self.tasks.prune(&*self.dom);
    }

    /// Number of tasks still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.pending()
    }
}

/// Deterministic timer for tests.
///
/// `sleep` resolves immediately and is only recorded; deferred tasks run
/// when the test calls [`advance`](Self::advance) or
/// [`run_all`](Self::run_all).
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Cell<u64>,
    seq: Cell<u64>,
    queue: RefCell<Vec<(u64, u64, ScheduledTask)>>,
    sleeps: RefCell<Vec<u32>>,
}

#[cfg(any(test, feature = "mock"))]
impl ManualTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual milliseconds elapsed.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Durations passed to `sleep`, in call order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }

    /// Tasks queued and not cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|(_, _, t)| !t.is_cancelled())
            .count()
    }

    /// Move the clock forward, running every task that falls due.
    pub fn advance(&self, ms: u32) {
        let target = self.now.get() + u64::from(ms);
        while let Some(task) = self.pop_due(target) {
            task.run();
        }
        self.now.set(target);
    }

    /// Run queued tasks (including ones they schedule) until none remain.
    pub fn run_all(&self) {
        while let Some(task) = self.pop_due(u64::MAX) {
            task.run();
        }
    }

    fn pop_due(&self, target: u64) -> Option<ScheduledTask> {
        let mut queue = self.queue.borrow_mut();
        let index = queue
            .iter()
            .enumerate()
            .filter(|(_, (due, _, _))| *due <= target)
            .min_by_key(|(_, (due, seq, _))| (*due, *seq))
            .map(|(i, _)| i)?;
        let (due, _, task) = queue.remove(index);
        self.now.set(self.now.get().max(due));
        Some(task)
    }
}

#[cfg(any(test, feature = "mock"))]
impl Timer for ManualTimer {
    fn sleep(&self, ms: u32) -> impl Future<Output = ()> {
        self.sleeps.borrow_mut().push(ms);
        std::future::ready(())
    }

    fn defer(&self, ms: u32, task: ScheduledTask) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        let due = self.now.get() + u64::from(ms);
        self.queue.borrow_mut().push((due, seq, task));
    }
}
