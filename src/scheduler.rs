use crate::{Service, Shared, SharedEx, Task};
use std::collections::VecDeque;

/// Defers work until the synchronous code currently running has finished.
/// The container uses this to run its first resolution pass after a block of
/// registrations has completed.
///
/// Any closure accepting a [`Task`] is a scheduler, which makes it easy to
/// capture the deferred task in tests:
///
/// ```
/// use lazy_injector::{constant, Container, Task};
/// use std::sync::{Arc, Mutex};
///
/// let deferred: Arc<Mutex<Vec<Task>>> = Arc::default();
/// let mut builder = Container::builder();
/// builder.with_scheduler({
///     let deferred = deferred.clone();
///     move |task: Task| deferred.lock().unwrap().push(task)
/// });
///
/// let container = builder.build();
/// container.module("greetings").into_module().unwrap().value("greeting", constant("ola"));
/// assert!(!container.is_resolved());
///
/// for task in deferred.lock().unwrap().drain(..) {
///     task();
/// }
/// assert!(container.is_resolved());
/// ```
pub trait Scheduler: Service {
    /// Schedules a task to run after all currently queued synchronous work.
    fn schedule(&self, task: Task);

    /// Runs any tasks this scheduler is holding, returning how many ran.
    /// Schedulers driven by something else do nothing here.
    fn run_pending(&self) -> usize {
        0
    }
}

impl<F> Scheduler for F
where
    F: Service + Fn(Task),
{
    fn schedule(&self, task: Task) {
        self(task);
    }
}

/// A FIFO of deferred tasks, drained whenever the host calls
/// [`run_pending`](Scheduler::run_pending). This is the default scheduler of
/// a [`Container`](crate::Container); call
/// [`Container::tick`](crate::Container::tick) from the host's event loop to
/// drive it.
#[derive(Clone, Default)]
pub struct TickQueue {
    tasks: Shared<VecDeque<Task>>,
}

impl TickQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        TickQueue::default()
    }

    /// The number of tasks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.with_inner(VecDeque::len)
    }

    /// Whether no tasks are waiting to run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Scheduler for TickQueue {
    fn schedule(&self, task: Task) {
        self.tasks.with_inner_mut(|tasks| tasks.push_back(task));
    }

    fn run_pending(&self) -> usize {
        let mut ran = 0;
        // Tasks may schedule more tasks, so the queue is not held while one
        // is running.
        while let Some(task) = self.tasks.with_inner_mut(VecDeque::pop_front) {
            task();
            ran += 1;
        }
        ran
    }
}
