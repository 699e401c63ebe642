use std::collections::VecDeque;
use std::fmt;

/// A deferred callback run once against the owning context.
pub type Task<C> = Box<dyn FnOnce(&mut C)>;

/// A FIFO queue of deferred tasks.
///
/// `TaskQueue` is drained once per loop iteration by [`TaskQueue::tick`].
/// A drain only runs the tasks that were queued when it started; tasks
/// queued while draining wait for the next tick. A task that keeps
/// re-queueing itself therefore still hands control back to the loop on
/// every iteration.
pub struct TaskQueue<C> {
    /// Pending tasks, oldest first.
    queue: VecDeque<Task<C>>,
}

impl<C> TaskQueue<C> {
    /// Creates an empty task queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a task to the tail of the queue.
    pub fn add<F>(&mut self, task: F)
    where
        F: FnOnce(&mut C) + 'static,
    {
        self.queue.push_back(Box::new(task));
    }

    /// Drops every queued task.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Returns `true` if no task is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Runs exactly the tasks queued at the start of this call.
    ///
    /// Returns the number of tasks executed.
    pub fn tick(ctx: &mut C) -> usize
    where
        C: AsMut<TaskQueue<C>>,
    {
        let count = ctx.as_mut().queue.len();

        for ran in 0..count {
            let Some(task) = ctx.as_mut().queue.pop_front() else {
                return ran;
            };
            task(ctx);
        }

        count
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TaskQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.queue.len())
            .finish()
    }
}
