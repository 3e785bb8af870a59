use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use super::{Scheduler, TaskHandle};

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeat { period: u64, task: Box<dyn FnMut()> },
}

#[derive(Default)]
struct State {
    now: u64,
    next_id: u64,
    next_seq: u64,
    /// Keyed by (due time, insertion order) so equal deadlines run FIFO.
    queue: BTreeMap<(u64, u64), (TaskHandle, Task)>,
    live: HashSet<TaskHandle>,
}

impl State {
    fn push(&mut self, due: u64, handle: TaskHandle, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((due, seq), (handle, task));
    }

    fn new_handle(&mut self) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(handle);
        handle
    }
}

/// Deterministic scheduler driven by [`ManualScheduler::advance`].
///
/// Tasks may schedule or cancel other tasks (and themselves) while running.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<State>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds elapsed on the virtual clock.
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Number of tasks still scheduled.
    pub fn pending(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Moves the clock forward by `ms`, running every task that falls due, in
    /// deadline order.
    pub fn advance(&self, ms: u64) {
        let target = self.state.borrow().now + ms;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                match state.queue.keys().next().copied() {
                    Some(key) if key.0 <= target => {
                        state.now = key.0;
                        state.queue.remove(&key)
                    }
                    _ => None,
                }
            };
            let Some((handle, task)) = next else {
                break;
            };
            match task {
                Task::Once(task) => {
                    self.state.borrow_mut().live.remove(&handle);
                    task();
                }
                Task::Repeat { period, mut task } => {
                    task();
                    let mut state = self.state.borrow_mut();
                    if state.live.contains(&handle) {
                        let due = state.now + period;
                        state.push(due, handle, Task::Repeat { period, task });
                    }
                }
            }
        }
        self.state.borrow_mut().now = target;
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.new_handle();
        let due = state.now + u64::from(delay_ms);
        state.push(due, handle, Task::Once(task));
        handle
    }

    fn every(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.new_handle();
        let period = u64::from(period_ms.max(1));
        let due = state.now + period;
        state.push(due, handle, Task::Repeat { period, task });
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        let removed: Vec<Task> = {
            let mut state = self.state.borrow_mut();
            if !state.live.remove(&handle) {
                return;
            }
            let keys: Vec<_> = state.queue.iter().filter(|(_, (h, _))| *h == handle).map(|(key, _)| *key).collect();
            keys.into_iter().filter_map(|key| state.queue.remove(&key)).map(|(_, task)| task).collect()
        };
        // Dropped outside the borrow: captured state may schedule on drop.
        drop(removed);
    }
}
