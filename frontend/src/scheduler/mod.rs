//! Deferred and repeating work.
//!
//! Page behaviors schedule through the [`Scheduler`] trait so the browser can
//! back it with real timers while tests drive a virtual clock.

mod browser;
mod manual;

pub use browser::BrowserScheduler;
pub use manual::ManualScheduler;

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub(crate) u64);

pub trait Scheduler {
    /// Runs `task` once after `delay_ms`.
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TaskHandle;
    /// Runs `task` every `period_ms` until cancelled.
    fn every(&self, period_ms: u32, task: Box<dyn FnMut()>) -> TaskHandle;
    /// Cancelling a finished or unknown task does nothing.
    fn cancel(&self, handle: TaskHandle);
}
