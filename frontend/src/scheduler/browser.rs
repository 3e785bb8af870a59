use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use log::debug;
use wasm_bindgen::closure::Closure;

use super::{Scheduler, TaskHandle};

enum Timer {
    Once(Timeout),
    Repeat(Interval),
}

/// Scheduler backed by `setTimeout`/`setInterval`.
///
/// A timer's closure may be the one running when it fires or gets cancelled,
/// so finished and cancelled timers are only released on the next call.
#[derive(Default)]
pub struct BrowserScheduler {
    timers: RefCell<HashMap<TaskHandle, Timer>>,
    fired: Rc<RefCell<Vec<TaskHandle>>>,
    retired: RefCell<Vec<Closure<dyn FnMut()>>>,
    next_id: Cell<u64>,
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&self) -> TaskHandle {
        let handle = TaskHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        handle
    }

    fn release_finished(&self) {
        let retired = std::mem::take(&mut *self.retired.borrow_mut());
        drop(retired);
        let fired = std::mem::take(&mut *self.fired.borrow_mut());
        let finished: Vec<Timer> = {
            let mut timers = self.timers.borrow_mut();
            fired.iter().filter_map(|handle| timers.remove(handle)).collect()
        };
        drop(finished);
    }
}

impl Scheduler for BrowserScheduler {
    fn after(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TaskHandle {
        self.release_finished();
        let handle = self.next_handle();
        let fired = Rc::downgrade(&self.fired);
        let timeout = Timeout::new(delay_ms, move || {
            task();
            if let Some(fired) = fired.upgrade() {
                fired.borrow_mut().push(handle);
            }
        });
        self.timers.borrow_mut().insert(handle, Timer::Once(timeout));
        handle
    }

    fn every(&self, period_ms: u32, mut task: Box<dyn FnMut()>) -> TaskHandle {
        self.release_finished();
        let handle = self.next_handle();
        let interval = Interval::new(period_ms, move || task());
        self.timers.borrow_mut().insert(handle, Timer::Repeat(interval));
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        let removed = self.timers.borrow_mut().remove(&handle);
        let closure = match removed {
            Some(Timer::Once(timeout)) => timeout.cancel(),
            Some(Timer::Repeat(interval)) => interval.cancel(),
            None => return,
        };
        debug!("Cancelled timer {:?}", handle);
        self.retired.borrow_mut().push(closure);
    }
}
