use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Milliseconds elapsed on a simulated clock.
pub type SimulatedTime = Rc<Cell<u64>>;

/// A clock that moves forward by `step_ms` every time it is read.
pub fn stepping_clock(step_ms: u64) -> (impl FnMut() -> Instant, SimulatedTime) {
    let now: SimulatedTime = Rc::new(Cell::new(0));
    let shared = now.clone();
    let clock = move || {
        let current = shared.get();
        shared.set(current + step_ms);
        Instant::from_millis(current)
    };
    (clock, now)
}

/// Records every delay instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingDelay {
    delays_ns: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ns(&self) -> u64 {
        self.delays_ns.borrow().iter().map(|&ns| ns as u64).sum()
    }

    pub fn count(&self) -> usize {
        self.delays_ns.borrow().len()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.borrow_mut().push(ns);
    }
}
