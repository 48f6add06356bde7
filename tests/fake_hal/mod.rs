#![allow(dead_code)]

pub mod device;
pub mod time;

use device::{ClockPin, DataPin, FakeHx711};
use embassy_time::Instant;
use hx711_scale::{Hx711, Hx711Config};
use time::{stepping_clock, RecordingDelay, SimulatedTime};

pub type FakeDriver<C> = Hx711<ClockPin, DataPin, RecordingDelay, C>;

/// Builds a driver over a fresh simulated device whose clock advances `step_ms` per read.
pub fn driver(
    config: Hx711Config,
    step_ms: u64,
) -> (FakeDriver<impl FnMut() -> Instant>, FakeHx711, RecordingDelay, SimulatedTime) {
    let device = FakeHx711::new();
    let (clock_pin, data_pin) = device.pins();
    let delay = RecordingDelay::new();
    let (clock, now) = stepping_clock(step_ms);
    let hx711 = Hx711::with_config(clock_pin, data_pin, delay.clone(), clock, config)
        .expect("fake pins never fail on construction");
    (hx711, device, delay, now)
}
