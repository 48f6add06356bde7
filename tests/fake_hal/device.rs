use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use hx711_scale::weight::interface::hx711::to_twos_complement_24;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

const DATA_BITS: usize = 24;

#[derive(Default)]
struct DeviceState {
    queued: VecDeque<i32>,
    /// Word being shifted out, latched when the host sees the data line low.
    latched: Option<u32>,
    pulses: usize,
    clock_high: bool,
    frames: Vec<usize>,
    clock_fails: bool,
    data_fails: bool,
}

impl DeviceState {
    /// Closes a frame once the host has clocked past the data bits.
    fn finish_frame(&mut self) {
        if self.latched.is_some() && self.pulses > DATA_BITS {
            self.frames.push(self.pulses);
            self.latched = None;
            self.pulses = 0;
        }
    }

    fn data_level_high(&mut self) -> bool {
        self.finish_frame();
        match self.latched {
            Some(word) if self.pulses > 0 => (word >> (DATA_BITS - self.pulses)) & 0x1 == 1,
            Some(_) => false,
            None => match self.queued.pop_front() {
                Some(sample) => {
                    self.latched = Some(to_twos_complement_24(sample));
                    false
                }
                None => true,
            },
        }
    }
}

/// Simulated HX711. Conversions come from a queue; with nothing queued the data line stays
/// high as if the device were disconnected.
#[derive(Clone, Default)]
pub struct FakeHx711 {
    state: Rc<RefCell<DeviceState>>,
}

impl FakeHx711 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(samples: &[i32]) -> Self {
        let device = Self::new();
        device.queue(samples);
        device
    }

    pub fn queue(&self, samples: &[i32]) {
        self.state.borrow_mut().queued.extend(samples.iter().copied());
    }

    pub fn queue_repeated(&self, sample: i32, count: usize) {
        self.state
            .borrow_mut()
            .queued
            .extend(std::iter::repeat(sample).take(count));
    }

    pub fn pins(&self) -> (ClockPin, DataPin) {
        (
            ClockPin {
                state: self.state.clone(),
            },
            DataPin {
                state: self.state.clone(),
            },
        )
    }

    /// Clock pulses seen for every completed read.
    pub fn frames(&self) -> Vec<usize> {
        let mut state = self.state.borrow_mut();
        state.finish_frame();
        state.frames.clone()
    }

    pub fn remaining(&self) -> usize {
        self.state.borrow().queued.len()
    }

    pub fn clock_is_high(&self) -> bool {
        self.state.borrow().clock_high
    }

    pub fn fail_clock(&self, fail: bool) {
        self.state.borrow_mut().clock_fails = fail;
    }

    pub fn fail_data(&self, fail: bool) {
        self.state.borrow_mut().data_fails = fail;
    }
}

pub struct ClockPin {
    state: Rc<RefCell<DeviceState>>,
}

impl ErrorType for ClockPin {
    type Error = ErrorKind;
}

impl OutputPin for ClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.clock_fails {
            return Err(ErrorKind::Other);
        }
        state.clock_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.clock_fails {
            return Err(ErrorKind::Other);
        }
        if !state.clock_high && state.latched.is_some() {
            state.pulses += 1;
        }
        state.clock_high = true;
        Ok(())
    }
}

pub struct DataPin {
    state: Rc<RefCell<DeviceState>>,
}

impl ErrorType for DataPin {
    type Error = ErrorKind;
}

impl InputPin for DataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.data_fails {
            return Err(ErrorKind::Other);
        }
        Ok(state.data_level_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
