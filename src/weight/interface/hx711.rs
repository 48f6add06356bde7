use crate::time::Clock;
use crate::weight::filter::{self, FilterSettings};
use crate::weight::interface::StrainGaugeInterface;
use core::fmt;
use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Channel and gain used for the conversion that follows a read. Selected by the number of clock
/// pulses issued after the 24 data bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hx711Gain {
    #[default]
    Gain128,
    Gain64,
    Gain32ChannelB,
}

impl Hx711Gain {
    pub fn tick_count(&self) -> usize {
        match self {
            Hx711Gain::Gain128 => 25,
            Hx711Gain::Gain64 => 27,
            Hx711Gain::Gain32ChannelB => 26,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Clock held low, conversions running.
    Idle,
    /// Clock held high for longer than the power down delay.
    PoweredDown,
}

pub const POWER_MODE_CHANGE_DELAY: Duration = Duration::from_micros(60);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(5);
pub const VALID_DATA_BITS: usize = 24;

const SIGN_BIT: u32 = 1 << (VALID_DATA_BITS - 1);
const DATA_MASK: u32 = (1 << VALID_DATA_BITS) - 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hx711Config {
    /// How long to wait for the data line to go low before giving up.
    pub ready_timeout: Duration,
    /// Sleep between readiness polls. `None` spins on the data line.
    pub poll_interval: Option<Duration>,
    pub gain: Hx711Gain,
}

impl Default for Hx711Config {
    fn default() -> Self {
        Self {
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: None,
            gain: Hx711Gain::default(),
        }
    }
}

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
    /// Data line never went low within the ready timeout.
    Timeout,
    /// Smoothing factor was negative or not finite.
    InvalidFilterSettings,
}

impl<OutPinE, InPinE> Error<OutPinE, InPinE> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl<OutPinE: fmt::Debug, InPinE: fmt::Debug> fmt::Display for Error<OutPinE, InPinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutPin(e) => write!(f, "clock pin error: {:?}", e),
            Error::InPin(e) => write!(f, "data pin error: {:?}", e),
            Error::Timeout => f.write_str("device not responding"),
            Error::InvalidFilterSettings => f.write_str("invalid filter settings"),
        }
    }
}

impl<OutPinE: fmt::Debug, InPinE: fmt::Debug> core::error::Error for Error<OutPinE, InPinE> {}

/// Sign extends a 24 bit two's complement value. Bits above bit 23 are ignored.
pub fn from_twos_complement_24(raw: u32) -> i32 {
    let raw = raw & DATA_MASK;
    if raw & SIGN_BIT != 0 {
        raw as i32 - (1 << VALID_DATA_BITS)
    } else {
        raw as i32
    }
}

/// Encodes a value in \[-2^23, 2^23 - 1\] as the 24 bit word the HX711 shifts out.
pub fn to_twos_complement_24(value: i32) -> u32 {
    (value as u32) & DATA_MASK
}

/// Blocking bit-banged HX711 driver.
///
/// The driver owns both GPIO lines, so a second handle cannot interleave clock pulses with an
/// in-flight read. Share it between contexts only behind a lock held for a whole read.
pub struct Hx711<CLK, DATA, D, C> {
    clock_pin: CLK,
    data_pin: DATA,
    delay: D,
    clock: C,
    config: Hx711Config,
    power_state: PowerState,
}

impl<CLK, DATA, D, C, ClkE, DataE> Hx711<CLK, DATA, D, C>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
    C: Clock,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, delay: D, clock: C) -> Result<Self, Error<ClkE, DataE>> {
        Self::with_config(clock_pin, data_pin, delay, clock, Hx711Config::default())
    }

    pub fn with_config(
        mut clock_pin: CLK,
        data_pin: DATA,
        delay: D,
        clock: C,
        config: Hx711Config,
    ) -> Result<Self, Error<ClkE, DataE>> {
        clock_pin.set_low().map_err(Error::OutPin)?;
        Ok(Self {
            clock_pin,
            data_pin,
            delay,
            clock,
            config,
            power_state: PowerState::Idle,
        })
    }

    pub fn set_gain(&mut self, gain: Hx711Gain) {
        self.config.gain = gain;
    }

    pub fn config(&self) -> &Hx711Config {
        &self.config
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    /// The HX711 pulls the data line low once a conversion is latched.
    pub fn is_ready(&mut self) -> Result<bool, Error<ClkE, DataE>> {
        self.data_pin.is_low().map_err(Error::InPin)
    }

    pub fn await_ready(&mut self) -> Result<(), Error<ClkE, DataE>> {
        let start = self.clock.now();
        while !self.is_ready()? {
            let waited = self
                .clock
                .now()
                .checked_duration_since(start)
                .unwrap_or(Duration::from_ticks(0));
            if waited > self.config.ready_timeout {
                warn!("HX711 not ready after {} ms", waited.as_millis());
                return Err(Error::Timeout);
            }
            if let Some(interval) = self.config.poll_interval {
                self.delay.delay_us(duration_as_us(interval));
            }
        }
        Ok(())
    }

    pub fn read_raw(&mut self) -> Result<i32, Error<ClkE, DataE>> {
        if self.power_state == PowerState::PoweredDown {
            self.power_on()?;
        }

        if !self.is_ready()? {
            self.await_ready()?;
        }

        let mut data: u32 = 0;
        for _ in 0..VALID_DATA_BITS {
            self.pulse_clock()?;
            data <<= 1;
            if self.data_pin.is_high().map_err(Error::InPin)? {
                data |= 0x1;
            }
        }

        // Remaining pulses pick the channel and gain for the next conversion.
        for _ in VALID_DATA_BITS..self.config.gain.tick_count() {
            self.pulse_clock()?;
        }

        let reading = from_twos_complement_24(data);
        trace!("HX711 raw reading = {}", reading);
        Ok(reading)
    }

    pub fn read_filtered(&mut self, settings: FilterSettings) -> Result<f64, Error<ClkE, DataE>> {
        if !settings.is_valid() {
            return Err(Error::InvalidFilterSettings);
        }
        filter::read_filtered(self, settings)
    }

    pub fn power_on(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        self.power_state = PowerState::Idle;
        Ok(())
    }

    pub fn power_off(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        self.delay.delay_us(duration_as_us(POWER_MODE_CHANGE_DELAY));
        self.power_state = PowerState::PoweredDown;
        Ok(())
    }

    /// Gives back the pins, delay and clock.
    pub fn release(self) -> (CLK, DATA, D, C) {
        (self.clock_pin, self.data_pin, self.delay, self.clock)
    }

    fn pulse_clock(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        self.clock_pin.set_low().map_err(Error::OutPin)
    }
}

impl<CLK, DATA, D, C, ClkE, DataE> StrainGaugeInterface for Hx711<CLK, DATA, D, C>
where
    CLK: OutputPin<Error = ClkE>,
    DATA: InputPin<Error = DataE>,
    D: DelayNs,
    C: Clock,
{
    type Error = Error<ClkE, DataE>;

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_on()
    }

    fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        self.read_raw()
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.power_off()
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        self.power_on()
    }
}

/// Whole microseconds, never less than one so a requested sleep always sleeps.
fn duration_as_us(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX).max(1)
}
