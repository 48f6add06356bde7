pub mod hx711;

pub trait StrainGaugeInterface {
    type Error;

    /// Initialise the gauge and make it ready for taking readings. Will put it into an initialized,
    /// powered up state.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Gets next reading from the strain gauge. If the gauge is powered down then
    /// this function is expected to power up the device and get the reading.
    fn get_next_reading(&mut self) -> Result<i32, Self::Error>;

    /// Power down the strain gauge
    fn power_down(&mut self) -> Result<(), Self::Error>;

    /// Power up the strain gauge
    fn power_up(&mut self) -> Result<(), Self::Error>;
}
