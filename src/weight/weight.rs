// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::weight::filter::{self, FilterSettings};
use crate::weight::interface::StrainGaugeInterface;
use crate::weight::{round_to, WeighingSystem, WeightUnit};
use core::fmt;
use heapless::Vec;
use micromath::statistics::StdDev;

/// Rated capacity of the load cell the scale factor was measured against.
pub const DEFAULT_CAPACITY: f64 = 20.0;
/// Grams per ADC count per unit of rated capacity, measured empirically.
pub const DEFAULT_COUNTS_PER_UNIT: f64 = 0.0001192;

const GRAMS_PER_KILOGRAM: f64 = 1000.0;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<StrainGaugeE> {
    StrainGaugeReadingError(StrainGaugeE),
    /// The loaded reading matched the zero offset, so no scale factor can be derived.
    InvalidCalibration,
    /// Smoothing factor was negative or not finite.
    InvalidFilterSettings,
    /// A standard deviation needs at least two readings.
    InsufficientSamples,
}

impl<StrainGaugeE: fmt::Display> fmt::Display for Error<StrainGaugeE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StrainGaugeReadingError(e) => write!(f, "strain gauge reading failed: {}", e),
            Error::InvalidCalibration => f.write_str("calibration reading matches the zero offset"),
            Error::InvalidFilterSettings => f.write_str("invalid filter settings"),
            Error::InsufficientSamples => f.write_str("noise measurement needs at least two readings"),
        }
    }
}

impl<StrainGaugeE: fmt::Debug + fmt::Display> core::error::Error for Error<StrainGaugeE> {}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleConfig {
    pub capacity: f64,
    pub counts_per_unit: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            counts_per_unit: DEFAULT_COUNTS_PER_UNIT,
        }
    }
}

pub struct WeightScale<StrainGauge> {
    strain_gauge: StrainGauge,
    calibration_offset: f64,
    config: ScaleConfig,
}

impl<StrainGauge, StrainGaugeE> WeightScale<StrainGauge>
where
    StrainGauge: StrainGaugeInterface<Error = StrainGaugeE>,
{
    /// Powers up the gauge. Weights are offset by the unknown zero reading until
    /// [`WeighingSystem::calibrate`] runs or an offset is restored.
    pub fn new(mut strain_gauge: StrainGauge, config: ScaleConfig) -> Result<Self, Error<StrainGaugeE>> {
        strain_gauge
            .initialize()
            .map_err(Error::StrainGaugeReadingError)?;

        Ok(Self {
            strain_gauge,
            calibration_offset: 0.0,
            config,
        })
    }

    pub fn read_raw(&mut self) -> Result<i32, Error<StrainGaugeE>> {
        self.strain_gauge
            .get_next_reading()
            .map_err(Error::StrainGaugeReadingError)
    }

    pub fn read_filtered(&mut self, settings: FilterSettings) -> Result<f64, Error<StrainGaugeE>> {
        if !settings.is_valid() {
            return Err(Error::InvalidFilterSettings);
        }
        filter::read_filtered(&mut self.strain_gauge, settings).map_err(Error::StrainGaugeReadingError)
    }

    pub fn calibrate_with(&mut self, settings: FilterSettings) -> Result<f64, Error<StrainGaugeE>> {
        self.calibration_offset = self.read_filtered(settings)?;
        debug!("Calibration offset = {}", self.calibration_offset);
        Ok(self.calibration_offset)
    }

    pub fn calibrate_with_mass_using(
        &mut self,
        reference_grams: f64,
        settings: FilterSettings,
    ) -> Result<f64, Error<StrainGaugeE>> {
        let tared_reading = self.read_filtered(settings)? - self.calibration_offset;
        let counts = self.config.capacity * tared_reading;
        if counts == 0.0 || !counts.is_finite() {
            warn!("Reference reading {} is unusable for calibration", tared_reading);
            return Err(Error::InvalidCalibration);
        }

        self.config.counts_per_unit = reference_grams / counts;
        debug!("Counts per unit = {}", self.config.counts_per_unit);
        Ok(self.config.counts_per_unit)
    }

    pub fn get_weight_with(
        &mut self,
        unit: WeightUnit,
        settings: FilterSettings,
    ) -> Result<f64, Error<StrainGaugeE>> {
        let reading = self.read_filtered(settings)?;
        trace!("Filtered reading = {}", reading);
        let grams = round_to(self.grams_for(reading), WeightUnit::Grams.precision());
        Ok(match unit {
            WeightUnit::Grams => grams,
            WeightUnit::Kilograms => round_to(grams / GRAMS_PER_KILOGRAM, unit.precision()),
        })
    }

    pub fn get_weight_g(&mut self) -> Result<f64, Error<StrainGaugeE>> {
        self.get_weight(WeightUnit::Grams)
    }

    pub fn get_weight_kg(&mut self) -> Result<f64, Error<StrainGaugeE>> {
        self.get_weight(WeightUnit::Kilograms)
    }

    /// Standard deviation of `N` consecutive raw readings, in ADC counts. `N` must be at least 2.
    pub fn measure_noise<const N: usize>(&mut self) -> Result<f32, Error<StrainGaugeE>> {
        if N < 2 {
            return Err(Error::InsufficientSamples);
        }

        let mut measurement_buffer = Vec::<f32, N>::new();

        for _ in 0..N {
            let reading = self.read_raw()? as f32;
            measurement_buffer
                .push(reading)
                .expect("Too many readings taken by noise measurement");
        }

        let standard_deviation = measurement_buffer.as_slice().stddev();
        debug!("Noise over {} readings = {} counts", N, standard_deviation);
        Ok(standard_deviation)
    }

    pub fn calibration_offset(&self) -> f64 {
        self.calibration_offset
    }

    /// Restores an offset captured by an earlier calibration.
    pub fn set_calibration_offset(&mut self, offset: f64) {
        self.calibration_offset = offset;
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn power_on(&mut self) -> Result<(), Error<StrainGaugeE>> {
        self.strain_gauge
            .power_up()
            .map_err(Error::StrainGaugeReadingError)
    }

    pub fn power_off(&mut self) -> Result<(), Error<StrainGaugeE>> {
        self.strain_gauge
            .power_down()
            .map_err(Error::StrainGaugeReadingError)
    }

    pub fn strain_gauge(&mut self) -> &mut StrainGauge {
        &mut self.strain_gauge
    }

    pub fn release(self) -> StrainGauge {
        self.strain_gauge
    }

    fn grams_for(&self, reading: f64) -> f64 {
        let tared_reading = reading - self.calibration_offset;
        self.config.capacity * self.config.counts_per_unit * tared_reading
    }
}

impl<StrainGauge, StrainGaugeE> WeighingSystem for WeightScale<StrainGauge>
where
    StrainGauge: StrainGaugeInterface<Error = StrainGaugeE>,
{
    type Error = Error<StrainGaugeE>;

    fn calibrate(&mut self) -> Result<f64, Self::Error> {
        self.calibrate_with(FilterSettings::CALIBRATION)
    }

    fn calibrate_with_mass(&mut self, reference_grams: f64) -> Result<f64, Self::Error> {
        self.calibrate_with_mass_using(reference_grams, FilterSettings::CALIBRATION)
    }

    fn get_weight(&mut self, unit: WeightUnit) -> Result<f64, Self::Error> {
        self.get_weight_with(unit, FilterSettings::WEIGHT)
    }

    fn get_reading(&mut self) -> Result<f64, Self::Error> {
        self.get_weight(WeightUnit::Grams)
    }
}
