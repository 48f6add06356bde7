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

use crate::weight::interface::StrainGaugeInterface;

/// Number of raw readings to fold into the average and how heavily history is weighted against
/// each new reading. The presets are empirical tuning values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterSettings {
    pub cycles: usize,
    pub smoothing_factor: f64,
}

impl FilterSettings {
    pub const CALIBRATION: FilterSettings = FilterSettings::new(50, 5.0);
    pub const WEIGHT: FilterSettings = FilterSettings::new(20, 4.0);
    pub const DEFAULT: FilterSettings = FilterSettings::new(10, 4.0);

    pub const fn new(cycles: usize, smoothing_factor: f64) -> Self {
        Self {
            cycles,
            smoothing_factor,
        }
    }

    /// The smoothing factor must be finite and not negative. Anything else divides by zero or
    /// lets the average run away.
    pub fn is_valid(&self) -> bool {
        self.smoothing_factor.is_finite() && self.smoothing_factor >= 0.0
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// First order low-pass filter. Starts from zero, so short runs are biased towards zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialFilter {
    smoothing_factor: f64,
    average: f64,
}

impl ExponentialFilter {
    pub fn new(smoothing_factor: f64) -> Self {
        Self {
            smoothing_factor,
            average: 0.0,
        }
    }

    pub fn update(&mut self, reading: i32) -> f64 {
        self.average *= self.smoothing_factor;
        self.average += reading as f64;
        self.average /= self.smoothing_factor + 1.0;
        self.average
    }

    pub fn value(&self) -> f64 {
        self.average
    }
}

/// Averages `settings.cycles` readings from the gauge. The first failed reading aborts the
/// whole average. Callers check [`FilterSettings::is_valid`] first.
pub fn read_filtered<G>(gauge: &mut G, settings: FilterSettings) -> Result<f64, G::Error>
where
    G: StrainGaugeInterface + ?Sized,
{
    let mut filter = ExponentialFilter::new(settings.smoothing_factor);
    for _ in 0..settings.cycles {
        filter.update(gauge.get_next_reading()?);
    }
    Ok(filter.value())
}
