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

pub mod filter;
pub mod interface;
#[allow(clippy::module_inception)]
pub mod weight;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WeightUnit {
    Grams,
    Kilograms,
}

impl WeightUnit {
    /// Decimal places kept when reporting in this unit.
    pub fn precision(&self) -> i32 {
        match self {
            WeightUnit::Grams => 1,
            WeightUnit::Kilograms => 3,
        }
    }
}

/// Rounds to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = libm::pow(10.0, decimals as f64);
    libm::rint(value * factor) / factor
}

pub trait WeighingSystem {
    type Error;

    /// Captures the zero-load offset. Must be called with nothing on the load cell.
    fn calibrate(&mut self) -> Result<f64, Self::Error>;

    /// Derives the scale factor from a known mass placed on the load cell.
    fn calibrate_with_mass(&mut self, reference_grams: f64) -> Result<f64, Self::Error>;

    fn get_weight(&mut self, unit: WeightUnit) -> Result<f64, Self::Error>;

    fn get_reading(&mut self) -> Result<f64, Self::Error>;
}
