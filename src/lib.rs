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

//! Blocking HX711 load cell driver with low-pass filtering and weight scaling.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod time;
pub mod weight;

pub use time::{Clock, EmbassyClock};
pub use weight::filter::FilterSettings;
pub use weight::interface::hx711::{Hx711, Hx711Config, Hx711Gain, PowerState};
pub use weight::interface::StrainGaugeInterface;
pub use weight::weight::{ScaleConfig, WeightScale};
pub use weight::{WeighingSystem, WeightUnit};
