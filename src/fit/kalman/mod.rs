/*
    Helixfit, Kalman filter track fitting in uniform magnetic fields
    Copyright (C) 2024-onwards the helixfit developers

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use serde_derive::{Deserialize, Serialize};
use std::fmt;

use super::gate::GateConfig;
use super::scattering::ScatteringModel;
use crate::track::PriorTrajectory;

pub mod filtering;
pub mod initializers;
pub mod propagation;
pub mod seeding;

/// Defines how the first points of a sequence are turned into a track state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SeedingMode {
    /// Closed-form circle and line fit through the first three points of the sequence.
    /// The seed is anchored on the third point, the one nearest to the rest of the sequence.
    #[default]
    ThreePoints,
    /// Seeds from a prior trajectory and the first point of the sequence.
    Prior(PriorTrajectory),
}

impl SeedingMode {
    /// Number of points consumed by this seeding method.
    pub fn points(&self) -> usize {
        match self {
            SeedingMode::ThreePoints => 3,
            SeedingMode::Prior(_) => 1,
        }
    }
}

impl fmt::Display for SeedingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeedingMode::ThreePoints => write!(f, "three point seeding"),
            SeedingMode::Prior(prior) => write!(f, "seeding from {prior}"),
        }
    }
}

/// Kalman filter of a helix in a uniform magnetic field.
///
/// The field is never read from a global; it is carried here and handed explicitly to the seeding and propagation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct HelixKF {
    /// Magnetic field along z, in kG
    pub field: f64,
    /// Quality gate thresholds
    pub gate: GateConfig,
    /// Process noise added at each propagation
    pub scattering: ScatteringModel,
    /// How tracks are seeded by `Filter::seed`
    pub seeding: SeedingMode,
}
