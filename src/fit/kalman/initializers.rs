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

use super::{HelixKF, SeedingMode};
use crate::fit::gate::GateConfig;
use crate::fit::process::FitConfig;
use crate::fit::scattering::ScatteringModel;
use crate::track::PriorTrajectory;

impl HelixKF {
    /// Initializes a filter in the provided field (kG), with the default gates, no scattering and three point seeding.
    pub fn new(field: f64) -> Self {
        Self {
            field,
            gate: GateConfig::default(),
            scattering: ScatteringModel::default(),
            seeding: SeedingMode::default(),
        }
    }

    /// Initializes a filter from the fitting configuration.
    pub fn from_config(cfg: &FitConfig) -> Self {
        Self {
            field: cfg.field,
            gate: cfg.gate,
            scattering: cfg.scattering,
            seeding: cfg.seeding,
        }
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_scattering(mut self, scattering: ScatteringModel) -> Self {
        self.scattering = scattering;
        self
    }

    /// Seeds every track of this filter from the provided prior and the first point of the sequence.
    pub fn with_prior(mut self, prior: PriorTrajectory) -> Self {
        self.seeding = SeedingMode::Prior(prior);
        self
    }
}

impl Default for HelixKF {
    /// A 5 kG field, typical of a solenoid TPC.
    fn default() -> Self {
        Self::new(5.0)
    }
}
