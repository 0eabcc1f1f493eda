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

use crate::track::{Covariance, TrackState};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on beta squared, so that the scattering angle stays finite for massless hypotheses.
const MAX_BETA2: f64 = 0.999_999_999_99;

/// Defines which process noise, if any, is added to the covariance during a propagation.
///
/// Energy loss is never modeled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum ScatteringModel {
    /// No process noise: the covariance is only transported along the arc.
    #[default]
    None,
    /// Multiple scattering in a homogeneous medium, treated as a thin layer at the end of each step.
    ThinLayer(ThinLayer),
}

/// Material and particle hypothesis of the thin-layer multiple scattering model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThinLayer {
    /// Radiation length of the medium, in g/cm^2
    pub radiation_length: f64,
    /// Density of the medium, in g/cm^3
    pub density: f64,
    /// Mass hypothesis of the particle, in GeV/c^2
    pub mass: f64,
}

impl ThinLayer {
    /// Argon gas at normal conditions with a pion hypothesis.
    pub fn argon_pion() -> Self {
        Self {
            radiation_length: 19.55,
            density: 1.66e-3,
            mass: 0.139_570,
        }
    }

    /// Variance of the projected multiple scattering angle after crossing `step` cm at momentum squared `p2` (GeV/c)^2.
    pub fn theta2(&self, step: f64, p2: f64) -> f64 {
        let beta2 = (p2 / (p2 + self.mass.powi(2))).min(MAX_BETA2);
        14.1 * 14.1 / (beta2 * p2 * 1e6) * step * self.density / self.radiation_length
    }
}

impl ScatteringModel {
    /// Adds the process noise of a step of straight length `step` ending at the provided state.
    ///
    /// The field, in kG, is required to get the momentum from the curvature. Without a field or
    /// without curvature, the momentum is unknown and no noise is added.
    pub(crate) fn apply(&self, state: &TrackState, step: f64, field: f64, covar: &mut Covariance) {
        let layer = match self {
            ScatteringModel::None => return,
            ScatteringModel::ThinLayer(layer) => layer,
        };

        let inv_pt2 = state.q_over_pt(field).powi(2);
        if !(inv_pt2.is_finite() && inv_pt2 > 0.0) {
            debug!("momentum undefined at x = {:.3} cm, scattering skipped", state.x);
            return;
        }

        let tan_dip = state.tan_dip();
        let p2 = (1.0 + tan_dip.powi(2)) / inv_pt2;
        let theta2 = layer.theta2(step, p2);

        // A kick of the dip angle changes the dip, and the curvature through pT = p·cos(dip).
        // A kick of the azimuth only changes eta, through the local cosine.
        let sine = state.local_sine();
        let curvature = state.curvature();
        let zz1 = 1.0 + tan_dip.powi(2);
        let dip_kick = [curvature * state.x * tan_dip, zz1, curvature * tan_dip];
        let phi_kick = (1.0 - sine.powi(2)).sqrt() * zz1.sqrt();

        for i in 0..3 {
            for j in 0..=i {
                covar[(i + 2, j + 2)] += dip_kick[i] * dip_kick[j] * theta2;
            }
        }
        covar[(2, 2)] += phi_kick.powi(2) * theta2;
    }
}

impl fmt::Display for ScatteringModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScatteringModel::None => write!(f, "no multiple scattering"),
            ScatteringModel::ThinLayer(layer) => write!(
                f,
                "thin layer multiple scattering (X0 = {} g/cm^2, rho = {:.3e} g/cm^3, m = {} GeV)",
                layer.radiation_length, layer.density, layer.mass
            ),
        }
    }
}
