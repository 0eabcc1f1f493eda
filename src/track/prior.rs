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

use super::CONVERSION_CONSTANT;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A coarse prior on the trajectory, e.g. from an upstream detector or a previous fit.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorTrajectory {
    /// Reference coordinate of the starting point of the prior, in cm
    pub x0: f64,
    /// Azimuth of the direction at the starting point, measured in the bending plane from the x axis, in radians
    pub phi0: f64,
    /// Tangent of the dip angle, i.e. dz over the transverse path length
    pub tan_dip: f64,
    /// Charge in units of the elementary charge
    pub charge: i8,
    /// Transverse momentum, in GeV/c
    pub pt: f64,
}

impl PriorTrajectory {
    /// Signed curvature, in 1/cm, implied by this prior in the provided field (in kG).
    pub fn curvature(&self, field: f64) -> f64 {
        0.5 * (-f64::from(self.charge) / self.pt) * CONVERSION_CONSTANT * field
    }

    /// Curvature times the x-coordinate of the arc center, finite even for a straight track.
    pub fn eta(&self, field: f64) -> f64 {
        self.curvature(field) * self.x0 - self.phi0.sin()
    }

    /// The x-coordinate of the center of the arc, or None for an infinite radius.
    pub fn center_x(&self, field: f64) -> Option<f64> {
        let curvature = self.curvature(field);
        if curvature == 0.0 || !curvature.is_finite() {
            None
        } else {
            Some(self.x0 - self.phi0.sin() / curvature)
        }
    }
}

impl fmt::Display for PriorTrajectory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "prior from x = {:.3} cm: phi = {:.4} rad, tan(dip) = {:.4}, q = {}, pT = {:.4} GeV/c",
            self.x0, self.phi0, self.tan_dip, self.charge, self.pt
        )
    }
}
