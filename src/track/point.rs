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

/// A single detector measurement: the transverse position `(y, z)` measured at the reference coordinate `x`.
///
/// The y and z measurements are independent, there is no covariance term between them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacePoint {
    /// Reference coordinate, in cm
    pub x: f64,
    /// Measured coordinate in the bending plane, in cm
    pub y: f64,
    /// Measured coordinate along the field, in cm
    pub z: f64,
    /// Variance of the y measurement, in cm^2
    pub sigma_y2: f64,
    /// Variance of the z measurement, in cm^2
    pub sigma_z2: f64,
}

impl SpacePoint {
    pub fn new(x: f64, y: f64, z: f64, sigma_y2: f64, sigma_z2: f64) -> Self {
        Self {
            x,
            y,
            z,
            sigma_y2,
            sigma_z2,
        }
    }

    /// Initializes a space point from the one-sigma resolutions instead of the variances.
    pub fn with_resolution(x: f64, y: f64, z: f64, sigma_y: f64, sigma_z: f64) -> Self {
        Self::new(x, y, z, sigma_y.powi(2), sigma_z.powi(2))
    }
}

impl fmt::Display for SpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "x = {:.4} cm\ty = {:.4} ± {:.1e} cm\tz = {:.4} ± {:.1e} cm",
            self.x,
            self.y,
            self.sigma_y2.sqrt(),
            self.z,
            self.sigma_z2.sqrt()
        )
    }
}
