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

use crate::errors::Guard;
use crate::linalg::Vector5;
use crate::track::{IDX_CURVATURE, IDX_ETA, IDX_TAN_DIP};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use typed_builder::TypedBuilder;

/// The local azimuthal sine `P4·x − P2` must stay strictly below this value in magnitude.
pub const MAX_LOCAL_SINE: f64 = 0.9;

/// Thresholds of the quality gates guarding against physically degenerate configurations.
///
/// All predicates are pure and return false on NaN inputs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct GateConfig {
    /// Upper bound on the absolute value of the tangent of the dip angle
    #[builder(default = 1.2)]
    #[serde(default = "default_max_dip_angle")]
    pub max_dip_angle: f64,
    /// Curvatures (in 1/cm) must be strictly below this, which bounds the lowest supported transverse momentum
    #[builder(default = 0.05)]
    #[serde(default = "default_curvature_floor")]
    pub curvature_floor: f64,
}

fn default_max_dip_angle() -> f64 {
    1.2
}

fn default_curvature_floor() -> f64 {
    0.05
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_dip_angle: default_max_dip_angle(),
            curvature_floor: default_curvature_floor(),
        }
    }
}

impl GateConfig {
    pub fn valid_dip(&self, tan_dip: f64) -> bool {
        tan_dip.abs() <= self.max_dip_angle
    }

    pub fn valid_curvature(&self, curvature: f64) -> bool {
        curvature.abs() < self.curvature_floor
    }

    /// Checks all three gates on a set of track parameters at `x`, in the order dip, curvature, arc.
    ///
    /// Returns the first guard which fails.
    pub fn check(&self, params: &Vector5<f64>, x: f64) -> Result<(), Guard> {
        if !self.valid_dip(params[IDX_TAN_DIP]) {
            Err(Guard::Dip)
        } else if !self.valid_curvature(params[IDX_CURVATURE]) {
            Err(Guard::Curvature)
        } else if !valid_arc(params[IDX_ETA], params[IDX_CURVATURE], x) {
            Err(Guard::Arc)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "|tan(dip)| <= {}, |C| < {:.3e} 1/cm, |C·x - eta| < {}",
            self.max_dip_angle, self.curvature_floor, MAX_LOCAL_SINE
        )
    }
}

/// Returns whether the local azimuthal sine at `x` is safely within [-1, 1].
pub fn valid_arc(eta: f64, curvature: f64, x: f64) -> bool {
    (curvature * x - eta).abs() < MAX_LOCAL_SINE
}
