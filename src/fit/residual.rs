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

use crate::linalg::Vector2;
use std::fmt;

/// Stores the residual of a space point, as the result of a `measurement_update`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Residual {
    /// Reference coordinate of the space point
    pub x: f64,
    /// The prefit residual (innovation) in y and z, in cm
    pub prefit: Vector2<f64>,
    /// The postfit residual in y and z, in cm (zero if rejected)
    pub postfit: Vector2<f64>,
    /// The chi square increment of this point, i.e. the Mahalanobis distance of the prefit residual
    /// with respect to the innovation covariance. Compare it to a chi square distribution with two degrees of freedom.
    pub chi2: f64,
    /// Square root of the diagonal of the innovation covariance, in cm
    pub innovation_sigma: Vector2<f64>,
    /// Whether or not this point was rejected
    pub rejected: bool,
}

impl Residual {
    /// Flags a Residual as rejected.
    pub fn rejected(x: f64, prefit: Vector2<f64>, chi2: f64, innovation_sigma: Vector2<f64>) -> Self {
        Self {
            x,
            prefit,
            postfit: Vector2::zeros(),
            chi2,
            innovation_sigma,
            rejected: true,
        }
    }

    pub fn accepted(
        x: f64,
        prefit: Vector2<f64>,
        postfit: Vector2<f64>,
        chi2: f64,
        innovation_sigma: Vector2<f64>,
    ) -> Self {
        Self {
            x,
            prefit,
            postfit,
            chi2,
            innovation_sigma,
            rejected: false,
        }
    }

    /// Prefit residuals normalized by the innovation uncertainty (pulls).
    pub fn pulls(&self) -> Vector2<f64> {
        self.prefit.component_div(&self.innovation_sigma)
    }
}

impl fmt::Display for Residual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Residual at x = {:.4} cm ({}): chi2 = {:.3}\tprefit y = {:+.3e} z = {:+.3e}\tpostfit y = {:+.3e} z = {:+.3e}",
            self.x,
            if self.rejected { "rejected" } else { "accepted" },
            self.chi2,
            self.prefit[0],
            self.prefit[1],
            self.postfit[0],
            self.postfit[1]
        )
    }
}

impl fmt::LowerExp for Residual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Prefit {:e} Postfit {:e}", &self.prefit, &self.postfit)
    }
}
