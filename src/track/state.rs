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

use super::{
    Covariance, CONVERSION_CONSTANT, IDX_CURVATURE, IDX_ETA, IDX_TAN_DIP, IDX_Y, IDX_Z,
};
use crate::linalg::Vector5;
use std::fmt;

/// The state of a track at the reference coordinate `x`.
///
/// The parameters are, in order:
/// + `P0` the y coordinate (cm)
/// + `P1` the z coordinate (cm)
/// + `P2` the curvature times the x-coordinate of the arc center (unitless)
/// + `P3` the tangent of the dip angle
/// + `P4` the signed curvature (1/cm), proportional to the charge over the transverse momentum and to the field
///
/// With these parameters, the sine of the local azimuth of the track is `P4·x − P2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrackState {
    /// Current reference coordinate
    pub x: f64,
    /// The five track parameters
    pub params: Vector5<f64>,
    /// Covariance of the track parameters
    pub covar: Covariance,
    /// Sum of the chi square increments of all accepted updates
    pub chi2: f64,
    /// Number of space points folded into this state
    pub hits: usize,
}

impl TrackState {
    /// Initializes a state from its parameters and covariance, without any accumulated chi square nor hits.
    pub fn new(x: f64, params: Vector5<f64>, covar: Covariance) -> Self {
        Self {
            x,
            params,
            covar,
            chi2: 0.0,
            hits: 0,
        }
    }

    pub fn y(&self) -> f64 {
        self.params[IDX_Y]
    }

    pub fn z(&self) -> f64 {
        self.params[IDX_Z]
    }

    pub fn eta(&self) -> f64 {
        self.params[IDX_ETA]
    }

    pub fn tan_dip(&self) -> f64 {
        self.params[IDX_TAN_DIP]
    }

    pub fn curvature(&self) -> f64 {
        self.params[IDX_CURVATURE]
    }

    /// Sine of the local azimuth at the provided reference coordinate.
    pub fn local_sine_at(&self, x: f64) -> f64 {
        self.curvature() * x - self.eta()
    }

    /// Sine of the local azimuth at the current reference coordinate.
    pub fn local_sine(&self) -> f64 {
        self.local_sine_at(self.x)
    }

    /// Charge over transverse momentum, in c/GeV, for the provided field in kG.
    pub fn q_over_pt(&self, field: f64) -> f64 {
        -2.0 * self.curvature() / (CONVERSION_CONSTANT * field)
    }

    /// Transverse momentum in GeV/c, infinite for a straight track.
    pub fn pt(&self, field: f64) -> f64 {
        self.q_over_pt(field).abs().recip()
    }

    /// Number of degrees of freedom of the fit: two measurements per hit minus the five parameters.
    pub fn ndf(&self) -> i64 {
        2 * self.hits as i64 - 5
    }

    /// Reduced chi square, if there are any degrees of freedom left
    pub fn chi2_ndf(&self) -> Option<f64> {
        let ndf = self.ndf();
        if ndf > 0 {
            Some(self.chi2 / ndf as f64)
        } else {
            None
        }
    }

    /// One-sigma uncertainties of each parameter
    pub fn sigmas(&self) -> Vector5<f64> {
        self.covar.diagonal().map(|var| var.sqrt())
    }
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sigmas = self.sigmas();
        write!(
            f,
            "x = {:.4} cm\ty = {:.4} ± {:.2e} cm\tz = {:.4} ± {:.2e} cm\teta = {:.4e} ± {:.2e}\ttan(dip) = {:.4} ± {:.2e}\tC = {:.4e} ± {:.2e} 1/cm\tchi2 = {:.3} ({} hits)",
            self.x,
            self.y(),
            sigmas[IDX_Y],
            self.z(),
            sigmas[IDX_Z],
            self.eta(),
            sigmas[IDX_ETA],
            self.tan_dip(),
            sigmas[IDX_TAN_DIP],
            self.curvature(),
            sigmas[IDX_CURVATURE],
            self.chi2,
            self.hits
        )
    }
}

impl fmt::LowerExp for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "x = {:e}\tparams = {:e}\ncovariance =\n{}",
            self.x, self.params, self.covar
        )
    }
}
