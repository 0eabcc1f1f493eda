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

use snafu::prelude::*;

use crate::errors::{Guard, PropagationFailedSnafu, TrackError};
use crate::fit::gate::MAX_LOCAL_SINE;
use crate::fit::scattering::ScatteringModel;
use crate::track::TrackState;

impl TrackState {
    /// Predicts this state at the reference coordinate `x`, along the circular arc in the bending plane.
    ///
    /// The circle parameters (P2, P3, P4) are invariant along the arc; only y and z change. The covariance is
    /// transported with the Jacobian of this map, and the process noise of the scattering model is added.
    /// The field (kG) is only needed by the scattering model.
    ///
    /// Fails if the local azimuthal sine at the current coordinate or at `x` reaches 0.9. This state is never altered.
    pub fn predict(
        &self,
        x: f64,
        field: f64,
        scattering: &ScatteringModel,
    ) -> Result<Self, TrackError> {
        let (x1, x2) = (self.x, x);
        let dx = x2 - x1;

        let c1 = self.local_sine_at(x1);
        let c2 = self.local_sine_at(x2);
        ensure!(
            c1.abs() < MAX_LOCAL_SINE && c2.abs() < MAX_LOCAL_SINE,
            PropagationFailedSnafu { guard: Guard::Arc }
        );
        let r1 = (1.0 - c1 * c1).sqrt();
        let r2 = (1.0 - c2 * c2).sqrt();

        let tan_dip = self.tan_dip();
        let (rr, cc) = (r1 + r2, c1 + c2);

        // dy/dx over the step is the tangent of the mean azimuth, and dz/dx is
        // (c1 + c2) / (c1·r2 + c2·r1) times the dip, written in a form which stays finite when c1 = -c2.
        let slope_y = cc / rr;
        let num_z = 1.0 + r1 * r2 + c1 * c2;
        let slope_z = num_z / rr;

        let mut predicted = *self;
        predicted.x = x2;
        predicted.params[0] += dx * slope_y;
        predicted.params[1] += dx * slope_z * tan_dip;

        // Partial derivatives of both slopes with respect to c1 and c2,
        // knowing that dc/dP2 = -1 and dc/dP4 = x.
        let rr2 = rr * rr;
        let dy_dc1 = (rr + cc * c1 / r1) / rr2;
        let dy_dc2 = (rr + cc * c2 / r2) / rr2;
        let dz_dc1 = ((c2 - c1 * r2 / r1) * rr + num_z * c1 / r1) / rr2;
        let dz_dc2 = ((c1 - c2 * r1 / r2) * rr + num_z * c2 / r2) / rr2;

        // F = I + f, where only these five entries of f are non-zero
        let f02 = -dx * (dy_dc1 + dy_dc2);
        let f04 = dx * (x1 * dy_dc1 + x2 * dy_dc2);
        let f12 = -dx * tan_dip * (dz_dc1 + dz_dc2);
        let f13 = dx * slope_z;
        let f14 = dx * tan_dip * (x1 * dz_dc1 + x2 * dz_dc2);

        // b = C·f^T (only its first two columns are non-zero)
        let c = &self.covar;
        let b = |i: usize| -> (f64, f64) {
            (
                f02 * c[(i, 2)] + f04 * c[(i, 4)],
                f12 * c[(i, 2)] + f13 * c[(i, 3)] + f14 * c[(i, 4)],
            )
        };
        let (b00, b01) = b(0);
        let (b10, b11) = b(1);
        let (b20, b21) = b(2);
        let (b30, b31) = b(3);
        let (b40, b41) = b(4);

        // a = f·b = f·C·f^T
        let a00 = f02 * b20 + f04 * b40;
        let a01 = f02 * b21 + f04 * b41;
        let a11 = f12 * b21 + f13 * b31 + f14 * b41;

        // F·C·F^T = C + (a + b + b^T)
        let cov = &mut predicted.covar;
        cov[(0, 0)] += a00 + 2.0 * b00;
        cov[(1, 0)] += a01 + b01 + b10;
        cov[(1, 1)] += a11 + 2.0 * b11;
        cov[(2, 0)] += b20;
        cov[(2, 1)] += b21;
        cov[(3, 0)] += b30;
        cov[(3, 1)] += b31;
        cov[(4, 0)] += b40;
        cov[(4, 1)] += b41;

        if *scattering != ScatteringModel::None {
            let step = (dx.powi(2)
                + (predicted.y() - self.y()).powi(2)
                + (predicted.z() - self.z()).powi(2))
            .sqrt();
            let mut covar = predicted.covar;
            scattering.apply(&predicted, step, field, &mut covar);
            predicted.covar = covar;
        }

        debug!(
            "propagated from x = {:.4} to {:.4} cm: y = {:.4}, z = {:.4}",
            x1,
            x2,
            predicted.y(),
            predicted.z()
        );

        Ok(predicted)
    }

    /// Propagates this state in place to the reference coordinate `x`. See `predict`.
    ///
    /// This state is left unchanged on failure.
    pub fn propagate_to(
        &mut self,
        x: f64,
        field: f64,
        scattering: &ScatteringModel,
    ) -> Result<(), TrackError> {
        *self = self.predict(x, field, scattering)?;
        Ok(())
    }
}
