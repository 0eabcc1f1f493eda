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

use crate::errors::{Guard, SeedRejectedSnafu, TrackError};
use crate::fit::gate::{valid_arc, GateConfig};
use crate::linalg::{Matrix6, SMatrix, Vector5, Vector6};
use crate::track::{Covariance, PriorTrajectory, SpacePoint, TrackState};

/// Seed variance of `P2` when seeding from a prior.
pub const SEED_ETA_VAR: f64 = 5e-4;
/// Seed variance of `P3` when seeding from a prior.
pub const SEED_TAN_DIP_VAR: f64 = 5e-4;
/// Seed variance of `P4`, in 1/cm^2, when seeding from a prior.
pub const SEED_CURVATURE_VAR: f64 = 1e-5;

/// Maximum z distance, in cm, between the middle seed point and the line joining the outer two.
pub const Z_TOLERANCE: f64 = 10.0;
/// Minimum sine of the turning angle between the two seed segments.
const COLLINEAR_TOL: f64 = 1e-9;
/// Step, in cm, of the finite differences of the seed covariance.
const FD_STEP: f64 = 1e-4;

impl TrackState {
    /// Seeds a track at `point` from a coarse prior trajectory, in a field of `field` kG.
    ///
    /// The prior provides the dip, the curvature (from its charge and transverse momentum) and the arc center
    /// (from its starting point and direction). The position and its variance come from the point.
    pub fn seed_from_prior(
        prior: &PriorTrajectory,
        point: &SpacePoint,
        field: f64,
        gate: &GateConfig,
    ) -> Result<Self, TrackError> {
        let tan_dip = prior.tan_dip;
        ensure!(gate.valid_dip(tan_dip), SeedRejectedSnafu { guard: Guard::Dip });

        let curvature = prior.curvature(field);
        ensure!(
            gate.valid_curvature(curvature),
            SeedRejectedSnafu {
                guard: Guard::Curvature
            }
        );

        let eta = prior.eta(field);
        ensure!(
            valid_arc(eta, curvature, point.x),
            SeedRejectedSnafu { guard: Guard::Arc }
        );

        let params = Vector5::new(point.y, point.z, eta, tan_dip, curvature);
        let covar = Covariance::from_diagonal(&Vector5::new(
            point.sigma_y2,
            point.sigma_z2,
            SEED_ETA_VAR,
            SEED_TAN_DIP_VAR,
            SEED_CURVATURE_VAR,
        ));

        debug!("seeded from {prior} at {point}");

        Ok(Self {
            x: point.x,
            params,
            covar,
            chi2: 0.0,
            hits: 1,
        })
    }

    /// Seeds a track at `p1` from three points, `p1` being the nearest and `p3` the farthest.
    ///
    /// The curvature and `P2` come from the circle through the three points in the bending plane, the dip
    /// from the line joining `p1` and `p3`. The covariance is propagated at first order from the point
    /// variances, using finite differences of those closed-form expressions.
    pub fn seed_from_three_points(
        p1: &SpacePoint,
        p2: &SpacePoint,
        p3: &SpacePoint,
        gate: &GateConfig,
    ) -> Result<Self, TrackError> {
        // The middle point must agree in z with the outer two
        let z_line = p1.z + (p3.z - p1.z) * (p2.x - p1.x) / (p3.x - p1.x);
        ensure!(
            (z_line - p2.z).abs() <= Z_TOLERANCE,
            SeedRejectedSnafu {
                guard: Guard::ZConsistency
            }
        );

        let xs = [p1.x, p2.x, p3.x];
        let msr = Vector6::new(p1.y, p1.z, p2.y, p2.z, p3.y, p3.z);

        let params = helix_through(&xs, &msr).context(SeedRejectedSnafu {
            guard: Guard::Collinear,
        })?;

        if let Err(guard) = gate.check(&params, p1.x) {
            return SeedRejectedSnafu { guard }.fail();
        }

        // Jacobian of the parameters with respect to (y1, z1, y2, z2, y3, z3)
        let mut jac = SMatrix::<f64, 5, 6>::zeros();
        jac[(0, 0)] = 1.0;
        jac[(1, 1)] = 1.0;
        for col in 0..6 {
            let mut fwd = msr;
            fwd[col] += FD_STEP;
            let mut bwd = msr;
            bwd[col] -= FD_STEP;
            let (plus, minus) = match (helix_through(&xs, &fwd), helix_through(&xs, &bwd)) {
                (Some(plus), Some(minus)) => (plus, minus),
                _ => {
                    return SeedRejectedSnafu {
                        guard: Guard::Collinear,
                    }
                    .fail()
                }
            };
            for row in 2..5 {
                jac[(row, col)] = (plus[row] - minus[row]) / (2.0 * FD_STEP);
            }
        }

        let msr_var = Matrix6::from_diagonal(&Vector6::new(
            p1.sigma_y2,
            p1.sigma_z2,
            p2.sigma_y2,
            p2.sigma_z2,
            p3.sigma_y2,
            p3.sigma_z2,
        ));
        let covar = Covariance::from_matrix(&(jac * msr_var * jac.transpose()));

        debug!(
            "three point seed at x = {:.3} cm: C = {:.4e} 1/cm, tan(dip) = {:.4}",
            p1.x, params[4], params[3]
        );

        Ok(Self {
            x: p1.x,
            params,
            covar,
            chi2: 0.0,
            hits: 3,
        })
    }
}

/// Parameters at the first point of the helix through three points, from their reference coordinates and
/// their measurements ordered as (y1, z1, y2, z2, y3, z3).
///
/// The curvature is signed as the second derivative of y with respect to x, whatever the point order.
/// Returns None if the points are collinear or coincident in the bending plane.
fn helix_through(xs: &[f64; 3], msr: &Vector6<f64>) -> Option<Vector5<f64>> {
    let [x1, x2, x3] = *xs;
    let (y1, z1, y2, y3, z3) = (msr[0], msr[1], msr[2], msr[4], msr[5]);

    let l12 = (x2 - x1).hypot(y2 - y1);
    let l23 = (x3 - x2).hypot(y3 - y2);
    let l13 = (x3 - x1).hypot(y3 - y1);

    // Twice the signed area of the triangle
    let d = (x2 - x1) * (y3 - y2) - (x3 - x2) * (y2 - y1);
    if !(d.abs() > COLLINEAR_TOL * l12 * l23) {
        return None;
    }
    // The circle center is at (a / d, b / d)
    let a = 0.5
        * ((y3 - y2) * (y2 * y2 - y1 * y1 + x2 * x2 - x1 * x1)
            - (y2 - y1) * (y3 * y3 - y2 * y2 + x3 * x3 - x2 * x2));

    let direction = (x3 - x1).signum();
    let norm = 2.0 * direction / (l12 * l23 * l13);
    let curvature = d * norm;
    let eta = a * norm;
    let tan_dip = (z3 - z1) / (direction * l13);

    Some(Vector5::new(y1, z1, eta, tan_dip, curvature))
}
