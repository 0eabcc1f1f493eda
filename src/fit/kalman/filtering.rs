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

use super::{HelixKF, SeedingMode};
use crate::errors::{
    Guard, IllConditionedCovarianceSnafu, MisalignedPointSnafu, SingularInnovationSnafu,
    TooFewPointsSnafu, TrackError, UpdateRejectedSnafu,
};
use crate::fit::gate::MAX_LOCAL_SINE;
use crate::fit::{Filter, Residual};
use crate::linalg::{Matrix5x2, Vector2};
use crate::track::{Covariance, PriorTrajectory, SpacePoint, TrackState};

/// The innovation covariance is singular when its determinant is below this fraction of the product of its diagonal,
/// i.e. when the correlation between the y and z innovations is within about 1e-12 of unity.
const SINGULAR_TOL: f64 = 1e-12;

/// The innovation of a space point with respect to a state at the same reference coordinate.
///
/// The innovation covariance R is built once and its inverse serves both the gain and the chi square.
#[derive(Copy, Clone, Debug)]
struct Innovation {
    dy: f64,
    dz: f64,
    r00: f64,
    r01: f64,
    r11: f64,
    det: f64,
}

impl Innovation {
    fn new(state: &TrackState, point: &SpacePoint) -> Result<Self, TrackError> {
        ensure!(
            state.x == point.x,
            MisalignedPointSnafu {
                state_x: state.x,
                point_x: point.x
            }
        );
        let r00 = point.sigma_y2 + state.covar[(0, 0)];
        let r01 = state.covar[(1, 0)];
        let r11 = point.sigma_z2 + state.covar[(1, 1)];
        let det = r00 * r11 - r01 * r01;
        // R must be positive definite: r00 > 0 and det > 0 imply r11 > 0
        ensure!(
            det.is_finite() && r00 > 0.0 && det > SINGULAR_TOL * r00 * r11,
            SingularInnovationSnafu { det }
        );

        Ok(Self {
            dy: point.y - state.y(),
            dz: point.z - state.z(),
            r00,
            r01,
            r11,
            det,
        })
    }

    /// Inverse of R, as (inv00, inv01, inv11)
    fn inverse(&self) -> (f64, f64, f64) {
        (
            self.r11 / self.det,
            -self.r01 / self.det,
            self.r00 / self.det,
        )
    }

    /// Equals dy²·inv00 + 2·dy·dz·inv01 + dz²·inv11, evaluated with the LDL^T factors of R so that
    /// each term is non-negative.
    fn chi2(&self) -> f64 {
        let schur = self.det / self.r00;
        let dz_given_dy = self.dz - self.r01 / self.r00 * self.dy;
        self.dy.powi(2) / self.r00 + dz_given_dy.powi(2) / schur
    }

    fn sigma(&self) -> Vector2<f64> {
        Vector2::new(self.r00.sqrt(), self.r11.sqrt())
    }
}

impl TrackState {
    /// Returns the chi square increment that the provided point would add to this state, without updating it.
    ///
    /// The point must be at the reference coordinate of this state, i.e. the state must have been predicted first.
    pub fn predicted_chi2(&self, point: &SpacePoint) -> Result<f64, TrackError> {
        Ok(Innovation::new(self, point)?.chi2())
    }

    /// Fuses the provided point into this state through the Kalman gain.
    ///
    /// Returns the residual of the point. This state is left unchanged if the point is not at the reference
    /// coordinate of this state, if the innovation covariance is singular, if the filtered local azimuthal sine reaches 0.9, or if the filtered covariance has a
    /// non-positive variance.
    pub fn update(&mut self, point: &SpacePoint) -> Result<Residual, TrackError> {
        let innov = Innovation::new(self, point)?;
        let (inv00, inv01, inv11) = innov.inverse();

        // K = C[:, 0:2]·R^-1
        let c = &self.covar;
        let gain = Matrix5x2::from_fn(|i, j| {
            if j == 0 {
                c[(i, 0)] * inv00 + c[(i, 1)] * inv01
            } else {
                c[(i, 0)] * inv01 + c[(i, 1)] * inv11
            }
        });
        let innovation = Vector2::new(innov.dy, innov.dz);
        let correction = gain * innovation;

        let eta = self.eta() + correction[2];
        let curvature = self.curvature() + correction[4];
        ensure!(
            (curvature * point.x - eta).abs() < MAX_LOCAL_SINE,
            UpdateRejectedSnafu { guard: Guard::Arc }
        );

        // C' = C - K·H·C, where H·C are the first two rows of C
        let mut covar = Covariance::zeros();
        for i in 0..5 {
            for j in 0..=i {
                covar[(i, j)] = c[(i, j)] - (gain[(i, 0)] * c[(0, j)] + gain[(i, 1)] * c[(1, j)]);
            }
        }
        if let Some((index, value)) = covar.first_non_positive_variance() {
            return IllConditionedCovarianceSnafu { index, value }.fail();
        }

        let chi2 = innov.chi2();
        let mut params = self.params + correction;
        params[2] = eta;
        params[4] = curvature;

        self.params = params;
        self.covar = covar;
        self.chi2 += chi2;
        self.hits += 1;

        let postfit = Vector2::new(point.y - self.y(), point.z - self.z());
        debug!(
            "updated at x = {:.4} cm with chi2 = {:.3}: y = {:.4}, z = {:.4}, C = {:.4e}",
            point.x,
            chi2,
            self.y(),
            self.z(),
            self.curvature()
        );

        Ok(Residual::accepted(
            point.x,
            innovation,
            postfit,
            chi2,
            innov.sigma(),
        ))
    }
}

impl HelixKF {
    /// Seeds a track at `point` from a prior trajectory, in the field of this filter.
    pub fn seed_from_prior(
        &self,
        prior: &PriorTrajectory,
        point: &SpacePoint,
    ) -> Result<TrackState, TrackError> {
        TrackState::seed_from_prior(prior, point, self.field, &self.gate)
    }

    /// Seeds a track at `p1` from three points, `p1` being the nearest.
    pub fn seed_from_three_points(
        &self,
        p1: &SpacePoint,
        p2: &SpacePoint,
        p3: &SpacePoint,
    ) -> Result<TrackState, TrackError> {
        TrackState::seed_from_three_points(p1, p2, p3, &self.gate)
    }

    /// Predicts the state at `x` without altering it.
    pub fn predict(&self, state: &TrackState, x: f64) -> Result<TrackState, TrackError> {
        state.predict(x, self.field, &self.scattering)
    }

    /// Propagates the state in place to `x`.
    pub fn propagate_to(&self, state: &mut TrackState, x: f64) -> Result<(), TrackError> {
        state.propagate_to(x, self.field, &self.scattering)
    }

    /// Fuses the point into a state already propagated to the point.
    pub fn update(
        &self,
        state: &mut TrackState,
        point: &SpacePoint,
    ) -> Result<Residual, TrackError> {
        state.update(point)
    }

    /// Propagates the state to the point and fuses it. The state is only modified if both steps succeed.
    pub fn propagate_and_update(
        &self,
        state: &mut TrackState,
        point: &SpacePoint,
    ) -> Result<Residual, TrackError> {
        let mut predicted = self.predict(state, point.x)?;
        let residual = predicted.update(point)?;
        *state = predicted;
        Ok(residual)
    }
}

impl Filter for HelixKF {
    fn seed(&self, points: &[SpacePoint]) -> Result<(TrackState, usize), TrackError> {
        let need = self.seeding.points();
        ensure!(
            points.len() >= need,
            TooFewPointsSnafu {
                need,
                got: points.len(),
                action: "seed a track",
            }
        );

        let state = match &self.seeding {
            // The sequence is ordered in the direction of the fit, so the third point is the nearest to the rest.
            SeedingMode::ThreePoints => {
                self.seed_from_three_points(&points[2], &points[1], &points[0])?
            }
            SeedingMode::Prior(prior) => self.seed_from_prior(prior, &points[0])?,
        };

        Ok((state, need))
    }

    fn time_update(&self, state: &TrackState, x: f64) -> Result<TrackState, TrackError> {
        self.predict(state, x)
    }

    fn predicted_chi2(&self, state: &TrackState, point: &SpacePoint) -> Result<f64, TrackError> {
        state.predicted_chi2(point)
    }

    fn measurement_update(
        &self,
        state: &mut TrackState,
        point: &SpacePoint,
    ) -> Result<Residual, TrackError> {
        state.update(point)
    }
}
