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

use rayon::prelude::*;
use snafu::prelude::*;

use crate::errors::{TooFewPointsSnafu, TrackConfigSnafu, TrackError};
use crate::fit::{Filter, HelixKF, Residual};
use crate::linalg::Vector2;
use crate::track::{SpacePoint, TrackState};

mod conf;
pub use conf::FitConfig;
mod solution;
pub use solution::FitSolution;

/// A track fitting process: seeds a track from the first points of a sequence, then predicts and corrects it with
/// every following point, in order.
///
/// Points which fail a geometric guard, and points beyond the optional chi square cut, are skipped and the track
/// continues from its last accepted state. Any other failure ends the fit of that sequence.
#[derive(Clone, Debug)]
pub struct FitProcess<F: Filter> {
    pub filter: F,
    /// Points whose predicted chi square increment is above this value are skipped
    pub max_chi2: Option<f64>,
}

impl<F: Filter> FitProcess<F> {
    pub fn new(filter: F, max_chi2: Option<f64>) -> Self {
        Self { filter, max_chi2 }
    }

    /// Fits the provided sequence of space points, ordered in the direction of the fit.
    pub fn fit(&self, points: &[SpacePoint]) -> Result<FitSolution, TrackError> {
        ensure!(
            !points.is_empty(),
            TooFewPointsSnafu {
                need: 1_usize,
                got: 0_usize,
                action: "fit a track",
            }
        );

        let (mut state, seed_points) = self.filter.seed(points)?;
        let mut residuals = Vec::with_capacity(points.len() - seed_points);
        let mut skipped = Vec::new();

        for (idx, point) in points.iter().enumerate().skip(seed_points) {
            let mut predicted = match self.filter.time_update(&state, point.x) {
                Ok(predicted) => predicted,
                Err(e) if e.is_rejection() => {
                    warn!("skipping point #{idx} at x = {:.4} cm: {e}", point.x);
                    skipped.push(idx);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(max_chi2) = self.max_chi2 {
                let chi2 = self.filter.predicted_chi2(&predicted, point)?;
                if chi2 > max_chi2 {
                    warn!(
                        "skipping point #{idx} at x = {:.4} cm: chi2 = {chi2:.3} > {max_chi2}",
                        point.x
                    );
                    residuals.push(rejected_residual(&predicted, point, chi2));
                    skipped.push(idx);
                    continue;
                }
            }

            match self.filter.measurement_update(&mut predicted, point) {
                Ok(residual) => {
                    residuals.push(residual);
                    state = predicted;
                }
                Err(e) if e.is_rejection() => {
                    warn!("skipping point #{idx} at x = {:.4} cm: {e}", point.x);
                    let chi2 = self.filter.predicted_chi2(&predicted, point)?;
                    residuals.push(rejected_residual(&predicted, point, chi2));
                    skipped.push(idx);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "fitted {} points ({} skipped) to x = {:.4} cm: chi2 = {:.3} over {} hits",
            points.len(),
            skipped.len(),
            state.x,
            state.chi2,
            state.hits
        );

        Ok(FitSolution {
            state,
            seed_points,
            residuals,
            skipped,
        })
    }
}

impl<F: Filter + Sync> FitProcess<F> {
    /// Fits each of the provided sequences independently, in parallel. The results are in the order of the sequences.
    pub fn fit_many(&self, tracks: &[Vec<SpacePoint>]) -> Vec<Result<FitSolution, TrackError>> {
        info!("fitting {} tracks", tracks.len());
        tracks.par_iter().map(|points| self.fit(points)).collect()
    }
}

impl FitProcess<HelixKF> {
    /// Builds the helix fitting process from its configuration, which is validated first.
    pub fn from_config(cfg: &FitConfig) -> Result<Self, TrackError> {
        cfg.validate().context(TrackConfigSnafu)?;
        info!("helix fit with {cfg}");
        Ok(Self::new(HelixKF::from_config(cfg), cfg.max_chi2))
    }
}

/// Residual of a point refused by the chi square cut or by the update guards, from the predicted state at the point.
fn rejected_residual(predicted: &TrackState, point: &SpacePoint, chi2: f64) -> Residual {
    let prefit = Vector2::new(point.y - predicted.y(), point.z - predicted.z());
    let sigma = Vector2::new(
        (point.sigma_y2 + predicted.covar[(0, 0)]).sqrt(),
        (point.sigma_z2 + predicted.covar[(1, 1)]).sqrt(),
    );
    Residual::rejected(point.x, prefit, chi2, sigma)
}
