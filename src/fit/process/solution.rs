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

use crate::fit::Residual;
use crate::track::TrackState;
use std::fmt;

/// The result of fitting one sequence of space points.
#[derive(Clone, Debug, PartialEq)]
pub struct FitSolution {
    /// The state after the last accepted point
    pub state: TrackState,
    /// Number of leading points consumed by the seed
    pub seed_points: usize,
    /// Residuals of every point after the seed which could be predicted, in fit order. Points refused by the chi
    /// square cut or by the update guards have a rejected residual.
    pub residuals: Vec<Residual>,
    /// Indices in the input sequence of the points which were not fused into the track, including those which
    /// could not be predicted
    pub skipped: Vec<usize>,
}

impl FitSolution {
    /// Number of points fused into the track after the seed
    pub fn accepted(&self) -> usize {
        self.residuals.iter().filter(|resid| !resid.rejected).count()
    }

    /// Number of points refused by the chi square cut or by the update guards
    pub fn rejected(&self) -> usize {
        self.residuals.iter().filter(|resid| resid.rejected).count()
    }

    pub fn chi2_ndf(&self) -> Option<f64> {
        self.state.chi2_ndf()
    }

    /// Largest chi square increment among the accepted points
    pub fn max_chi2(&self) -> Option<f64> {
        self.residuals
            .iter()
            .filter(|resid| !resid.rejected)
            .map(|resid| resid.chi2)
            .reduce(f64::max)
    }
}

impl fmt::Display for FitSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Track seeded from {} points, {} accepted, {} skipped",
            self.seed_points,
            self.accepted(),
            self.skipped.len()
        )?;
        match self.chi2_ndf() {
            Some(chi2_ndf) => writeln!(f, "chi2/ndf = {chi2_ndf:.3}")?,
            None => writeln!(f, "chi2 = {:.3} (no degrees of freedom)", self.state.chi2)?,
        }
        write!(f, "{}", self.state)
    }
}
