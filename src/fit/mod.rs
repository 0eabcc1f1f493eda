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

pub use crate::errors::{Guard, TrackError};
pub use crate::track::{SpacePoint, TrackState};

/// Quality gates on the track parameters
pub mod gate;
pub use gate::{GateConfig, MAX_LOCAL_SINE};

/// The helix Kalman filter
pub mod kalman;
pub use kalman::{HelixKF, SeedingMode};

/// Provides the fitting process of a sequence of space points
pub mod process;
pub use process::{FitConfig, FitProcess, FitSolution};

mod residual;
pub use residual::Residual;

/// Provides the process noise models
pub mod scattering;
pub use scattering::{ScatteringModel, ThinLayer};

/// Defines a track Filter: how a track is seeded, predicted to a new reference coordinate, and corrected with a space point.
pub trait Filter {
    /// Seeds a new track from the first points of the sequence.
    ///
    /// Returns the seeded state and the number of points consumed by the seed.
    fn seed(&self, points: &[SpacePoint]) -> Result<(TrackState, usize), TrackError>;

    /// Computes a time update/prediction of the state to the new reference coordinate, without altering the provided state.
    fn time_update(&self, state: &TrackState, x: f64) -> Result<TrackState, TrackError>;

    /// Returns the chi square increment the point would add to the state, without altering the state.
    fn predicted_chi2(&self, state: &TrackState, point: &SpacePoint) -> Result<f64, TrackError>;

    /// Computes the measurement update of the state with the provided point, which must be at the same reference coordinate.
    ///
    /// The state is only modified if the update succeeds. A point elsewhere is a `MisalignedPoint` error.
    fn measurement_update(
        &self,
        state: &mut TrackState,
        point: &SpacePoint,
    ) -> Result<Residual, TrackError>;
}
