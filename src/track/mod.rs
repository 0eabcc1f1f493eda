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

mod covar;
mod point;
mod prior;
mod state;

pub use covar::Covariance;
pub use point::SpacePoint;
pub use prior::PriorTrajectory;
pub use state::TrackState;

/// Converts `0.5·(q/pT)·B` into a curvature in 1/cm, for pT in GeV/c and B in kG.
///
/// The factor two absorbs the one half of the seeding convention, so that `P4` is the signed inverse bending radius.
pub const CONVERSION_CONSTANT: f64 = 2.0 * 0.299_792_458e-3;

/// Index of each parameter in the state vector.
pub const IDX_Y: usize = 0;
pub const IDX_Z: usize = 1;
pub const IDX_ETA: usize = 2;
pub const IDX_TAN_DIP: usize = 3;
pub const IDX_CURVATURE: usize = 4;
