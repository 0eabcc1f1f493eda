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

/*! # helixfit

Fits the helical trajectory of a charged particle crossing a tracking detector immersed in a uniform magnetic field.

A track is seeded from three space points, or from a coarse prior and one point, then each further point is folded in by a Kalman filter:
the state is propagated along the circular arc in the bending plane, and the measurement is fused through the Kalman gain.

Units are centimeters for lengths, kilogauss for the field and GeV/c for momenta.
*/

/// Space points, the five-parameter track state and its packed covariance.
pub mod track;

/// The helix Kalman filter: seeding, propagation, measurement update, quality gates and the fitting process.
pub mod fit;

/// Generates space points along a known helix, useful to validate and benchmark the filter.
pub mod sim;

/// Configuration loading.
pub mod io;

mod errors;
/// Fitting (almost) never panics: every operation which may fail returns a `TrackError`.
pub use self::errors::{Guard, TrackError};

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::fit::{FitProcess, HelixKF};
pub use self::track::{SpacePoint, TrackState};
