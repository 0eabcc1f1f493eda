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

use crate::io::ConfigError;
use snafu::prelude::*;
use std::fmt;

/// The quality gate which triggered a rejection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Guard {
    /// The tangent of the dip angle exceeds the configured maximum.
    Dip,
    /// The curvature is at or beyond the curvature floor, i.e. the transverse momentum is too low.
    Curvature,
    /// The local azimuthal sine `P4·x − P2` is at or beyond 0.9.
    Arc,
    /// The middle seed point does not lie on the straight line joining the outer two in z.
    ZConsistency,
    /// The seed points are collinear or coincident in the bending plane.
    Collinear,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Guard::Dip => write!(f, "dip angle"),
            Guard::Curvature => write!(f, "curvature floor"),
            Guard::Arc => write!(f, "local arc sine"),
            Guard::ZConsistency => write!(f, "z consistency"),
            Guard::Collinear => write!(f, "collinearity"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TrackError {
    #[snafu(display("seed rejected by the {guard} guard"))]
    SeedRejected { guard: Guard },
    #[snafu(display("propagation failed on the {guard} guard"))]
    PropagationFailed { guard: Guard },
    #[snafu(display("measurement update rejected by the {guard} guard"))]
    UpdateRejected { guard: Guard },
    #[snafu(display("innovation covariance is singular (det = {det:e})"))]
    SingularInnovation { det: f64 },
    #[snafu(display("updated covariance is ill conditioned: C{index}{index} = {value:e}"))]
    IllConditionedCovariance { index: usize, value: f64 },
    #[snafu(display(
        "space point at x = {point_x} cm does not match the state at x = {state_x} cm, propagate first"
    ))]
    MisalignedPoint { state_x: f64, point_x: f64 },
    #[snafu(display("at least {need} points required to {action}, got {got}"))]
    TooFewPoints {
        need: usize,
        got: usize,
        action: &'static str,
    },
    #[snafu(display("track fit failed because {source}"))]
    TrackConfigError { source: ConfigError },
}

impl TrackError {
    /// Returns the guard which caused this error, if it is one of the expected geometric rejections.
    pub fn guard(&self) -> Option<Guard> {
        match *self {
            TrackError::SeedRejected { guard }
            | TrackError::PropagationFailed { guard }
            | TrackError::UpdateRejected { guard } => Some(guard),
            _ => None,
        }
    }

    /// Returns true if this error is a frequent and legitimate degenerate geometry condition.
    /// Callers usually discard the offending point and continue.
    pub fn is_rejection(&self) -> bool {
        self.guard().is_some()
    }
}
