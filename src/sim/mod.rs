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

use rand::Rng;
use rand_distr::StandardNormal;
use serde_derive::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::linalg::Vector5;
use crate::track::{PriorTrajectory, SpacePoint};

/// A true helix, from which noisy space points are generated.
///
/// The helix starts at `(x0, y0, z0)` with the azimuth `phi0`, which must be within ±π/2 so that the track
/// moves towards increasing x. Points are measured with independent white noise in y and z.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct HelixSim {
    #[builder(default)]
    pub x0: f64,
    #[builder(default)]
    pub y0: f64,
    #[builder(default)]
    pub z0: f64,
    /// Azimuth at the starting point, in radians
    #[builder(default)]
    pub phi0: f64,
    #[builder(default)]
    pub tan_dip: f64,
    /// Signed curvature in 1/cm, positive when y curves towards positive values
    pub curvature: f64,
    /// Resolution of the y measurement, in cm
    #[builder(default)]
    pub sigma_y: f64,
    /// Resolution of the z measurement, in cm
    #[builder(default)]
    pub sigma_z: f64,
}

impl HelixSim {
    /// The helix of a prior trajectory starting from `(x0, y0, z0)` in the provided field (kG), without noise.
    pub fn from_prior(prior: &PriorTrajectory, y0: f64, z0: f64, field: f64) -> Self {
        Self {
            x0: prior.x0,
            y0,
            z0,
            phi0: prior.phi0,
            tan_dip: prior.tan_dip,
            curvature: prior.curvature(field),
            sigma_y: 0.0,
            sigma_z: 0.0,
        }
    }

    /// Sets the measurement resolutions, in cm.
    pub fn with_noise(mut self, sigma_y: f64, sigma_z: f64) -> Self {
        self.sigma_y = sigma_y;
        self.sigma_z = sigma_z;
        self
    }

    pub fn eta(&self) -> f64 {
        self.curvature * self.x0 - self.phi0.sin()
    }

    /// Sine of the local azimuth at `x`.
    pub fn local_sine_at(&self, x: f64) -> f64 {
        self.curvature * x - self.eta()
    }

    /// The true track parameters at `x`, or None if the helix never reaches `x` (it turns back before).
    pub fn truth_params(&self, x: f64) -> Option<Vector5<f64>> {
        let (s0, c0) = self.phi0.sin_cos();
        let s = self.local_sine_at(x);
        if !(s.abs() < 1.0) || c0 <= 0.0 {
            return None;
        }
        let c = (1.0 - s * s).sqrt();
        let dx = x - self.x0;

        // Chord over the arc, exact and finite for a straight track
        let y = self.y0 + dx * (s0 + s) / (c0 + c);
        let transverse_path = if self.curvature == 0.0 {
            dx / c0
        } else {
            (s.asin() - s0.asin()) / self.curvature
        };
        let z = self.z0 + self.tan_dip * transverse_path;

        Some(Vector5::new(y, z, self.eta(), self.tan_dip, self.curvature))
    }

    /// The noiseless space point at `x`, reporting the variances of this simulator.
    pub fn truth_at(&self, x: f64) -> Option<SpacePoint> {
        let params = self.truth_params(x)?;
        Some(SpacePoint::with_resolution(
            x,
            params[0],
            params[1],
            self.sigma_y,
            self.sigma_z,
        ))
    }

    /// Generates the measured space points at each of the reference coordinates the helix reaches, in order.
    pub fn generate<R: Rng>(&self, xs: &[f64], rng: &mut R) -> Vec<SpacePoint> {
        let points: Vec<SpacePoint> = xs
            .iter()
            .filter_map(|&x| self.truth_at(x))
            .map(|mut point| {
                point.y += self.sigma_y * rng.sample::<f64, _>(StandardNormal);
                point.z += self.sigma_z * rng.sample::<f64, _>(StandardNormal);
                point
            })
            .collect();
        if points.len() < xs.len() {
            debug!(
                "helix reaches {} of the {} requested coordinates",
                points.len(),
                xs.len()
            );
        }
        points
    }
}

/// Evenly spaced reference coordinates from `start` by `step`, e.g. the pad rows of a TPC.
pub fn layers(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}
