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

use crate::linalg::{Matrix5, Vector5};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Symmetric 5x5 covariance of the track parameters, stored as its 15 independent entries.
///
/// The lower triangle is packed row by row: C00, C10, C11, C20, C21, C22, C30, ..., C44.
/// Indexing with `(i, j)` or `(j, i)` yields the same entry.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Covariance {
    entries: [f64; 15],
}

#[inline]
const fn packed(i: usize, j: usize) -> usize {
    let (row, col) = if i >= j { (i, j) } else { (j, i) };
    row * (row + 1) / 2 + col
}

impl Covariance {
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Builds a covariance from the packed lower triangle, row by row.
    pub fn from_packed(entries: [f64; 15]) -> Self {
        Self { entries }
    }

    pub fn from_diagonal(diag: &Vector5<f64>) -> Self {
        let mut me = Self::zeros();
        for i in 0..5 {
            me[(i, i)] = diag[i];
        }
        me
    }

    /// Builds a covariance from the lower triangle of a full matrix. The upper triangle is ignored.
    pub fn from_matrix(mat: &Matrix5<f64>) -> Self {
        let mut me = Self::zeros();
        for i in 0..5 {
            for j in 0..=i {
                me[(i, j)] = mat[(i, j)];
            }
        }
        me
    }

    /// Expands this covariance into a full symmetric matrix.
    pub fn to_matrix(&self) -> Matrix5<f64> {
        Matrix5::from_fn(|i, j| self[(i, j)])
    }

    pub fn diagonal(&self) -> Vector5<f64> {
        Vector5::from_fn(|i, _| self[(i, i)])
    }

    /// The packed lower triangle, row by row.
    pub fn packed(&self) -> &[f64; 15] {
        &self.entries
    }

    /// Returns the index and value of the first diagonal entry which is not finite and strictly positive, if any.
    pub fn first_non_positive_variance(&self) -> Option<(usize, f64)> {
        (0..5)
            .map(|i| (i, self[(i, i)]))
            .find(|(_, var)| !(var.is_finite() && *var > 0.0))
    }
}

impl Index<(usize, usize)> for Covariance {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.entries[packed(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Covariance {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Self::Output {
        &mut self.entries[packed(i, j)]
    }
}

impl fmt::Display for Covariance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in 0..5 {
            let row = (0..=i)
                .map(|j| format!("{:+.6e}", self[(i, j)]))
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}
