// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Empirical Model of Response (EMOR)
//!
//! The EMOR model describes a camera's opto-electronic transfer curve as
//! a mean response plus a weighted sum of basis curves:
//!
//! ```text
//! f(E) = f0(E) + sum_j  c_j * h_j(E)
//! ```
//!
//! where `E` is normalised irradiance and `f(E)` normalised brightness.
//! The inverse model expresses irradiance as a function of brightness the
//! same way (`g0`, `hinv_j`). A coefficient vector selects the concrete
//! camera curve; evaluation is table lookup with linear interpolation
//! over the precomputed response.
//!
//! The response table is forced monotone by clamping each sample to its
//! predecessor, so lookups in both directions binary-search a sorted
//! axis. The original EMoR basis is an empirical PCA decomposition of the
//! DoRF database; this implementation generates an analytic surrogate
//! basis with the same structure (mean curve close to a 1/2.2 power law,
//! perturbation curves vanishing at both ends). Coefficient vectors
//! calibrated against the DoRF basis are not interchangeable with this
//! one.

use crate::core::error::{EngineError, Result};

/// Number of samples in a response table
pub const EMOR_SAMPLE_NUM: usize = 1024;

/// Number of basis curves (and maximum coefficient count)
pub const EMOR_COEFF_NUM: usize = 25;

/// Mean forward response: irradiance to brightness
#[inline]
fn f0(e: f64) -> f64 {
    e.powf(1.0 / 2.2)
}

/// Mean inverse response: brightness to irradiance
#[inline]
fn g0(b: f64) -> f64 {
    b.powf(2.2)
}

/// Basis curve `j` at position `t`
///
/// Smooth perturbations that vanish at 0 and 1 so that every blended
/// curve keeps the fixed endpoints `f(0) = 0`, `f(1) = 1`.
#[inline]
fn basis(j: usize, t: f64) -> f64 {
    let k = (j + 1) as f64;
    (std::f64::consts::PI * k * t).sin() / (std::f64::consts::PI * k)
}

/// A precomputed EMOR response table
///
/// Holds the sampled input axis `x` and the blended, monotonicity-clamped
/// output axis `y`. [`EmorResponse::brightness`] evaluates the tabulated
/// direction (`x` to `y`), [`EmorResponse::irradiance`] the reverse
/// lookup (`y` to `x`); for a table built with [`EmorResponse::inverse`]
/// the meaning of the two axes swaps accordingly.
///
/// # Examples
///
/// ```
/// use lensrx::core::gamma::EmorResponse;
///
/// // all-zero coefficients select the mean response
/// let response = EmorResponse::forward(&[]).unwrap();
/// let b = response.brightness(0.25);
/// assert!((response.irradiance(b) - 0.25).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct EmorResponse {
    xval: Vec<f64>,
    yval: Vec<f64>,
}

impl EmorResponse {
    /// Build a forward response table (`f0` plus basis blend)
    ///
    /// Missing coefficients are zero; the mean curve is the all-zero
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if more than
    /// [`EMOR_COEFF_NUM`] coefficients are given.
    pub fn forward(coeffs: &[f64]) -> Result<Self> {
        Self::build(coeffs, f0)
    }

    /// Build an inverse response table (`g0` plus basis blend)
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if more than
    /// [`EMOR_COEFF_NUM`] coefficients are given.
    pub fn inverse(coeffs: &[f64]) -> Result<Self> {
        Self::build(coeffs, g0)
    }

    fn build(coeffs: &[f64], mean: impl Fn(f64) -> f64) -> Result<Self> {
        if coeffs.len() > EMOR_COEFF_NUM {
            return Err(EngineError::config(format!(
                "EMOR takes at most {EMOR_COEFF_NUM} coefficients, got {}",
                coeffs.len()
            )));
        }

        let mut xval = Vec::with_capacity(EMOR_SAMPLE_NUM);
        let mut yval = Vec::with_capacity(EMOR_SAMPLE_NUM);

        let mut last_y = 0.0f64;
        for i in 0..EMOR_SAMPLE_NUM {
            let t = i as f64 / (EMOR_SAMPLE_NUM - 1) as f64;

            let mut y = mean(t);
            for (j, c) in coeffs.iter().enumerate() {
                y += c * basis(j, t);
            }

            // enforce monotonicity
            if y < last_y {
                y = last_y;
            }
            last_y = y;

            xval.push(t);
            yval.push(y);
        }

        Ok(EmorResponse { xval, yval })
    }

    /// Evaluate the tabulated direction (`x` axis to `y` axis)
    #[inline]
    pub fn brightness(&self, value: f64) -> f64 {
        lookup(value, &self.xval, &self.yval)
    }

    /// Evaluate the reverse lookup (`y` axis to `x` axis)
    #[inline]
    pub fn irradiance(&self, value: f64) -> f64 {
        lookup(value, &self.yval, &self.xval)
    }
}

/// Interpolated table lookup: search `value` in `from`, interpolate `to`
///
/// `from` is sorted ascending with `from[0] == 0`; inputs at or outside
/// [0, 1] short-circuit to the endpoints.
fn lookup(value: f64, from: &[f64], to: &[f64]) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    if value >= 1.0 {
        return 1.0;
    }

    // first index with from[index] >= value; value > 0 and from[0] == 0
    // guarantee 1 <= index < len
    let index = from
        .partition_point(|&v| v < value)
        .min(from.len() - 1)
        .max(1);

    let x1 = from[index - 1];
    let x2 = from[index];

    if x2 - x1 <= 0.0 {
        // flat clamped region
        return to[index];
    }

    (to[index - 1] * (x2 - value) + to[index] * (value - x1)) / (x2 - x1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_response_is_power_law() {
        let response = EmorResponse::forward(&[]).unwrap();
        for i in 1..20 {
            let e = i as f64 / 20.0;
            assert!((response.brightness(e) - f0(e)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_endpoints_fixed() {
        let response = EmorResponse::forward(&[0.3, -0.2, 0.1]).unwrap();
        assert_eq!(response.brightness(0.0), 0.0);
        assert_eq!(response.brightness(1.0), 1.0);
        assert_eq!(response.irradiance(0.0), 0.0);
        assert_eq!(response.irradiance(1.0), 1.0);
    }

    #[test]
    fn test_roundtrip_with_coefficients() {
        let response = EmorResponse::forward(&[0.1, -0.05, 0.02, 0.01]).unwrap();
        for i in 1..50 {
            let e = i as f64 / 50.0;
            let rt = response.irradiance(response.brightness(e));
            assert!((rt - e).abs() < 1e-2, "roundtrip {rt} vs {e}");
        }
    }

    #[test]
    fn test_monotonicity_enforced() {
        // a large negative coefficient would dent the curve; clamping
        // keeps the table sorted
        let response = EmorResponse::forward(&[-2.0]).unwrap();
        let mut last = -1.0;
        for i in 0..100 {
            let v = response.brightness(i as f64 / 99.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_coefficient_count_limit() {
        assert!(EmorResponse::forward(&[0.0; EMOR_COEFF_NUM]).is_ok());
        assert!(EmorResponse::forward(&[0.0; EMOR_COEFF_NUM + 1]).is_err());
    }

    #[test]
    fn test_inverse_table_matches_forward_mean() {
        // g0 is the functional inverse of f0, so the two mean tables
        // agree when evaluated in opposite directions
        let fwd = EmorResponse::forward(&[]).unwrap();
        let inv = EmorResponse::inverse(&[]).unwrap();
        for i in 1..20 {
            let v = i as f64 / 20.0;
            assert!((fwd.brightness(v) - inv.irradiance(v)).abs() < 1e-3);
        }
    }
}
