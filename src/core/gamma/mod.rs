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

//! Gain functions (OETF/EOTF)
//!
//! A gain function pair `(gamma, inv_gamma)` maps between the encoded
//! sample domain and linear light. During a transform every sample read
//! through the interpolator is scene-linearised with `gamma`, and the
//! accumulated linear values are re-encoded with `inv_gamma` just before
//! quantisation.
//!
//! The transform does not call these functions directly in its hot loop;
//! it evaluates the piecewise-linear [`GainLut`] tables built from them.

mod emor;

pub use emor::{EmorResponse, EMOR_COEFF_NUM, EMOR_SAMPLE_NUM};

use crate::core::error::{EngineError, Result};

/// A transfer function pair installed on a transform
///
/// `gamma` is the scene-linearising direction (encoded to linear),
/// `inv_gamma` the re-encoding direction.
///
/// # Examples
///
/// ```
/// use lensrx::core::gamma::GainFunction;
///
/// let srgb = GainFunction::srgb();
/// let linear = srgb.gamma(0.5);
/// assert!((srgb.inv_gamma(linear) - 0.5).abs() < 1e-12);
///
/// let g22 = GainFunction::generic_gamma(2.2).unwrap();
/// assert!((g22.gamma(0.5) - 0.5f64.powf(2.2)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub enum GainFunction {
    /// Generic power-law gamma: `v^g` forward, `v^(1/g)` inverse
    Gamma(f64),
    /// The sRGB piecewise companding curve
    Srgb,
    /// Empirical Model of Response (camera transfer curve)
    Emor(EmorResponse),
    /// Inverse Empirical Model of Response
    InvEmor(EmorResponse),
}

impl GainFunction {
    /// A generic power-law gamma function
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a non-positive exponent.
    pub fn generic_gamma(gamma: f64) -> Result<Self> {
        if !(gamma > 0.0) || !gamma.is_finite() {
            return Err(EngineError::config(format!(
                "gamma exponent must be positive and finite, got {gamma}"
            )));
        }
        Ok(GainFunction::Gamma(gamma))
    }

    /// The standard sRGB companding curve
    pub fn srgb() -> Self {
        GainFunction::Srgb
    }

    /// An EMOR response with the given basis coefficients
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if more coefficients are
    /// given than the basis has curves.
    pub fn emor(coeffs: &[f64]) -> Result<Self> {
        Ok(GainFunction::Emor(EmorResponse::forward(coeffs)?))
    }

    /// An inverse-EMOR response with the given basis coefficients
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if more coefficients are
    /// given than the basis has curves.
    pub fn inv_emor(coeffs: &[f64]) -> Result<Self> {
        Ok(GainFunction::InvEmor(EmorResponse::inverse(coeffs)?))
    }

    /// Scene-linearise an encoded value in [0, 1]
    pub fn gamma(&self, value: f64) -> f64 {
        match self {
            GainFunction::Gamma(g) => value.powf(*g),
            GainFunction::Srgb => {
                if value <= 0.04045 {
                    value / 12.92
                } else {
                    ((value + 0.055) / 1.055).powf(2.4)
                }
            }
            GainFunction::Emor(r) => r.irradiance(value),
            GainFunction::InvEmor(r) => r.brightness(value),
        }
    }

    /// Re-encode a linear value in [0, 1]
    pub fn inv_gamma(&self, value: f64) -> f64 {
        match self {
            GainFunction::Gamma(g) => value.powf(1.0 / *g),
            GainFunction::Srgb => {
                if value <= 0.0031309 {
                    12.92 * value
                } else {
                    1.055 * value.powf(1.0 / 2.4) - 0.055
                }
            }
            GainFunction::Emor(r) => r.brightness(value),
            GainFunction::InvEmor(r) => r.irradiance(value),
        }
    }
}

/// A piecewise-linear lookup table over [0, 1]
///
/// The table stores, for segment `i` of `n`, the slope `a[i]` and
/// intercept `b[i]`, so evaluation is `a[i] * v + b[i]` with
/// `i = floor(n * v)`.
///
/// # Examples
///
/// ```
/// use lensrx::core::gamma::GainLut;
///
/// let lut = GainLut::build(1024, |v| v * v);
/// assert!((lut.eval(0.5) - 0.25).abs() < 1e-5);
/// assert_eq!(lut.eval(0.0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct GainLut {
    a: Vec<f64>,
    b: Vec<f64>,
}

impl GainLut {
    /// Sample a function into an `n`-segment table
    pub fn build(n: usize, f: impl Fn(f64) -> f64) -> Self {
        let n = n.max(1);
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);

        for i in 0..n {
            let v1 = i as f64 / n as f64;
            let v2 = (i + 1) as f64 / n as f64;
            let f1 = f(v1);
            let f2 = f(v2);
            let slope = (f2 - f1) / (v2 - v1);
            a.push(slope);
            b.push(f1 - slope * v1);
        }

        GainLut { a, b }
    }

    /// Number of segments
    #[inline]
    pub fn segments(&self) -> usize {
        self.a.len()
    }

    /// Evaluate the table at `v`
    ///
    /// Values outside [0, 1] are clamped to the boundary segments.
    #[inline]
    pub fn eval(&self, v: f64) -> f64 {
        let n = self.a.len();
        let idx = ((v * n as f64) as usize).min(n - 1);
        self.a[idx] * v + self.b[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_gamma_roundtrip() {
        let g = GainFunction::generic_gamma(2.2).unwrap();
        for i in 0..=20 {
            let v = i as f64 / 20.0;
            assert!((g.inv_gamma(g.gamma(v)) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_generic_gamma_rejects_bad_exponent() {
        assert!(GainFunction::generic_gamma(0.0).is_err());
        assert!(GainFunction::generic_gamma(-2.2).is_err());
        assert!(GainFunction::generic_gamma(f64::NAN).is_err());
    }

    #[test]
    fn test_srgb_reference_points() {
        let srgb = GainFunction::srgb();
        // linear segment
        assert!((srgb.gamma(0.04045) - 0.04045 / 12.92).abs() < 1e-12);
        // curve endpoint
        assert!((srgb.gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((srgb.inv_gamma(1.0) - 1.0).abs() < 1e-12);
        // roundtrip across the breakpoint
        for i in 0..=100 {
            let v = i as f64 / 100.0;
            assert!((srgb.inv_gamma(srgb.gamma(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_lut_matches_function_within_tolerance() {
        let n = 1024;
        let g = GainFunction::generic_gamma(2.2).unwrap();
        let lut = GainLut::build(n, |v| g.gamma(v));

        for i in 0..=500 {
            let v = i as f64 / 500.0;
            let err = (lut.eval(v) - g.gamma(v)).abs();
            assert!(err <= 2.0 / n as f64, "error {err} at {v}");
        }
    }

    #[test]
    fn test_lut_clamps_out_of_range() {
        let lut = GainLut::build(256, |v| v);
        assert!((lut.eval(1.0) - 1.0).abs() < 1e-12);
        assert!((lut.eval(1.5) - 1.5).abs() < 1e-12); // last segment extrapolates
    }

    #[test]
    fn test_lut_roundtrip_bound() {
        // |inv(fwd(v)) - v| <= 2 / n for the table pair
        let n = 1024;
        let g = GainFunction::srgb();
        let fwd = GainLut::build(n, |v| g.gamma(v));
        let inv = GainLut::build(n, |v| g.inv_gamma(v));

        for i in 0..=1000 {
            let v = i as f64 / 1000.0;
            let rt = inv.eval(fwd.eval(v).clamp(0.0, 1.0));
            assert!((rt - v).abs() <= 2.0 / n as f64, "roundtrip {rt} vs {v}");
        }
    }
}
