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

//! Colour correction models
//!
//! A colour model consumes the per-channel source coordinate tuple
//! produced by the geometric queue and emits a per-channel multiplicative
//! gain tuple. The canonical model is vignetting compensation.

use crate::core::mem::{ColourTuple, CoordTuple};
use crate::core::model::CoordFrame;

/// Tagged variant over the colour correction models
#[derive(Debug, Clone)]
pub enum ColourModel {
    /// Sixth-order even polynomial vignetting compensation
    Vignetting(VignettingModel),
    /// Vignetting compensation with Hugin's parameter convention
    HuginVignetting(HuginVignettingModel),
}

impl ColourModel {
    /// Evaluate the per-channel gains at the given source coordinates
    #[inline]
    pub fn correction_factors<const N: usize>(
        &self,
        coords: &CoordTuple<N>,
        factors: &mut ColourTuple<N>,
    ) {
        match self {
            ColourModel::Vignetting(m) => m.correction_factors(coords, factors),
            ColourModel::HuginVignetting(m) => m.correction_factors(coords, factors),
        }
    }
}

/// Vignetting compensation model
///
/// With `r2` the squared pole-shifted radius, the gain is
///
/// ```text
/// g = 1 / (((a * r2 + b) * r2 + c) * r2 + 1)
/// ```
///
/// which inverts the sixth-order even falloff polynomial
/// `1 + c r^2 + b r^4 + a r^6`. The gain at the pole is exactly 1.
///
/// Coefficients are rescaled on assignment according to the model's
/// [`CoordFrame`] (degrees 6, 4 and 2). An alpha lane, when present,
/// always receives unit gain.
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::{ColourTuple, CoordTuple};
/// use lensrx::core::model::VignettingModel;
///
/// let mut model = VignettingModel::with_input_aspect(1.5);
/// model.set_params(0.0, 0.0, -0.3);
///
/// let mut gains = ColourTuple::<3>::splat(1.0);
/// model.correction_factors(&CoordTuple::splat(0.0, 1.0), &mut gains);
/// // falloff 1 - 0.3 at unit radius, compensated by 1 / 0.7
/// assert!((gains.v[1] - 1.0 / 0.7).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct VignettingModel {
    frame: CoordFrame,
    a: f64,
    b: f64,
    c: f64,
    x0: f64,
    y0: f64,
}

impl VignettingModel {
    /// Create a model with all coefficients zero (unit gain everywhere)
    pub fn new(frame: CoordFrame) -> Self {
        VignettingModel {
            frame,
            a: 0.0,
            b: 0.0,
            c: 0.0,
            x0: 0.0,
            y0: 0.0,
        }
    }

    /// Create a model for an input image, assuming landscape parameters
    /// and a shared crop factor
    pub fn with_input_aspect(input_aspect: f64) -> Self {
        VignettingModel::new(CoordFrame::with_input_aspect(input_aspect))
    }

    /// Set the falloff polynomial coefficients
    pub fn set_params(&mut self, a: f64, b: f64, c: f64) {
        let k = self.frame.coord_fact();
        self.a = a * k.powi(6);
        self.b = b * k.powi(4);
        self.c = c * k.powi(2);
    }

    /// Get the falloff polynomial coefficients, in parameter-frame units
    pub fn params(&self) -> (f64, f64, f64) {
        let k = self.frame.coord_fact();
        (
            self.a / k.powi(6),
            self.b / k.powi(4),
            self.c / k.powi(2),
        )
    }

    /// Set the centre shift
    ///
    /// A sensor parameter; interpreted directly in normalised coordinates
    /// and never rescaled.
    pub fn set_centre_shift(&mut self, x0: f64, y0: f64) {
        self.x0 = x0;
        self.y0 = y0;
    }

    /// Get the centre shift
    pub fn centre_shift(&self) -> (f64, f64) {
        (self.x0, self.y0)
    }

    /// Evaluate the per-channel gains at the given source coordinates
    pub fn correction_factors<const N: usize>(
        &self,
        coords: &CoordTuple<N>,
        factors: &mut ColourTuple<N>,
    ) {
        for lane in 0..N {
            if N == 4 && lane == 3 {
                // alpha carries coverage, not light
                factors.v[lane] = 1.0;
                continue;
            }

            let x = coords.x[lane] - self.x0;
            let y = coords.y[lane] - self.y0;
            let r2 = x * x + y * y;
            factors.v[lane] = 1.0 / (((self.a * r2 + self.b) * r2 + self.c) * r2 + 1.0);
        }
    }

    fn param_aspect(&self) -> f64 {
        self.frame.param_aspect()
    }

    fn coord_fact(&self) -> f64 {
        self.frame.coord_fact()
    }

    fn set_raw_coeffs(&mut self, a: f64, b: f64, c: f64) {
        self.a = a;
        self.b = b;
        self.c = c;
    }

    fn raw_coeffs(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }
}

/// Vignetting compensation with Hugin's parameter convention
///
/// Hugin calibrates the falloff polynomial against a radius normalised to
/// the half-diagonal instead of the half-height. On assignment the
/// coefficients receive an additional scaling of
/// `(1 / sqrt(1 + aspect^2))^n` per polynomial order `n`, after which the
/// model is an ordinary [`VignettingModel`].
#[derive(Debug, Clone)]
pub struct HuginVignettingModel {
    inner: VignettingModel,
}

impl HuginVignettingModel {
    /// Create a model with all coefficients zero (unit gain everywhere)
    pub fn new(frame: CoordFrame) -> Self {
        HuginVignettingModel {
            inner: VignettingModel::new(frame),
        }
    }

    /// Create a model for an input image, assuming landscape parameters
    /// and a shared crop factor
    pub fn with_input_aspect(input_aspect: f64) -> Self {
        HuginVignettingModel {
            inner: VignettingModel::with_input_aspect(input_aspect),
        }
    }

    /// Set the falloff polynomial coefficients, Hugin convention
    pub fn set_params(&mut self, a: f64, b: f64, c: f64) {
        let aspect = self.inner.param_aspect();
        let hugin_fact = 1.0 / (1.0 + aspect * aspect).sqrt();
        let k = self.inner.coord_fact() * hugin_fact;
        self.inner.set_raw_coeffs(a * k.powi(6), b * k.powi(4), c * k.powi(2));
    }

    /// Get the falloff polynomial coefficients, Hugin convention
    pub fn params(&self) -> (f64, f64, f64) {
        let aspect = self.inner.param_aspect();
        let hugin_fact = 1.0 / (1.0 + aspect * aspect).sqrt();
        let k = self.inner.coord_fact() * hugin_fact;
        let (a, b, c) = self.inner.raw_coeffs();
        (a / k.powi(6), b / k.powi(4), c / k.powi(2))
    }

    /// Set the centre shift
    pub fn set_centre_shift(&mut self, x0: f64, y0: f64) {
        self.inner.set_centre_shift(x0, y0);
    }

    /// Evaluate the per-channel gains at the given source coordinates
    #[inline]
    pub fn correction_factors<const N: usize>(
        &self,
        coords: &CoordTuple<N>,
        factors: &mut ColourTuple<N>,
    ) {
        self.inner.correction_factors(coords, factors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_at_pole_is_unity() {
        let mut model = VignettingModel::with_input_aspect(1.5);
        model.set_params(0.1, -0.2, -0.3);
        model.set_centre_shift(0.1, -0.05);

        let mut gains = ColourTuple::<3>::zero();
        model.correction_factors(&CoordTuple::splat(0.1, -0.05), &mut gains);
        for lane in 0..3 {
            assert_eq!(gains.v[lane], 1.0);
        }
    }

    #[test]
    fn test_gain_inverts_falloff() {
        let mut model = VignettingModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, -0.3);

        let r2 = 0.5f64;
        let mut gains = ColourTuple::<3>::zero();
        model.correction_factors(&CoordTuple::splat(r2.sqrt(), 0.0), &mut gains);
        let falloff = 1.0 - 0.3 * r2;
        assert!((gains.v[0] - 1.0 / falloff).abs() < 1e-12);
    }

    #[test]
    fn test_alpha_lane_keeps_unit_gain() {
        let mut model = VignettingModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, -0.4);

        let mut gains = ColourTuple::<4>::zero();
        model.correction_factors(&CoordTuple::splat(0.9, 0.3), &mut gains);
        assert!(gains.v[0] > 1.0);
        assert_eq!(gains.v[3], 1.0);
    }

    #[test]
    fn test_hugin_convention_rescales_to_half_diagonal() {
        // with c as the only coefficient, the Hugin gain at the frame
        // corner equals the plain gain at the unit radius: Hugin's unit
        // radius is the half-diagonal
        let aspect = 1.5f64;
        let c = -0.25;

        let mut plain = VignettingModel::with_input_aspect(aspect);
        plain.set_params(0.0, 0.0, c);
        let mut hugin = HuginVignettingModel::with_input_aspect(aspect);
        hugin.set_params(0.0, 0.0, c);

        let mut plain_gain = ColourTuple::<3>::zero();
        plain.correction_factors(&CoordTuple::splat(0.0, 1.0), &mut plain_gain);

        let mut hugin_gain = ColourTuple::<3>::zero();
        hugin.correction_factors(&CoordTuple::splat(aspect, 1.0), &mut hugin_gain);

        assert!((plain_gain.v[0] - hugin_gain.v[0]).abs() < 1e-12);
    }

    #[test]
    fn test_params_roundtrip() {
        let mut model = VignettingModel::new(CoordFrame::new(1.5, 1.0, 1.0, 1.3));
        model.set_params(0.02, -0.15, -0.3);
        let (a, b, c) = model.params();
        assert!((a - 0.02).abs() < 1e-12);
        assert!((b + 0.15).abs() < 1e-12);
        assert!((c + 0.3).abs() < 1e-12);
    }
}
