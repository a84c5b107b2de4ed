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

//! Parameter-coordinate reconciliation
//!
//! A lens model's coefficients are calibrated against a particular aspect
//! ratio and crop factor. When the model is applied to an image with a
//! different aspect or crop, the coefficients must be rescaled so that the
//! geometric radius at which the polynomial evaluates matches the same
//! physical point on the sensor.
//!
//! With `d = sqrt(1 + aspect^2) / crop` being the half-diagonal length of
//! a frame in the normalised system, the compensation factor is
//! `k = d_input / d_param`, and a coefficient attached to polynomial
//! degree `n` in the radius scales by `k^n`. The factor applies to stored
//! coefficients, never to input coordinates; centre shifts are sensor
//! parameters and are never rescaled.

/// Reconciliation between a parameter frame and the input image frame
///
/// Models store a `CoordFrame` and consult [`CoordFrame::coord_fact`]
/// whenever coefficients are assigned. The geometric behaviour of a model
/// is identical at points of equal physical distance from the optical
/// axis, regardless of which coordinate system the parameters were
/// calibrated in.
///
/// # Examples
///
/// ```
/// use lensrx::core::model::CoordFrame;
///
/// // parameters calibrated on the same frame they are applied to
/// let frame = CoordFrame::new(1.5, 1.5, 1.0, 1.0);
/// assert!((frame.coord_fact() - 1.0).abs() < 1e-12);
///
/// // a smaller sensor (crop 2.0) halves the normalised half-diagonal
/// let frame = CoordFrame::new(1.5, 1.5, 1.0, 2.0);
/// assert!((frame.coord_fact() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordFrame {
    param_aspect: f64,
    input_aspect: f64,
    param_crop: f64,
    input_crop: f64,
    coord_fact: f64,
}

impl CoordFrame {
    /// Describe both the parameter frame and the input image frame
    ///
    /// # Arguments
    ///
    /// * `param_aspect` - Aspect ratio used when determining the parameters
    /// * `input_aspect` - Aspect ratio of the input image
    /// * `param_crop` - Crop factor used when determining the parameters
    /// * `input_crop` - Crop factor of the input image
    pub fn new(param_aspect: f64, input_aspect: f64, param_crop: f64, input_crop: f64) -> Self {
        let mut frame = CoordFrame {
            param_aspect,
            input_aspect,
            param_crop,
            input_crop,
            coord_fact: 1.0,
        };
        frame.calc_coord_fact();
        frame
    }

    /// Describe only the input image frame
    ///
    /// Assumes the parameters were determined on an image of the same
    /// aspect ratio in landscape orientation (for portrait input the
    /// reciprocal is used), and that parameter set and image share one
    /// crop factor.
    pub fn with_input_aspect(input_aspect: f64) -> Self {
        let param_aspect = if input_aspect < 1.0 {
            1.0 / input_aspect
        } else {
            input_aspect
        };
        CoordFrame::new(param_aspect, input_aspect, 1.0, 1.0)
    }

    /// The compensation factor `k = d_input / d_param`
    #[inline]
    pub fn coord_fact(&self) -> f64 {
        self.coord_fact
    }

    /// Aspect ratio of the parameter frame
    #[inline]
    pub fn param_aspect(&self) -> f64 {
        self.param_aspect
    }

    /// Aspect ratio of the input image
    #[inline]
    pub fn input_aspect(&self) -> f64 {
        self.input_aspect
    }

    /// Crop factor of the input image
    #[inline]
    pub fn input_crop(&self) -> f64 {
        self.input_crop
    }

    fn calc_coord_fact(&mut self) {
        let d_param = (1.0 + self.param_aspect * self.param_aspect).sqrt() / self.param_crop;
        let d_input = (1.0 + self.input_aspect * self.input_aspect).sqrt() / self.input_crop;
        self.coord_fact = d_input / d_param;
    }
}
