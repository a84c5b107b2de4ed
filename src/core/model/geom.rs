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

//! Geometric correction models
//!
//! A geometric model rewrites a per-channel source coordinate tuple in
//! place. Each model supports per-channel parameters, so a single
//! instance can encode lateral chromatic aberration; the all-channel
//! setters keep the default of equal parameters on every lane.
//!
//! Transformations are defined in the backward direction (destination to
//! source): a scaler parameter `k > 1` therefore enlarges the image.

use crate::core::error::{EngineError, Result};
use crate::core::mem::{CoordTuple, MAX_CHANNELS};
use crate::core::model::{CoordFrame, Projection};

/// Tagged variant over the geometric correction models
///
/// Queues own models by value; cloning is a structural copy of the
/// variant payload.
#[derive(Debug, Clone)]
pub enum GeomModel {
    /// Third-order polynomial radial distortion (PTLens)
    PtLens(PtLensModel),
    /// Per-channel linear rescaling
    Scaler(ScalerModel),
    /// Lens projection conversion
    GeometryConvert(GeometryConvertModel),
}

impl GeomModel {
    /// Rewrite the coordinate tuple with this model's backward mapping
    #[inline]
    pub fn src_coords<const N: usize>(&self, coords: &mut CoordTuple<N>) {
        match self {
            GeomModel::PtLens(m) => m.src_coords(coords),
            GeomModel::Scaler(m) => m.src_coords(coords),
            GeomModel::GeometryConvert(m) => m.src_coords(coords),
        }
    }
}

/// The PTLens polynomial distortion model
///
/// For a pole-shifted radius `r` the model evaluates
///
/// ```text
/// r_src = ((a * r + b) * r + c) * r + d) * r
/// ```
///
/// and maps the coordinate back along its original azimuth. The same
/// polynomial doubles as a TCA correction when the red and blue lanes are
/// given their own coefficient sets.
///
/// Coefficients are rescaled on assignment according to the model's
/// [`CoordFrame`] (degree 3 for `a`, 2 for `b`, 1 for `c`; `d` is
/// dimensionless). The centre shift `(x0, y0)` is a sensor parameter and
/// is never rescaled.
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::CoordTuple;
/// use lensrx::core::model::PtLensModel;
///
/// // (0, 0, 0, 1) is the identity for every channel
/// let mut model = PtLensModel::with_input_aspect(1.5);
/// model.set_params(0.0, 0.0, 0.0, 1.0);
///
/// let mut coords = CoordTuple::<3>::splat(0.8, -0.4);
/// model.src_coords(&mut coords);
/// assert!((coords.x[0] - 0.8).abs() < 1e-12);
/// assert!((coords.y[0] + 0.4).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct PtLensModel {
    frame: CoordFrame,
    a: [f64; MAX_CHANNELS],
    b: [f64; MAX_CHANNELS],
    c: [f64; MAX_CHANNELS],
    d: [f64; MAX_CHANNELS],
    x0: [f64; MAX_CHANNELS],
    y0: [f64; MAX_CHANNELS],
}

impl PtLensModel {
    /// Create a model with all coefficients zero
    ///
    /// Call one of the parameter setters before use; the all-zero model
    /// collapses every coordinate onto the centre shift.
    pub fn new(frame: CoordFrame) -> Self {
        PtLensModel {
            frame,
            a: [0.0; MAX_CHANNELS],
            b: [0.0; MAX_CHANNELS],
            c: [0.0; MAX_CHANNELS],
            d: [0.0; MAX_CHANNELS],
            x0: [0.0; MAX_CHANNELS],
            y0: [0.0; MAX_CHANNELS],
        }
    }

    /// Create a model for an input image, assuming landscape parameters
    /// and a shared crop factor
    pub fn with_input_aspect(input_aspect: f64) -> Self {
        PtLensModel::new(CoordFrame::with_input_aspect(input_aspect))
    }

    /// Set the model parameters on all channels
    pub fn set_params(&mut self, a: f64, b: f64, c: f64, d: f64) {
        for lane in 0..MAX_CHANNELS {
            self.set_params_single(lane, a, b, c, d);
        }
    }

    /// Set the model parameters on all channels, deriving `d`
    ///
    /// `d` is calculated so that `a + b + c + d = 1`, which preserves the
    /// radius at the frame corner. This trades distortion in the image
    /// centre against lower overall distortion, matching what Hugin and
    /// PTLens do.
    pub fn set_params_auto_d(&mut self, a: f64, b: f64, c: f64) {
        self.set_params(a, b, c, 1.0 - (a + b + c));
    }

    /// Set the model parameters on a single channel lane
    ///
    /// Mainly useful for TCA corrections: set the red and blue lanes to
    /// the per-channel shift polynomials and leave green at identity.
    pub fn set_params_single(&mut self, lane: usize, a: f64, b: f64, c: f64, d: f64) {
        let k = self.frame.coord_fact();
        self.a[lane] = a * k.powi(3);
        self.b[lane] = b * k.powi(2);
        self.c[lane] = c * k;
        self.d[lane] = d;
    }

    /// Set the model parameters on a single channel lane, deriving `d`
    pub fn set_params_single_auto_d(&mut self, lane: usize, a: f64, b: f64, c: f64) {
        self.set_params_single(lane, a, b, c, 1.0 - (a + b + c));
    }

    /// Get the model parameters of a channel lane, in parameter-frame units
    pub fn params(&self, lane: usize) -> (f64, f64, f64, f64) {
        let k = self.frame.coord_fact();
        (
            self.a[lane] / k.powi(3),
            self.b[lane] / k.powi(2),
            self.c[lane] / k,
            self.d[lane],
        )
    }

    /// Set the centre shift on all channels
    pub fn set_centre_shift(&mut self, x0: f64, y0: f64) {
        self.x0 = [x0; MAX_CHANNELS];
        self.y0 = [y0; MAX_CHANNELS];
    }

    /// Set the centre shift on a single channel lane
    pub fn set_centre_shift_single(&mut self, lane: usize, x0: f64, y0: f64) {
        self.x0[lane] = x0;
        self.y0[lane] = y0;
    }

    /// Get the centre shift of a channel lane
    pub fn centre_shift(&self, lane: usize) -> (f64, f64) {
        (self.x0[lane], self.y0[lane])
    }

    /// Rewrite the coordinate tuple with the polynomial mapping
    pub fn src_coords<const N: usize>(&self, coords: &mut CoordTuple<N>) {
        for lane in 0..N {
            let x = coords.x[lane] - self.x0[lane];
            let y = coords.y[lane] - self.y0[lane];
            let r = (x * x + y * y).sqrt();

            if r == 0.0 {
                // the pole maps onto itself
                coords.x[lane] = self.x0[lane];
                coords.y[lane] = self.y0[lane];
                continue;
            }

            let cos_phi = x / r;
            let sin_phi = y / r;
            let r_src =
                (((self.a[lane] * r + self.b[lane]) * r + self.c[lane]) * r + self.d[lane]) * r;

            coords.x[lane] = cos_phi * r_src + self.x0[lane];
            coords.y[lane] = sin_phi * r_src + self.y0[lane];
        }
    }
}

/// A per-channel linear rescaling model
///
/// Implements `(x, y) -> ((x - x0) / k + x0, (y - y0) / k + y0)` with an
/// independent `k` per channel. Doubles as a simple linear TCA
/// correction by giving the red and blue lanes their own factors.
///
/// The factor is a pure ratio between the two normalised frames and is
/// not subject to parameter-coordinate rescaling.
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::CoordTuple;
/// use lensrx::core::model::ScalerModel;
///
/// let mut model = ScalerModel::new();
/// model.set_param(2.0).unwrap();
///
/// let mut coords = CoordTuple::<3>::splat(1.0, -0.5);
/// model.src_coords(&mut coords);
/// assert_eq!(coords, CoordTuple::splat(0.5, -0.25));
/// ```
#[derive(Debug, Clone)]
pub struct ScalerModel {
    k: [f64; MAX_CHANNELS],
    x0: [f64; MAX_CHANNELS],
    y0: [f64; MAX_CHANNELS],
}

impl Default for ScalerModel {
    fn default() -> Self {
        ScalerModel::new()
    }
}

impl ScalerModel {
    /// Create an identity scaler (`k = 1` on every channel)
    pub fn new() -> Self {
        ScalerModel {
            k: [1.0; MAX_CHANNELS],
            x0: [0.0; MAX_CHANNELS],
            y0: [0.0; MAX_CHANNELS],
        }
    }

    /// Set the scaling parameter on all channels
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] unless `k` is positive and
    /// finite.
    pub fn set_param(&mut self, k: f64) -> Result<()> {
        check_scale(k)?;
        self.k = [k; MAX_CHANNELS];
        Ok(())
    }

    /// Set the scaling parameter on a single channel lane
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] unless `k` is positive and
    /// finite.
    pub fn set_param_single(&mut self, lane: usize, k: f64) -> Result<()> {
        check_scale(k)?;
        self.k[lane] = k;
        Ok(())
    }

    /// Get the scaling parameter of a channel lane
    pub fn param(&self, lane: usize) -> f64 {
        self.k[lane]
    }

    /// Set the centre shift on all channels
    pub fn set_centre_shift(&mut self, x0: f64, y0: f64) {
        self.x0 = [x0; MAX_CHANNELS];
        self.y0 = [y0; MAX_CHANNELS];
    }

    /// Set the centre shift on a single channel lane
    pub fn set_centre_shift_single(&mut self, lane: usize, x0: f64, y0: f64) {
        self.x0[lane] = x0;
        self.y0[lane] = y0;
    }

    /// Rewrite the coordinate tuple with the rescaling mapping
    pub fn src_coords<const N: usize>(&self, coords: &mut CoordTuple<N>) {
        for lane in 0..N {
            coords.x[lane] = (coords.x[lane] - self.x0[lane]) / self.k[lane] + self.x0[lane];
            coords.y[lane] = (coords.y[lane] - self.y0[lane]) / self.k[lane] + self.y0[lane];
        }
    }
}

fn check_scale(k: f64) -> Result<()> {
    if !(k > 0.0) || !k.is_finite() {
        return Err(EngineError::config(format!(
            "scaling parameter must be positive and finite, got {k}"
        )));
    }
    Ok(())
}

/// A lens geometry conversion model
///
/// The destination coordinate is converted to spherical `(phi, theta)` by
/// the destination projection's inverse, then the source projection's
/// forward map emits the source coordinate. Rays that are not
/// representable in either projection are flagged with an out-of-frame
/// sentinel (coordinate magnitude `2 * aspect`), which the interpolator
/// resolves to the configured background value.
///
/// Normalised coordinates are converted to physical millimetres against a
/// 35 mm reference frame: the compensation factor of a 3:2 / crop-1
/// parameter frame, times 12 mm (half the frame height).
#[derive(Debug, Clone)]
pub struct GeometryConvertModel {
    src: Projection,
    dst: Projection,
    x0: f64,
    y0: f64,
    input_aspect: f64,
    coord_fact: f64,
}

impl GeometryConvertModel {
    /// Create a conversion between two projections
    ///
    /// # Arguments
    ///
    /// * `input_aspect` - Aspect ratio of the input image
    /// * `input_crop` - Crop factor of the input image
    /// * `src` - Projection the photograph was taken through
    /// * `dst` - Projection the output should obey
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive aspect or
    /// crop values.
    pub fn new(input_aspect: f64, input_crop: f64, src: Projection, dst: Projection) -> Result<Self> {
        if !(input_aspect > 0.0) || !(input_crop > 0.0) {
            return Err(EngineError::config(format!(
                "aspect and crop must be positive, got aspect {input_aspect}, crop {input_crop}"
            )));
        }

        // millimetres per normalised unit: 12mm is half the height of a
        // 35mm full-frame image
        let coord_fact = CoordFrame::new(1.5, input_aspect, 1.0, input_crop).coord_fact() * 12.0;

        Ok(GeometryConvertModel {
            src,
            dst,
            x0: 0.0,
            y0: 0.0,
            input_aspect,
            coord_fact,
        })
    }

    /// Replace both focal lengths
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive values.
    pub fn set_focal_lengths(&mut self, src_focal: f64, dst_focal: f64) -> Result<()> {
        self.src.set_focal_length(src_focal)?;
        self.dst.set_focal_length(dst_focal)
    }

    /// Set the centre shift
    pub fn set_centre_shift(&mut self, x0: f64, y0: f64) {
        self.x0 = x0;
        self.y0 = y0;
    }

    /// The sentinel coordinate used for unrepresentable rays
    #[inline]
    fn sentinel(&self) -> (f64, f64) {
        (-2.0 * self.input_aspect, -2.0)
    }

    /// Rewrite the coordinate tuple with the projection conversion
    pub fn src_coords<const N: usize>(&self, coords: &mut CoordTuple<N>) {
        for lane in 0..N {
            let x = (coords.x[lane] - self.x0) * self.coord_fact;
            let y = (coords.y[lane] - self.y0) * self.coord_fact;

            let converted = self
                .dst
                .to_spherical(x, y)
                .and_then(|(phi, theta)| self.src.to_cartesian(phi, theta));

            match converted {
                Some((sx, sy)) => {
                    coords.x[lane] = sx / self.coord_fact + self.x0;
                    coords.y[lane] = sy / self.coord_fact + self.y0;
                }
                None => {
                    let (sx, sy) = self.sentinel();
                    coords.x[lane] = sx;
                    coords.y[lane] = sy;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::LensGeometry;

    #[test]
    fn test_ptlens_identity_coefficients() {
        let mut model = PtLensModel::with_input_aspect(1.5);
        model.set_params(0.0, 0.0, 0.0, 1.0);

        let mut coords = CoordTuple::<4>::splat(0.3, 0.7);
        model.src_coords(&mut coords);
        for lane in 0..4 {
            assert!((coords.x[lane] - 0.3).abs() < 1e-12);
            assert!((coords.y[lane] - 0.7).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ptlens_auto_d_preserves_unit_radius() {
        let mut model = PtLensModel::with_input_aspect(1.5);
        model.set_params_auto_d(0.02, -0.05, 0.01);

        // the a+b+c+d=1 constraint maps the unit parameter radius onto
        // itself, preserving the vertical viewing angle
        let mut coords = CoordTuple::<3>::splat(0.0, 1.0);
        model.src_coords(&mut coords);
        let r_out = (coords.x[0] * coords.x[0] + coords.y[0] * coords.y[0]).sqrt();
        assert!((r_out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ptlens_reconciliation_matches_native_calibration() {
        // the same physical lens described in two coordinate systems must
        // bend the corner ray to the same place
        let (a, b, c) = (0.05, -0.12, 0.03);

        let mut native = PtLensModel::new(CoordFrame::new(1.5, 1.5, 1.0, 1.0));
        native.set_params_auto_d(a, b, c);

        let mut cropped = PtLensModel::new(CoordFrame::new(1.5, 1.5, 1.0, 2.0));
        cropped.set_params_auto_d(a, b, c);

        // the crop-2 sensor is half as tall, so the same physical point
        // sits at twice the normalised radius
        let mut full = CoordTuple::<3>::splat(0.45, 0.6);
        native.src_coords(&mut full);

        let mut crop = CoordTuple::<3>::splat(0.9, 1.2);
        cropped.src_coords(&mut crop);

        // compare in physical units: one crop-2 unit is half a crop-1 unit
        assert!((crop.x[0] - 2.0 * full.x[0]).abs() < 1e-9);
        assert!((crop.y[0] - 2.0 * full.y[0]).abs() < 1e-9);
    }

    #[test]
    fn test_ptlens_per_channel_tca() {
        let mut model = PtLensModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, 0.0, 1.0);
        model.set_params_single(0, 0.0, 0.0, 0.0, 1.01);
        model.set_params_single(2, 0.0, 0.0, 0.0, 0.99);

        let mut coords = CoordTuple::<3>::splat(0.5, 0.0);
        model.src_coords(&mut coords);
        assert!((coords.x[0] - 0.505).abs() < 1e-12);
        assert_eq!(coords.x[1], 0.5);
        assert!((coords.x[2] - 0.495).abs() < 1e-12);
    }

    #[test]
    fn test_scaler_centre_shift_cancels_at_unit_scale() {
        let mut model = ScalerModel::new();
        model.set_param(1.0).unwrap();
        model.set_centre_shift(0.25, 0.0);

        let mut coords = CoordTuple::<3>::splat(0.7, -0.3);
        model.src_coords(&mut coords);
        assert_eq!(coords, CoordTuple::splat(0.7, -0.3));
    }

    #[test]
    fn test_scaler_rejects_bad_params() {
        let mut model = ScalerModel::new();
        assert!(model.set_param(0.0).is_err());
        assert!(model.set_param(-1.0).is_err());
        assert!(model.set_param(f64::NAN).is_err());
        assert!(model.set_param_single(1, f64::INFINITY).is_err());
    }

    #[test]
    fn test_geometry_convert_identity_projections() {
        let proj = Projection::new(LensGeometry::FisheyeEquidist, 8.0).unwrap();
        let model = GeometryConvertModel::new(1.5, 1.0, proj, proj).unwrap();

        let mut coords = CoordTuple::<3>::splat(0.4, -0.9);
        model.src_coords(&mut coords);
        assert!((coords.x[0] - 0.4).abs() < 1e-9);
        assert!((coords.y[0] + 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_convert_out_of_frame_sentinel() {
        // converting a wide fisheye frame into a rectilinear projection
        // pushes rays beyond 90 degrees out of frame
        let fish = Projection::new(LensGeometry::FisheyeEquidist, 2.0).unwrap();
        let rect = Projection::new(LensGeometry::Rectilinear, 2.0).unwrap();
        let model = GeometryConvertModel::new(1.5, 1.0, rect, fish).unwrap();

        let mut coords = CoordTuple::<3>::splat(1.4, 0.9);
        model.src_coords(&mut coords);
        assert_eq!(coords.x[0], -3.0);
        assert_eq!(coords.y[0], -2.0);
    }
}
