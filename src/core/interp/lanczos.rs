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

//! Windowed-sinc (Lanczos) interpolation

use crate::core::error::{EngineError, Result};
use crate::core::image::ImageViewR;
use crate::core::interp::{InterpBase, Interpolator};
use crate::core::mem::{Channel, ChannelValue, PixelLayout};

/// Default kernel support (taps per side)
pub const DEFAULT_SUPPORT: usize = 2;

/// Default kernel table resolution (samples per unit distance)
pub const DEFAULT_RESOLUTION: usize = 1024;

/// Separable Lanczos reconstruction with a tabulated kernel
///
/// The 1D kernel is `L(t) = sinc(t) * sinc(t / N)` for `|t| < N`, zero
/// elsewhere, with integer support `N >= 1`. It is tabulated once over
/// `[0, N)` at the configured resolution; evaluation linearly
/// interpolates the table, and the 2D kernel is the outer product of two
/// 1D kernels. Tap weights are normalised so flat areas stay flat, and
/// samples outside the image clamp to the edge.
///
/// Support `1` degenerates to the triangle kernel, making the smallest
/// support an exact bilinear equivalent (the sinc window at support 1
/// would reweight the two taps instead of reproducing them).
///
/// Support and resolution may be changed only before the first transform
/// call.
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::interp::{Interpolator, LanczosInterpolator};
/// use lensrx::core::mem::{Channel, Rgb8Inter};
///
/// let mut buffer = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
/// buffer.view_w().write_px_val(Channel::Red, 3, 3, 100);
///
/// let mut interp = LanczosInterpolator::new(buffer.view_r());
/// interp.set_support(3).unwrap();
/// let v = interp.sample(Channel::Red, -0.1, -0.1);
/// assert!(v.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LanczosInterpolator<'a, L: PixelLayout> {
    base: InterpBase<'a, L>,
    support: usize,
    resolution: usize,
    kernel: Vec<f64>,
}

impl<'a, L: PixelLayout> LanczosInterpolator<'a, L> {
    /// Create an interpolator with the default support and resolution
    pub fn new(view: ImageViewR<'a, L>) -> Self {
        let mut interp = LanczosInterpolator {
            base: InterpBase::new(view),
            support: DEFAULT_SUPPORT,
            resolution: DEFAULT_RESOLUTION,
            kernel: Vec::new(),
        };
        interp.precalc_kernel();
        interp
    }

    /// Create an interpolator with an explicit aspect ratio
    pub fn with_aspect(view: ImageViewR<'a, L>, aspect: f64) -> Self {
        let mut interp = LanczosInterpolator {
            base: InterpBase::with_aspect(view, aspect),
            support: DEFAULT_SUPPORT,
            resolution: DEFAULT_RESOLUTION,
            kernel: Vec::new(),
        };
        interp.precalc_kernel();
        interp
    }

    /// The kernel support (taps per side)
    pub fn support(&self) -> usize {
        self.support
    }

    /// Change the kernel support and rebuild the table
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a support of zero.
    pub fn set_support(&mut self, support: usize) -> Result<()> {
        if support == 0 {
            return Err(EngineError::config("Lanczos support must be >= 1"));
        }
        self.support = support;
        self.precalc_kernel();
        Ok(())
    }

    /// Change the kernel table resolution and rebuild the table
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a resolution below 2.
    pub fn set_resolution(&mut self, resolution: usize) -> Result<()> {
        if resolution < 2 {
            return Err(EngineError::config("Lanczos table resolution must be >= 2"));
        }
        self.resolution = resolution;
        self.precalc_kernel();
        Ok(())
    }

    /// Tabulate the 1D kernel over `[0, support)`
    fn precalc_kernel(&mut self) {
        let num_val = self.resolution * self.support;
        self.kernel.clear();
        self.kernel.reserve(num_val);

        for i in 0..num_val {
            let t = (self.support * i) as f64 / (num_val - 1) as f64;
            let val = if self.support == 1 {
                // triangle kernel: exact bilinear weights
                1.0 - t
            } else {
                sinc(t) * sinc(t / self.support as f64)
            };
            self.kernel.push(val);
        }
    }

    /// Evaluate the tabulated kernel at distance `t >= 0`
    #[inline]
    fn kernel_weight(&self, t: f64) -> f64 {
        let num_val = self.kernel.len();
        let pos = t * (num_val - 1) as f64 / self.support as f64;
        let idx = pos as usize;

        if idx + 1 >= num_val {
            return 0.0;
        }

        let frac = pos - idx as f64;
        self.kernel[idx] + (self.kernel[idx + 1] - self.kernel[idx]) * frac
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

impl<L: PixelLayout> Interpolator for LanczosInterpolator<'_, L> {
    fn sample(&self, chan: Channel, x: f64, y: f64) -> f64 {
        let Some((xs, ys)) = self.base.scaled(x, y) else {
            return self.base.null_val;
        };

        let support = self.support as isize;
        let x_base = xs.floor() as isize;
        let y_base = ys.floor() as isize;

        let last_x = self.base.view.width() as isize - 1;
        let last_y = self.base.view.height() as isize - 1;

        let mut acc = 0.0;
        let mut weight_sum = 0.0;

        for tap_y in (y_base - support + 1)..=(y_base + support) {
            let wy = self.kernel_weight((ys - tap_y as f64).abs());
            if wy == 0.0 {
                continue;
            }

            // clamp to edge
            let sy = tap_y.clamp(0, last_y) as usize;

            for tap_x in (x_base - support + 1)..=(x_base + support) {
                let wx = self.kernel_weight((xs - tap_x as f64).abs());
                if wx == 0.0 {
                    continue;
                }

                let sx = tap_x.clamp(0, last_x) as usize;
                let w = wx * wy;
                acc += w * self.base.view.px_val(chan, sx, sy).to_interp();
                weight_sum += w;
            }
        }

        if weight_sum == 0.0 {
            return self.base.null_val;
        }

        acc / weight_sum
    }

    fn aspect_ratio(&self) -> f64 {
        self.base.aspect
    }

    fn sample_range(&self) -> (f64, f64) {
        (L::Sample::MIN.to_interp(), L::Sample::MAX.to_interp())
    }

    fn set_null_value(&mut self, value: f64) {
        self.base.null_val = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBuffer;
    use crate::core::interp::BilinearInterpolator;
    use crate::core::mem::Rgb16Inter;

    fn noise_buffer() -> ImageBuffer<Rgb16Inter> {
        let mut buffer = ImageBuffer::<Rgb16Inter>::new(9, 7).unwrap();
        {
            let mut view = buffer.view_w();
            // deterministic pseudo-random fill
            let mut state = 0x1234u32;
            for y in 0..7 {
                for x in 0..9 {
                    state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                    view.write_px_val(Channel::Red, x, y, (state >> 16) as u16);
                }
            }
        }
        buffer
    }

    #[test]
    fn test_kernel_is_one_at_zero_and_zero_at_support() {
        let buffer = noise_buffer();
        let interp = LanczosInterpolator::new(buffer.view_r());
        assert!((interp.kernel_weight(0.0) - 1.0).abs() < 1e-12);
        assert!(interp.kernel_weight(2.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_field_stays_flat() {
        let mut buffer = ImageBuffer::<Rgb16Inter>::new(8, 8).unwrap();
        {
            let mut view = buffer.view_w();
            for y in 0..8 {
                for x in 0..8 {
                    view.write_px_val(Channel::Red, x, y, 20000);
                }
            }
        }

        let interp = LanczosInterpolator::new(buffer.view_r());
        for &(x, y) in &[(0.0, 0.0), (0.33, -0.21), (-0.9, 0.7)] {
            let v = interp.sample(Channel::Red, x, y);
            assert!((v - 20000.0).abs() < 1e-6, "got {v}");
        }
    }

    #[test]
    fn test_support_one_matches_bilinear() {
        let buffer = noise_buffer();
        let bilinear = BilinearInterpolator::new(buffer.view_r());
        let mut lanczos = LanczosInterpolator::new(buffer.view_r());
        lanczos.set_support(1).unwrap();

        for i in 0..40 {
            for j in 0..30 {
                let x = -1.2 + 2.4 * i as f64 / 39.0;
                let y = -0.95 + 1.9 * j as f64 / 29.0;
                let a = bilinear.sample(Channel::Red, x, y);
                let b = lanczos.sample(Channel::Red, x, y);
                assert!((a - b).abs() <= 1.0, "mismatch at ({x}, {y}): {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_integer_positions_near_exact() {
        let buffer = noise_buffer();
        let view = buffer.view_r();
        let interp = LanczosInterpolator::new(view);

        let aspect = 9.0 / 7.0;
        for y in 2..5usize {
            for x in 2..7usize {
                let nx = (2.0 * x as f64 / 8.0 - 1.0) * aspect;
                let ny = 2.0 * y as f64 / 6.0 - 1.0;
                let expected = view.px_val(Channel::Red, x, y) as f64;
                let got = interp.sample(Channel::Red, nx, ny);
                // the tabulated kernel is interpolated, so allow a small
                // deviation
                assert!((got - expected).abs() < 2.0, "({x},{y}): {got} vs {expected}");
            }
        }
    }

    #[test]
    fn test_rejects_zero_support() {
        let buffer = noise_buffer();
        let mut interp = LanczosInterpolator::new(buffer.view_r());
        assert!(interp.set_support(0).is_err());
        assert!(interp.set_resolution(1).is_err());
    }
}
