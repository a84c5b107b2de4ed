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

//! Nearest-neighbour interpolation

use crate::core::image::ImageViewR;
use crate::core::interp::{InterpBase, Interpolator};
use crate::core::mem::{Channel, ChannelValue, PixelLayout};

/// Nearest-neighbour sample fetch
///
/// Samples at `(floor(xs + 1/2), floor(ys + 1/2))`. Exact by
/// construction: a destination grid aligned with the source grid
/// reproduces the source samples bit for bit.
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::interp::{Interpolator, NearestInterpolator};
/// use lensrx::core::mem::{Channel, Rgb8Inter};
///
/// let mut buffer = ImageBuffer::<Rgb8Inter>::new(3, 3).unwrap();
/// buffer.view_w().write_px_val(Channel::Red, 1, 1, 200);
///
/// let interp = NearestInterpolator::new(buffer.view_r());
/// // the image centre is pixel (1, 1)
/// assert_eq!(interp.sample(Channel::Red, 0.0, 0.0), 200.0);
/// ```
#[derive(Debug, Clone)]
pub struct NearestInterpolator<'a, L: PixelLayout> {
    base: InterpBase<'a, L>,
}

impl<'a, L: PixelLayout> NearestInterpolator<'a, L> {
    /// Create an interpolator over a read view
    pub fn new(view: ImageViewR<'a, L>) -> Self {
        NearestInterpolator {
            base: InterpBase::new(view),
        }
    }

    /// Create an interpolator with an explicit aspect ratio
    pub fn with_aspect(view: ImageViewR<'a, L>, aspect: f64) -> Self {
        NearestInterpolator {
            base: InterpBase::with_aspect(view, aspect),
        }
    }
}

impl<L: PixelLayout> Interpolator for NearestInterpolator<'_, L> {
    fn sample(&self, chan: Channel, x: f64, y: f64) -> f64 {
        let Some((xs, ys)) = self.base.scaled(x, y) else {
            return self.base.null_val;
        };

        let xi = ((xs + 0.5) as usize).min(self.base.view.width() - 1);
        let yi = ((ys + 0.5) as usize).min(self.base.view.height() - 1);

        self.base.view.px_val(chan, xi, yi).to_interp()
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
    use crate::core::mem::Rgb8Inter;

    fn ramp_buffer() -> ImageBuffer<Rgb8Inter> {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(4, 4).unwrap();
        {
            let mut view = buffer.view_w();
            for y in 0..4 {
                for x in 0..4 {
                    view.write_px_val(Channel::Red, x, y, (16 * x + 4 * y) as u8);
                }
            }
        }
        buffer
    }

    #[test]
    fn test_grid_positions_are_exact() {
        let buffer = ramp_buffer();
        let view = buffer.view_r();
        let interp = NearestInterpolator::new(view);

        // sample-space position (x, y) corresponds to normalised
        // ((2x/(W-1) - 1) * A, 2y/(H-1) - 1)
        for y in 0..4usize {
            for x in 0..4usize {
                let nx = 2.0 * x as f64 / 3.0 - 1.0;
                let ny = 2.0 * y as f64 / 3.0 - 1.0;
                let expected = (16 * x + 4 * y) as f64;
                assert_eq!(interp.sample(Channel::Red, nx, ny), expected);
            }
        }
    }

    #[test]
    fn test_out_of_frame_returns_null_value() {
        let buffer = ramp_buffer();
        let mut interp = NearestInterpolator::new(buffer.view_r());

        assert_eq!(interp.sample(Channel::Red, 3.0, 0.0), 0.0);
        interp.set_null_value(42.0);
        assert_eq!(interp.sample(Channel::Red, 3.0, 0.0), 42.0);
        assert_eq!(interp.sample(Channel::Red, 0.0, -5.0), 42.0);
    }

    #[test]
    fn test_rounds_to_nearest_sample() {
        let buffer = ramp_buffer();
        let interp = NearestInterpolator::new(buffer.view_r());

        // slightly right of sample 1 on the centre line still fetches
        // sample 1; past the midpoint fetches sample 2
        let near_1 = 2.0 * 1.2 / 3.0 - 1.0;
        let near_2 = 2.0 * 1.8 / 3.0 - 1.0;
        let ny = 2.0 * 2.0 / 3.0 - 1.0;
        assert_eq!(interp.sample(Channel::Red, near_1, ny), (16 + 8) as f64);
        assert_eq!(interp.sample(Channel::Red, near_2, ny), (32 + 8) as f64);
    }
}
