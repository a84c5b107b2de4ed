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

//! Bilinear interpolation

use crate::core::image::ImageViewR;
use crate::core::interp::{InterpBase, Interpolator};
use crate::core::mem::{Channel, ChannelValue, PixelLayout};

/// Bilinear reconstruction over the four neighbouring samples
///
/// Two horizontal linear interpolations followed by one vertical.
/// Positions past the right or bottom edge clamp-replicate the edge
/// samples. Evaluation at an integer sample position returns the stored
/// sample exactly.
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::interp::{BilinearInterpolator, Interpolator};
/// use lensrx::core::mem::{Channel, Rgb8Inter};
///
/// let mut buffer = ImageBuffer::<Rgb8Inter>::new(2, 1).unwrap();
/// {
///     let mut view = buffer.view_w();
///     view.write_px_val(Channel::Red, 0, 0, 10);
///     view.write_px_val(Channel::Red, 1, 0, 30);
/// }
///
/// let interp = BilinearInterpolator::new(buffer.view_r());
/// // the midpoint of two adjacent samples is their arithmetic mean
/// assert_eq!(interp.sample(Channel::Red, 0.0, 0.0), 20.0);
/// ```
#[derive(Debug, Clone)]
pub struct BilinearInterpolator<'a, L: PixelLayout> {
    base: InterpBase<'a, L>,
}

impl<'a, L: PixelLayout> BilinearInterpolator<'a, L> {
    /// Create an interpolator over a read view
    pub fn new(view: ImageViewR<'a, L>) -> Self {
        BilinearInterpolator {
            base: InterpBase::new(view),
        }
    }

    /// Create an interpolator with an explicit aspect ratio
    pub fn with_aspect(view: ImageViewR<'a, L>, aspect: f64) -> Self {
        BilinearInterpolator {
            base: InterpBase::with_aspect(view, aspect),
        }
    }
}

impl<L: PixelLayout> Interpolator for BilinearInterpolator<'_, L> {
    fn sample(&self, chan: Channel, x: f64, y: f64) -> f64 {
        let Some((xs, ys)) = self.base.scaled(x, y) else {
            return self.base.null_val;
        };

        // edges of the square we interpolate in
        let x_1 = xs.floor().min(self.base.width - 1.0);
        let y_1 = ys.floor().min(self.base.height - 1.0);
        let x_2 = x_1 + 1.0;
        let y_2 = y_1 + 1.0;

        let mut iter = self.base.view.iter_at(x_1 as usize, y_1 as usize);

        /* corner values
        val_11 == val(x1, y1) -> upper left
        val_21 == val(x2, y1) -> upper right
        val_12 == val(x1, y2) -> lower left
        val_22 == val(x2, y2) -> lower right
        */
        let val_11 = iter.get_px_val(chan).to_interp();
        let val_21;
        let val_12;
        let val_22;

        if x_2 >= self.base.width {
            // right image edge
            val_21 = val_11;
        } else {
            iter.inc_x();
            val_21 = iter.get_px_val(chan).to_interp();
            iter.dec_x();
        }

        if y_2 >= self.base.height {
            // lower edge
            val_12 = val_11;
            val_22 = val_21;
        } else {
            iter.inc_y();
            val_12 = iter.get_px_val(chan).to_interp();

            if x_2 < self.base.width {
                iter.inc_x();
                val_22 = iter.get_px_val(chan).to_interp();
            } else {
                val_22 = val_12;
            }
        }

        // interpolate in x direction
        let tmp_val_1 = (x_2 - xs) * val_11 + (xs - x_1) * val_21;
        let tmp_val_2 = (x_2 - xs) * val_12 + (xs - x_1) * val_22;

        // interpolate in y direction
        (y_2 - ys) * tmp_val_1 + (ys - y_1) * tmp_val_2
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
