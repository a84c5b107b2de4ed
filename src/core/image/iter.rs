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

//! Stride-advancing pixel cursors
//!
//! A cursor holds the sample offset of the current pixel plus the stride
//! constants of the view it was created from. Advancing is plain offset
//! arithmetic with no bounds checking; the caller (the transform driver or
//! an interpolator) is responsible for keeping the cursor inside the
//! view's region of interest.
//!
//! # Performance
//!
//! The write cursor goes through a raw pointer so that rows of one
//! destination image can be filled from parallel tasks. Reads and writes
//! carry a debug-build bounds assertion; release builds rely on the
//! driver invariant.

use crate::core::mem::{Channel, ChannelValue, PixelLayout, StorageInfo};

/// Read cursor over a raster view
///
/// Created by [`ImageViewR::iter_at`](crate::core::image::ImageViewR::iter_at).
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::mem::{Channel, Rgb8Inter};
///
/// let mut buffer = ImageBuffer::<Rgb8Inter>::new(4, 4).unwrap();
/// buffer.view_w().write_px_val(Channel::Red, 1, 0, 42);
///
/// let view = buffer.view_r();
/// let mut iter = view.iter_at(0, 0);
/// iter.inc_x();
/// assert_eq!(iter.get_px_val(Channel::Red), 42);
/// ```
#[derive(Debug, Clone)]
pub struct ImageIterR<'a, L: PixelLayout> {
    data: &'a [L::Sample],
    offs: isize,
    step: isize,
    line_step: isize,
    r_offs: isize,
    g_offs: isize,
    b_offs: isize,
    a_offs: isize,
}

impl<'a, L: PixelLayout> ImageIterR<'a, L> {
    pub(crate) fn new(data: &'a [L::Sample], info: &StorageInfo<L>, x: usize, y: usize) -> Self {
        ImageIterR {
            data,
            offs: (y * info.line_step + x * info.step) as isize,
            step: info.step as isize,
            line_step: info.line_step as isize,
            r_offs: info.r_offs as isize,
            g_offs: info.g_offs as isize,
            b_offs: info.b_offs as isize,
            a_offs: info.a_offs as isize,
        }
    }

    /// Advance one pixel to the right
    #[inline]
    pub fn inc_x(&mut self) {
        self.offs += self.step;
    }

    /// Advance `k` pixels to the right
    #[inline]
    pub fn inc_x_by(&mut self, k: usize) {
        self.offs += self.step * k as isize;
    }

    /// Retreat one pixel to the left
    #[inline]
    pub fn dec_x(&mut self) {
        self.offs -= self.step;
    }

    /// Advance one line down
    #[inline]
    pub fn inc_y(&mut self) {
        self.offs += self.line_step;
    }

    /// Retreat one line up
    #[inline]
    pub fn dec_y(&mut self) {
        self.offs -= self.line_step;
    }

    /// Move the cursor to an absolute pixel position
    #[inline]
    pub fn set_px_offs(&mut self, x: usize, y: usize) {
        self.offs = y as isize * self.line_step + x as isize * self.step;
    }

    /// Read the sample of the given channel at the current position
    #[inline]
    pub fn get_px_val(&self, chan: Channel) -> L::Sample {
        let chan_offs = match chan {
            Channel::Red => self.r_offs,
            Channel::Green => self.g_offs,
            Channel::Blue => self.b_offs,
            Channel::Alpha => self.a_offs,
        };
        self.data[(self.offs + chan_offs) as usize]
    }
}

/// Write cursor over a raster view
///
/// Created by [`ImageViewW::iter_at`](crate::core::image::ImageViewW::iter_at)
/// or, inside the transform driver, from the shared raw view of a row
/// task.
pub struct ImageIterW<L: PixelLayout> {
    base: *mut L::Sample,
    len: usize,
    offs: isize,
    step: isize,
    line_step: isize,
    r_offs: isize,
    g_offs: isize,
    b_offs: isize,
    a_offs: isize,
}

// SAFETY: a write cursor is confined to one row task; distinct rows of a
// view address disjoint samples, so moving a cursor to another thread is
// sound as long as the driver upholds the row partition.
unsafe impl<L: PixelLayout> Send for ImageIterW<L> {}

impl<L: PixelLayout> ImageIterW<L> {
    pub(crate) fn new(
        base: *mut L::Sample,
        len: usize,
        info: &StorageInfo<L>,
        x: usize,
        y: usize,
    ) -> Self {
        ImageIterW {
            base,
            len,
            offs: (y * info.line_step + x * info.step) as isize,
            step: info.step as isize,
            line_step: info.line_step as isize,
            r_offs: info.r_offs as isize,
            g_offs: info.g_offs as isize,
            b_offs: info.b_offs as isize,
            a_offs: info.a_offs as isize,
        }
    }

    /// Advance one pixel to the right
    #[inline]
    pub fn inc_x(&mut self) {
        self.offs += self.step;
    }

    /// Advance `k` pixels to the right
    #[inline]
    pub fn inc_x_by(&mut self, k: usize) {
        self.offs += self.step * k as isize;
    }

    /// Retreat one pixel to the left
    #[inline]
    pub fn dec_x(&mut self) {
        self.offs -= self.step;
    }

    /// Advance one line down
    #[inline]
    pub fn inc_y(&mut self) {
        self.offs += self.line_step;
    }

    /// Retreat one line up
    #[inline]
    pub fn dec_y(&mut self) {
        self.offs -= self.line_step;
    }

    /// Move the cursor to an absolute pixel position
    #[inline]
    pub fn set_px_offs(&mut self, x: usize, y: usize) {
        self.offs = y as isize * self.line_step + x as isize * self.step;
    }

    /// Write a sample of the given channel at the current position
    ///
    /// The cursor must be inside the view; this is the driver's
    /// responsibility, not checked here in release builds.
    #[inline]
    pub fn write_px_val(&mut self, chan: Channel, val: L::Sample) {
        let chan_offs = match chan {
            Channel::Red => self.r_offs,
            Channel::Green => self.g_offs,
            Channel::Blue => self.b_offs,
            Channel::Alpha => self.a_offs,
        };
        let index = self.offs + chan_offs;
        debug_assert!(
            index >= 0 && (index as usize) < self.len,
            "write cursor left the view (index {index}, len {})",
            self.len
        );
        // SAFETY: the driver keeps cursors inside the view's ROI, and
        // distinct row tasks address disjoint samples.
        unsafe {
            *self.base.offset(index) = val;
        }
    }

    /// Write an interpolation-domain value, quantising to the sample type
    ///
    /// Rounds half away from zero.
    #[inline]
    pub fn write_px_interp(&mut self, chan: Channel, val: f64) {
        self.write_px_val(chan, L::Sample::from_interp(val));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBuffer;
    use crate::core::mem::{Rgb8Inter, Rgb8Planar};

    #[test]
    fn test_read_cursor_strides_interleaved() {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(4, 3).unwrap();
        {
            let mut view = buffer.view_w();
            view.write_px_val(Channel::Blue, 2, 1, 7);
            view.write_px_val(Channel::Blue, 3, 2, 9);
        }

        let view = buffer.view_r();
        let mut iter = view.iter_at(0, 0);
        iter.inc_x_by(2);
        iter.inc_y();
        assert_eq!(iter.get_px_val(Channel::Blue), 7);
        iter.inc_x();
        iter.inc_y();
        assert_eq!(iter.get_px_val(Channel::Blue), 9);
        iter.dec_x();
        iter.dec_y();
        assert_eq!(iter.get_px_val(Channel::Blue), 7);
    }

    #[test]
    fn test_write_cursor_planar() {
        let mut buffer = ImageBuffer::<Rgb8Planar>::new(4, 3).unwrap();
        {
            let mut view = buffer.view_w();
            let mut iter = view.iter_at(1, 1);
            iter.write_px_val(Channel::Red, 11);
            iter.write_px_val(Channel::Green, 22);
            iter.inc_x();
            iter.write_px_val(Channel::Blue, 33);
        }

        let view = buffer.view_r();
        assert_eq!(view.px_val(Channel::Red, 1, 1), 11);
        assert_eq!(view.px_val(Channel::Green, 1, 1), 22);
        assert_eq!(view.px_val(Channel::Blue, 2, 1), 33);
    }

    #[test]
    fn test_set_px_offs_matches_fresh_cursor() {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(5, 5).unwrap();
        buffer.view_w().write_px_val(Channel::Green, 4, 4, 99);

        let view = buffer.view_r();
        let mut iter = view.iter_at(0, 0);
        iter.set_px_offs(4, 4);
        assert_eq!(iter.get_px_val(Channel::Green), 99);
    }
}
