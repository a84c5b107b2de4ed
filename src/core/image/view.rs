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

//! Non-owning raster views
//!
//! A view wraps a sample slice together with the addressing constants of
//! its layout. The read view adds an aspect-ratio accessor (overridable
//! for non-square-pixel pipelines); the write view adds a region of
//! interest and a parent-window rectangle so that it can stand in for a
//! tile of a larger virtual frame.
//!
//! Changing a view's ROI or parent window never mutates the underlying
//! samples.

use crate::core::error::{EngineError, Result};
use crate::core::image::{ImageIterR, ImageIterW};
use crate::core::mem::{Channel, ChannelValue, ColourTuple, CoordTuple, PixelLayout, StorageInfo};

/// Read-only view into a raster
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::mem::{Channel, Rgb8Inter};
///
/// let buffer = ImageBuffer::<Rgb8Inter>::new(8, 4).unwrap();
/// let view = buffer.view_r();
/// assert_eq!(view.aspect_ratio(), 2.0);
/// assert_eq!(view.px_val(Channel::Red, 0, 0), 0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ImageViewR<'a, L: PixelLayout> {
    data: &'a [L::Sample],
    info: StorageInfo<L>,
    aspect_override: Option<f64>,
}

impl<'a, L: PixelLayout> ImageViewR<'a, L> {
    /// Wrap a sample slice as a read view
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive dimensions
    /// or a slice that is too short for the layout.
    pub fn new(data: &'a [L::Sample], width: usize, height: usize) -> Result<Self> {
        let info = check_view::<L>(data.len(), width, height)?;
        Ok(ImageViewR {
            data,
            info,
            aspect_override: None,
        })
    }

    /// View width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.info.width
    }

    /// View height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.info.height
    }

    /// The addressing constants of this view
    #[inline]
    pub fn storage_info(&self) -> &StorageInfo<L> {
        &self.info
    }

    /// Aspect ratio (width / height), or the configured override
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_override
            .unwrap_or(self.info.width as f64 / self.info.height as f64)
    }

    /// Override the aspect ratio for non-square-pixel pipelines
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a non-positive ratio.
    pub fn set_aspect_ratio(&mut self, aspect: f64) -> Result<()> {
        if !(aspect > 0.0) {
            return Err(EngineError::config(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        self.aspect_override = Some(aspect);
        Ok(())
    }

    /// Exact sample fetch at integer coordinates
    #[inline]
    pub fn px_val(&self, chan: Channel, x: usize, y: usize) -> L::Sample {
        let offs = y * self.info.line_step + x * self.info.step + self.info.chan_offs(chan);
        self.data[offs]
    }

    /// Construct a read cursor at the given pixel
    pub fn iter_at(&self, x: usize, y: usize) -> ImageIterR<'a, L> {
        ImageIterR::new(self.data, &self.info, x, y)
    }
}

/// Writable view into a raster
///
/// Carries a region of interest (the pixels a transform fills) and a
/// parent window (the offset and size of the virtual frame this view is a
/// tile of). Both default to the full view.
#[derive(Debug)]
pub struct ImageViewW<'a, L: PixelLayout> {
    data: &'a mut [L::Sample],
    info: StorageInfo<L>,
    roi: (usize, usize, usize, usize),
    parent: (usize, usize, usize, usize),
}

impl<'a, L: PixelLayout> ImageViewW<'a, L> {
    /// Wrap a sample slice as a write view
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive dimensions
    /// or a slice that is too short for the layout.
    pub fn new(data: &'a mut [L::Sample], width: usize, height: usize) -> Result<Self> {
        let info = check_view::<L>(data.len(), width, height)?;
        Ok(ImageViewW {
            data,
            info,
            roi: (0, 0, width, height),
            parent: (0, 0, width, height),
        })
    }

    /// View width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.info.width
    }

    /// View height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.info.height
    }

    /// The addressing constants of this view
    #[inline]
    pub fn storage_info(&self) -> &StorageInfo<L> {
        &self.info
    }

    /// The region of interest as `(x_min, y_min, x_limit, y_limit)`
    ///
    /// Limits are exclusive.
    #[inline]
    pub fn roi(&self) -> (usize, usize, usize, usize) {
        self.roi
    }

    /// Set the region of interest
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the rectangle is empty or
    /// exceeds the view.
    pub fn set_roi(
        &mut self,
        x_min: usize,
        y_min: usize,
        x_limit: usize,
        y_limit: usize,
    ) -> Result<()> {
        if x_min >= x_limit || y_min >= y_limit {
            return Err(EngineError::config(format!(
                "empty ROI ({x_min},{y_min})..({x_limit},{y_limit})"
            )));
        }
        if x_limit > self.info.width || y_limit > self.info.height {
            return Err(EngineError::config(format!(
                "ROI ({x_min},{y_min})..({x_limit},{y_limit}) exceeds {}x{} view",
                self.info.width, self.info.height
            )));
        }
        self.roi = (x_min, y_min, x_limit, y_limit);
        Ok(())
    }

    /// The parent window as `(offs_x, offs_y, width, height)`
    #[inline]
    pub fn parent_window(&self) -> (usize, usize, usize, usize) {
        self.parent
    }

    /// Declare this view a tile of a larger virtual frame
    ///
    /// The offset is the position of this view's origin inside the parent
    /// frame; width and height are the parent frame's dimensions. The
    /// normalised coordinate system of a transform is anchored on the
    /// parent frame, not on the tile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the parent frame cannot
    /// contain this view at the given offset.
    pub fn set_parent_window(
        &mut self,
        offs_x: usize,
        offs_y: usize,
        width: usize,
        height: usize,
    ) -> Result<()> {
        if offs_x + self.info.width > width || offs_y + self.info.height > height {
            return Err(EngineError::config(format!(
                "parent window {width}x{height}+{offs_x}+{offs_y} does not contain {}x{} view",
                self.info.width, self.info.height
            )));
        }
        self.parent = (offs_x, offs_y, width, height);
        Ok(())
    }

    /// Write a sample of the given channel at integer coordinates
    #[inline]
    pub fn write_px_val(&mut self, chan: Channel, x: usize, y: usize, val: L::Sample) {
        let offs = y * self.info.line_step + x * self.info.step + self.info.chan_offs(chan);
        self.data[offs] = val;
    }

    /// Write a tuple of channel values at a tuple of per-channel coordinates
    ///
    /// Each lane is quantised with half-away-from-zero rounding and written
    /// at its own integer position. Lanes whose coordinates fall outside
    /// the view are skipped.
    pub fn write_px_vals<const N: usize>(
        &mut self,
        coords: &CoordTuple<N>,
        values: &ColourTuple<N>,
    ) {
        for lane in 0..N {
            let x = coords.x[lane];
            let y = coords.y[lane];
            if x < 0.0 || y < 0.0 {
                continue;
            }
            let (x, y) = (x as usize, y as usize);
            if x >= self.info.width || y >= self.info.height {
                continue;
            }
            self.write_px_val(Channel::of_lane(lane), x, y, L::Sample::from_interp(values.v[lane]));
        }
    }

    /// Construct a write cursor at the given pixel
    pub fn iter_at(&mut self, x: usize, y: usize) -> ImageIterW<L> {
        ImageIterW::new(self.data.as_mut_ptr(), self.data.len(), &self.info, x, y)
    }

    /// The raw shared form used by parallel row tasks
    pub(crate) fn raw(&mut self) -> RawViewW<L> {
        RawViewW {
            base: self.data.as_mut_ptr(),
            len: self.data.len(),
            info: self.info,
        }
    }
}

/// Shared raw handle to a write view for the row-parallel driver
///
/// Rows of the destination image address disjoint samples, so row tasks
/// can write through copies of this handle without synchronisation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawViewW<L: PixelLayout> {
    base: *mut L::Sample,
    len: usize,
    info: StorageInfo<L>,
}

// SAFETY: the driver hands each row index to exactly one task, and write
// cursors derived from this handle stay inside their row. No two tasks
// alias the same sample.
unsafe impl<L: PixelLayout> Send for RawViewW<L> {}
unsafe impl<L: PixelLayout> Sync for RawViewW<L> {}

impl<L: PixelLayout> RawViewW<L> {
    /// Construct a write cursor at the given pixel
    pub(crate) fn iter_at(&self, x: usize, y: usize) -> ImageIterW<L> {
        ImageIterW::new(self.base, self.len, &self.info, x, y)
    }
}

fn check_view<L: PixelLayout>(len: usize, width: usize, height: usize) -> Result<StorageInfo<L>> {
    if width == 0 || height == 0 {
        return Err(EngineError::config(format!(
            "view dimensions must be positive, got {width}x{height}"
        )));
    }
    let info = StorageInfo::<L>::new(width, height);
    if len < info.num_samples() {
        return Err(EngineError::config(format!(
            "sample slice of length {len} too short for {width}x{height} layout (need {})",
            info.num_samples()
        )));
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::ImageBuffer;
    use crate::core::mem::{Rgb16Planar, Rgb8Inter, Rgba16Inter};

    #[test]
    fn test_write_then_read_all_layouts_exact() {
        fn roundtrip<L: PixelLayout>(val: L::Sample) {
            let mut buffer = ImageBuffer::<L>::new(7, 5).unwrap();
            {
                let mut view = buffer.view_w();
                for lane in 0..L::NUM_CHANNELS {
                    view.write_px_val(Channel::of_lane(lane), 3, 2, val);
                }
            }
            let view = buffer.view_r();
            for lane in 0..L::NUM_CHANNELS {
                assert_eq!(view.px_val(Channel::of_lane(lane), 3, 2), val);
            }
        }

        roundtrip::<Rgb8Inter>(200);
        roundtrip::<Rgba16Inter>(40000);
        roundtrip::<Rgb16Planar>(12345);
    }

    #[test]
    fn test_roi_validation() {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
        let mut view = buffer.view_w();
        assert!(view.set_roi(2, 2, 6, 6).is_ok());
        assert_eq!(view.roi(), (2, 2, 6, 6));
        assert!(view.set_roi(0, 0, 9, 8).is_err());
        assert!(view.set_roi(4, 4, 4, 6).is_err());
        // a failed set leaves the ROI untouched
        assert_eq!(view.roi(), (2, 2, 6, 6));
    }

    #[test]
    fn test_parent_window_validation() {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
        let mut view = buffer.view_w();
        assert!(view.set_parent_window(4, 4, 16, 16).is_ok());
        assert_eq!(view.parent_window(), (4, 4, 16, 16));
        assert!(view.set_parent_window(12, 0, 16, 16).is_err());
    }

    #[test]
    fn test_write_px_vals_rounds_half_away_from_zero() {
        let mut buffer = ImageBuffer::<Rgb8Inter>::new(4, 4).unwrap();
        {
            let mut view = buffer.view_w();
            let coords = CoordTuple::<3>::splat(1.0, 1.0);
            let values = ColourTuple::new([10.5, 10.4, 10.6]);
            view.write_px_vals(&coords, &values);
        }
        let view = buffer.view_r();
        assert_eq!(view.px_val(Channel::Red, 1, 1), 11);
        assert_eq!(view.px_val(Channel::Green, 1, 1), 10);
        assert_eq!(view.px_val(Channel::Blue, 1, 1), 11);
    }

    #[test]
    fn test_aspect_ratio_override() {
        let buffer = ImageBuffer::<Rgb8Inter>::new(6, 4).unwrap();
        let mut view = buffer.view_r();
        assert_eq!(view.aspect_ratio(), 1.5);
        view.set_aspect_ratio(2.0).unwrap();
        assert_eq!(view.aspect_ratio(), 2.0);
        assert!(view.set_aspect_ratio(0.0).is_err());
    }
}
