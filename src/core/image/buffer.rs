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

//! Owning raster buffers

use crate::core::error::{EngineError, Result};
use crate::core::image::{ImageViewR, ImageViewW};
use crate::core::mem::{PixelLayout, StorageInfo};

/// A raster buffer owning its sample array
///
/// A buffer for layout `L` with width `W` and height `H` allocates
/// `W * H * channels(L)` samples of `L`'s sample type, initialised to
/// zero. Access goes through views obtained with [`ImageBuffer::view_r`]
/// and [`ImageBuffer::view_w`].
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::{Channel, Rgb16Inter};
/// use lensrx::core::image::ImageBuffer;
///
/// let mut buffer = ImageBuffer::<Rgb16Inter>::new(4, 4).unwrap();
/// buffer.view_w().write_px_val(Channel::Green, 2, 1, 1234);
/// assert_eq!(buffer.view_r().px_val(Channel::Green, 2, 1), 1234);
/// ```
#[derive(Debug, Clone)]
pub struct ImageBuffer<L: PixelLayout> {
    width: usize,
    height: usize,
    data: Vec<L::Sample>,
}

impl<L: PixelLayout> ImageBuffer<L> {
    /// Allocate a zero-initialised buffer
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive dimensions.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::config(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }

        let info = StorageInfo::<L>::new(width, height);
        Ok(ImageBuffer {
            width,
            height,
            data: vec![L::Sample::default(); info.num_samples()],
        })
    }

    /// Wrap an existing sample vector
    ///
    /// The vector length must match the layout exactly
    /// (`width * height * channels`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for non-positive dimensions
    /// or a length mismatch.
    pub fn from_vec(width: usize, height: usize, data: Vec<L::Sample>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::config(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }

        let expected = StorageInfo::<L>::new(width, height).num_samples();
        if data.len() != expected {
            return Err(EngineError::config(format!(
                "sample vector length {} does not match {}x{} layout (expected {})",
                data.len(),
                width,
                height,
                expected
            )));
        }

        Ok(ImageBuffer { width, height, data })
    }

    /// Buffer width in pixels
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in pixels
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The flat sample array
    #[inline]
    pub fn data(&self) -> &[L::Sample] {
        &self.data
    }

    /// The flat sample array, mutable
    #[inline]
    pub fn data_mut(&mut self) -> &mut [L::Sample] {
        &mut self.data
    }

    /// Consume the buffer, returning the sample vector
    pub fn into_vec(self) -> Vec<L::Sample> {
        self.data
    }

    /// A read view over the whole buffer
    pub fn view_r(&self) -> ImageViewR<'_, L> {
        // dimensions were validated at construction
        ImageViewR::new(&self.data, self.width, self.height)
            .expect("buffer dimensions are always a valid view")
    }

    /// A write view over the whole buffer
    pub fn view_w(&mut self) -> ImageViewW<'_, L> {
        ImageViewW::new(&mut self.data, self.width, self.height)
            .expect("buffer dimensions are always a valid view")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mem::{Rgb8Inter, Rgba32Planar};

    #[test]
    fn test_buffer_allocation_size() {
        let buffer = ImageBuffer::<Rgb8Inter>::new(10, 5).unwrap();
        assert_eq!(buffer.data().len(), 150);

        let buffer = ImageBuffer::<Rgba32Planar>::new(10, 5).unwrap();
        assert_eq!(buffer.data().len(), 200);
    }

    #[test]
    fn test_buffer_rejects_zero_dimensions() {
        assert!(ImageBuffer::<Rgb8Inter>::new(0, 5).is_err());
        assert!(ImageBuffer::<Rgb8Inter>::new(5, 0).is_err());
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(ImageBuffer::<Rgb8Inter>::from_vec(2, 2, vec![0u8; 12]).is_ok());
        assert!(ImageBuffer::<Rgb8Inter>::from_vec(2, 2, vec![0u8; 11]).is_err());
    }
}
