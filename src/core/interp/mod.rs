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

//! Source image interpolators
//!
//! An interpolator reconstructs the source raster at fractional
//! positions. It carries a read view, the image dimensions and aspect,
//! and a null value returned for out-of-frame positions.
//!
//! # Coordinate mapping
//!
//! A normalised destination coordinate `(x, y)` maps into sample space as
//!
//! ```text
//! xs = (x + A) * (W - 1) / (2 A)
//! ys = (y + 1) * (H - 1) / 2
//! ```
//!
//! so integer pixel positions map exactly to integer sample-space
//! coordinates. Positions outside `[0, W] x [0, H]` return the null
//! value; positions inside that rectangle but past the last sample
//! clamp-replicate the edge.

mod bilinear;
mod lanczos;
mod nearest;

pub use bilinear::BilinearInterpolator;
pub use lanczos::LanczosInterpolator;
pub use nearest::NearestInterpolator;

use serde::{Deserialize, Serialize};

use crate::core::image::ImageViewR;
use crate::core::mem::{Channel, PixelLayout};

/// Selects a reconstruction kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest neighbour (exact sample fetch)
    #[serde(alias = "nn")]
    Nearest,
    /// Bilinear reconstruction
    #[serde(alias = "bilin")]
    Bilinear,
    /// Windowed-sinc (Lanczos) reconstruction
    Lanczos,
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Bilinear
    }
}

/// Uniform sampling interface over the reconstruction kernels
///
/// The transform driver is generic over this trait; during a transform
/// the interpolator is read-only and shared across row tasks.
pub trait Interpolator: Sync {
    /// Reconstruct a channel at a normalised source position
    ///
    /// Returns a raw sample-domain value (not normalised to [0, 1]), or
    /// the null value for out-of-frame positions.
    fn sample(&self, chan: Channel, x: f64, y: f64) -> f64;

    /// Aspect ratio of the underlying read view
    fn aspect_ratio(&self) -> f64;

    /// The `(min, max)` storable sample range of the read view
    ///
    /// The transform driver uses this to normalise fetched samples to
    /// [0, 1] before linear-light arithmetic.
    fn sample_range(&self) -> (f64, f64);

    /// Replace the background value used for out-of-frame positions
    fn set_null_value(&mut self, value: f64);
}

/// State shared by all interpolator implementations
#[derive(Debug, Clone, Copy)]
pub(crate) struct InterpBase<'a, L: PixelLayout> {
    pub view: ImageViewR<'a, L>,
    pub width: f64,
    pub height: f64,
    pub aspect: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub null_val: f64,
}

impl<'a, L: PixelLayout> InterpBase<'a, L> {
    pub fn new(view: ImageViewR<'a, L>) -> Self {
        Self::with_aspect(view, view.aspect_ratio())
    }

    pub fn with_aspect(view: ImageViewR<'a, L>, aspect: f64) -> Self {
        let width = view.width() as f64;
        let height = view.height() as f64;
        InterpBase {
            view,
            width,
            height,
            aspect,
            scale_x: (width - 1.0) / (2.0 * aspect),
            scale_y: (height - 1.0) / 2.0,
            null_val: 0.0,
        }
    }

    /// Map a normalised position into sample space, or `None` if it lies
    /// outside the frame
    #[inline]
    pub fn scaled(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let xs = (x + self.aspect) * self.scale_x;
        let ys = (y + 1.0) * self.scale_y;

        if xs < 0.0 || xs > self.width || ys < 0.0 || ys > self.height {
            return None;
        }

        Some((xs, ys))
    }
}
