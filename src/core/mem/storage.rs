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

//! Storage layout descriptions
//!
//! A raster is stored as a flat sample array whose addressing is fully
//! determined by its layout: channel count (3 or 4), sample type (u8, u16
//! or u32) and interleave (packed or planar). Every layout in the closed
//! set is a zero-sized type implementing [`PixelLayout`], from which the
//! per-pixel stride, per-line stride, per-channel base offsets and the
//! storable sample range are derived.
//!
//! Runtime code holds a [`Storage`] tag and dispatches to the matching
//! generic instantiation with the [`with_layout!`](crate::with_layout)
//! macro.
//!
//! # Addressing
//!
//! For a pixel at `(x, y)` and a channel with base offset `offs`, the
//! sample index into the flat array is:
//!
//! ```text
//! index = y * line_step + x * step + offs
//! ```
//!
//! Interleaved layouts use `step = channels`, `line_step = channels * width`
//! and channel offsets `0, 1, 2[, 3]`. Planar layouts use `step = 1`,
//! `line_step = width` and channel offsets that are multiples of
//! `width * height`.

use crate::core::error::{EngineError, Result};

/// A colour channel of a raster
///
/// Layouts without an alpha plane alias [`Channel::Alpha`] to the red
/// offset; the transform pipeline never addresses alpha on a 3-channel
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Red channel
    Red,
    /// Green channel
    Green,
    /// Blue channel
    Blue,
    /// Alpha channel
    Alpha,
}

impl Channel {
    /// Map a tuple lane index to its channel
    ///
    /// Lanes are always ordered `R, G, B[, A]` regardless of how the
    /// samples are laid out in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use lensrx::core::mem::Channel;
    ///
    /// assert_eq!(Channel::of_lane(0), Channel::Red);
    /// assert_eq!(Channel::of_lane(3), Channel::Alpha);
    /// ```
    #[inline]
    pub fn of_lane(lane: usize) -> Channel {
        match lane {
            0 => Channel::Red,
            1 => Channel::Green,
            2 => Channel::Blue,
            _ => Channel::Alpha,
        }
    }

    /// The tuple lane index of this channel
    #[inline]
    pub fn lane(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
            Channel::Alpha => 3,
        }
    }
}

/// A sample type a raster channel can be stored in
///
/// Implemented for `u8`, `u16` and `u32`. The trait carries the storable
/// range and the conversions to and from the `f64` interpolation domain.
pub trait ChannelValue:
    Copy + Clone + Send + Sync + PartialOrd + std::fmt::Debug + Default + 'static
{
    /// Smallest storable sample
    const MIN: Self;
    /// Largest storable sample
    const MAX: Self;

    /// Widen the sample to the interpolation domain
    fn to_interp(self) -> f64;

    /// Quantise an interpolation-domain value to a sample
    ///
    /// Rounds half away from zero; values outside the storable range
    /// saturate.
    fn from_interp(v: f64) -> Self;
}

macro_rules! impl_channel_value {
    ($($t:ty),*) => {
        $(
            impl ChannelValue for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;

                #[inline]
                fn to_interp(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_interp(v: f64) -> Self {
                    // `as` saturates on out-of-range floats
                    v.round() as $t
                }
            }
        )*
    };
}

impl_channel_value!(u8, u16, u32);

/// Runtime tag for the closed set of supported pixel layouts
///
/// The set is the cross product of channel count {3, 4}, sample type
/// {u8, u16, u32} and interleave {packed, planar}.
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::Storage;
///
/// let storage = Storage::from_parts(3, 16, false).unwrap();
/// assert_eq!(storage, Storage::Rgb16Inter);
/// assert_eq!(storage.num_channels(), 3);
/// assert!(Storage::from_parts(2, 16, false).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// 8-bit RGB, interleaved
    Rgb8Inter,
    /// 8-bit RGBA, interleaved
    Rgba8Inter,
    /// 16-bit RGB, interleaved
    Rgb16Inter,
    /// 16-bit RGBA, interleaved
    Rgba16Inter,
    /// 32-bit RGB, interleaved
    Rgb32Inter,
    /// 32-bit RGBA, interleaved
    Rgba32Inter,
    /// 8-bit RGB, planar
    Rgb8Planar,
    /// 8-bit RGBA, planar
    Rgba8Planar,
    /// 16-bit RGB, planar
    Rgb16Planar,
    /// 16-bit RGBA, planar
    Rgba16Planar,
    /// 32-bit RGB, planar
    Rgb32Planar,
    /// 32-bit RGBA, planar
    Rgba32Planar,
}

impl Storage {
    /// Number of channels of the layout (3 or 4)
    pub fn num_channels(self) -> usize {
        match self {
            Storage::Rgb8Inter
            | Storage::Rgb16Inter
            | Storage::Rgb32Inter
            | Storage::Rgb8Planar
            | Storage::Rgb16Planar
            | Storage::Rgb32Planar => 3,
            _ => 4,
        }
    }

    /// Bit depth of a single sample (8, 16 or 32)
    pub fn bit_depth(self) -> usize {
        match self {
            Storage::Rgb8Inter | Storage::Rgba8Inter | Storage::Rgb8Planar | Storage::Rgba8Planar => 8,
            Storage::Rgb16Inter
            | Storage::Rgba16Inter
            | Storage::Rgb16Planar
            | Storage::Rgba16Planar => 16,
            _ => 32,
        }
    }

    /// True if the layout stores each channel in its own plane
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Storage::Rgb8Planar
                | Storage::Rgba8Planar
                | Storage::Rgb16Planar
                | Storage::Rgba16Planar
                | Storage::Rgb32Planar
                | Storage::Rgba32Planar
        )
    }

    /// Resolve a layout tag from a loader's raster description
    ///
    /// # Arguments
    ///
    /// * `channels` - Channel count (3 or 4)
    /// * `bit_depth` - Bits per sample (8, 16 or 32)
    /// * `planar` - True for planar storage, false for interleaved
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LayoutMismatch`] for any combination outside
    /// the closed set.
    pub fn from_parts(channels: usize, bit_depth: usize, planar: bool) -> Result<Storage> {
        let storage = match (channels, bit_depth, planar) {
            (3, 8, false) => Storage::Rgb8Inter,
            (4, 8, false) => Storage::Rgba8Inter,
            (3, 16, false) => Storage::Rgb16Inter,
            (4, 16, false) => Storage::Rgba16Inter,
            (3, 32, false) => Storage::Rgb32Inter,
            (4, 32, false) => Storage::Rgba32Inter,
            (3, 8, true) => Storage::Rgb8Planar,
            (4, 8, true) => Storage::Rgba8Planar,
            (3, 16, true) => Storage::Rgb16Planar,
            (4, 16, true) => Storage::Rgba16Planar,
            (3, 32, true) => Storage::Rgb32Planar,
            (4, 32, true) => Storage::Rgba32Planar,
            _ => {
                return Err(EngineError::LayoutMismatch(format!(
                    "{channels} channels x {bit_depth} bit ({})",
                    if planar { "planar" } else { "interleaved" }
                )));
            }
        };
        Ok(storage)
    }
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} channels x {} bit ({})",
            self.num_channels(),
            self.bit_depth(),
            if self.is_planar() { "planar" } else { "interleaved" }
        )
    }
}

/// Compile-time description of a pixel layout
///
/// Each supported layout is a zero-sized marker type; buffers, views,
/// iterators, interpolators and the transform are generic over it. The
/// per-pixel and per-line strides and the per-channel base offsets are
/// pure functions of the layout and the raster dimensions.
pub trait PixelLayout: Copy + Clone + Send + Sync + 'static {
    /// The concrete sample type of this layout
    type Sample: ChannelValue;

    /// The runtime tag corresponding to this layout
    const STORAGE: Storage;

    /// Number of channels (3 or 4)
    const NUM_CHANNELS: usize;

    /// Per-pixel stride, in samples
    fn step(width: usize, height: usize) -> usize;

    /// Per-line stride, in samples
    fn line_step(width: usize, height: usize) -> usize;

    /// Base offset of a channel, in samples
    fn chan_offs(chan: Channel, width: usize, height: usize) -> usize;
}

macro_rules! interleaved_layout {
    ($name:ident, $sample:ty, $storage:expr, 3) => {
        #[doc = concat!("Marker type for [`Storage::", stringify!($name), "`]")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PixelLayout for $name {
            type Sample = $sample;
            const STORAGE: Storage = $storage;
            const NUM_CHANNELS: usize = 3;

            #[inline]
            fn step(_width: usize, _height: usize) -> usize {
                3
            }

            #[inline]
            fn line_step(width: usize, _height: usize) -> usize {
                3 * width
            }

            #[inline]
            fn chan_offs(chan: Channel, _width: usize, _height: usize) -> usize {
                match chan {
                    Channel::Red => 0,
                    Channel::Green => 1,
                    Channel::Blue => 2,
                    // no alpha plane; alias to red
                    Channel::Alpha => 0,
                }
            }
        }
    };
    ($name:ident, $sample:ty, $storage:expr, 4) => {
        #[doc = concat!("Marker type for [`Storage::", stringify!($name), "`]")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PixelLayout for $name {
            type Sample = $sample;
            const STORAGE: Storage = $storage;
            const NUM_CHANNELS: usize = 4;

            #[inline]
            fn step(_width: usize, _height: usize) -> usize {
                4
            }

            #[inline]
            fn line_step(width: usize, _height: usize) -> usize {
                4 * width
            }

            #[inline]
            fn chan_offs(chan: Channel, _width: usize, _height: usize) -> usize {
                match chan {
                    Channel::Red => 0,
                    Channel::Green => 1,
                    Channel::Blue => 2,
                    Channel::Alpha => 3,
                }
            }
        }
    };
}

macro_rules! planar_layout {
    ($name:ident, $sample:ty, $storage:expr, $channels:literal) => {
        #[doc = concat!("Marker type for [`Storage::", stringify!($name), "`]")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl PixelLayout for $name {
            type Sample = $sample;
            const STORAGE: Storage = $storage;
            const NUM_CHANNELS: usize = $channels;

            #[inline]
            fn step(_width: usize, _height: usize) -> usize {
                1
            }

            #[inline]
            fn line_step(width: usize, _height: usize) -> usize {
                width
            }

            #[inline]
            fn chan_offs(chan: Channel, width: usize, height: usize) -> usize {
                let plane = width * height;
                match chan {
                    Channel::Red => 0,
                    Channel::Green => plane,
                    Channel::Blue => 2 * plane,
                    Channel::Alpha => {
                        if $channels == 4 {
                            3 * plane
                        } else {
                            // no alpha plane; alias to red
                            0
                        }
                    }
                }
            }
        }
    };
}

interleaved_layout!(Rgb8Inter, u8, Storage::Rgb8Inter, 3);
interleaved_layout!(Rgba8Inter, u8, Storage::Rgba8Inter, 4);
interleaved_layout!(Rgb16Inter, u16, Storage::Rgb16Inter, 3);
interleaved_layout!(Rgba16Inter, u16, Storage::Rgba16Inter, 4);
interleaved_layout!(Rgb32Inter, u32, Storage::Rgb32Inter, 3);
interleaved_layout!(Rgba32Inter, u32, Storage::Rgba32Inter, 4);
planar_layout!(Rgb8Planar, u8, Storage::Rgb8Planar, 3);
planar_layout!(Rgba8Planar, u8, Storage::Rgba8Planar, 4);
planar_layout!(Rgb16Planar, u16, Storage::Rgb16Planar, 3);
planar_layout!(Rgba16Planar, u16, Storage::Rgba16Planar, 4);
planar_layout!(Rgb32Planar, u32, Storage::Rgb32Planar, 3);
planar_layout!(Rgba32Planar, u32, Storage::Rgba32Planar, 4);

/// Precomputed addressing constants of a layout at fixed raster dimensions
///
/// Views and iterators are built from this rather than re-deriving strides
/// on every access.
#[derive(Debug, Clone, Copy)]
pub struct StorageInfo<L: PixelLayout> {
    /// Raster width in pixels
    pub width: usize,
    /// Raster height in pixels
    pub height: usize,
    /// Per-pixel stride in samples
    pub step: usize,
    /// Per-line stride in samples
    pub line_step: usize,
    /// Red channel base offset in samples
    pub r_offs: usize,
    /// Green channel base offset in samples
    pub g_offs: usize,
    /// Blue channel base offset in samples
    pub b_offs: usize,
    /// Alpha channel base offset in samples (red offset on 3-channel layouts)
    pub a_offs: usize,
    _layout: std::marker::PhantomData<L>,
}

impl<L: PixelLayout> StorageInfo<L> {
    /// Derive the addressing constants for a raster of the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        StorageInfo {
            width,
            height,
            step: L::step(width, height),
            line_step: L::line_step(width, height),
            r_offs: L::chan_offs(Channel::Red, width, height),
            g_offs: L::chan_offs(Channel::Green, width, height),
            b_offs: L::chan_offs(Channel::Blue, width, height),
            a_offs: L::chan_offs(Channel::Alpha, width, height),
            _layout: std::marker::PhantomData,
        }
    }

    /// Base offset of the given channel
    #[inline]
    pub fn chan_offs(&self, chan: Channel) -> usize {
        match chan {
            Channel::Red => self.r_offs,
            Channel::Green => self.g_offs,
            Channel::Blue => self.b_offs,
            Channel::Alpha => self.a_offs,
        }
    }

    /// Smallest storable sample, in the interpolation domain
    #[inline]
    pub fn min_val(&self) -> f64 {
        L::Sample::MIN.to_interp()
    }

    /// Largest storable sample, in the interpolation domain
    #[inline]
    pub fn max_val(&self) -> f64 {
        L::Sample::MAX.to_interp()
    }

    /// Total number of samples a buffer of this layout allocates
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.width * self.height * L::NUM_CHANNELS
    }
}

/// Dispatch from a runtime [`Storage`] tag to a generic instantiation
///
/// Binds the matching [`PixelLayout`] marker type to the given identifier
/// and evaluates the body once for the selected layout. This is the single
/// place where the runtime layout enum meets the statically monomorphised
/// engine code.
///
/// # Examples
///
/// ```
/// use lensrx::core::mem::{PixelLayout, Storage};
/// use lensrx::with_layout;
///
/// let storage = Storage::Rgba16Planar;
/// let channels = with_layout!(storage, L => L::NUM_CHANNELS);
/// assert_eq!(channels, 4);
/// ```
#[macro_export]
macro_rules! with_layout {
    ($storage:expr, $L:ident => $body:expr) => {{
        use $crate::core::mem::{
            Rgb16Inter, Rgb16Planar, Rgb32Inter, Rgb32Planar, Rgb8Inter, Rgb8Planar, Rgba16Inter,
            Rgba16Planar, Rgba32Inter, Rgba32Planar, Rgba8Inter, Rgba8Planar, Storage,
        };
        match $storage {
            Storage::Rgb8Inter => {
                type $L = Rgb8Inter;
                $body
            }
            Storage::Rgba8Inter => {
                type $L = Rgba8Inter;
                $body
            }
            Storage::Rgb16Inter => {
                type $L = Rgb16Inter;
                $body
            }
            Storage::Rgba16Inter => {
                type $L = Rgba16Inter;
                $body
            }
            Storage::Rgb32Inter => {
                type $L = Rgb32Inter;
                $body
            }
            Storage::Rgba32Inter => {
                type $L = Rgba32Inter;
                $body
            }
            Storage::Rgb8Planar => {
                type $L = Rgb8Planar;
                $body
            }
            Storage::Rgba8Planar => {
                type $L = Rgba8Planar;
                $body
            }
            Storage::Rgb16Planar => {
                type $L = Rgb16Planar;
                $body
            }
            Storage::Rgba16Planar => {
                type $L = Rgba16Planar;
                $body
            }
            Storage::Rgb32Planar => {
                type $L = Rgb32Planar;
                $body
            }
            Storage::Rgba32Planar => {
                type $L = Rgba32Planar;
                $body
            }
        }
    }};
}
