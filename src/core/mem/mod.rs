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

//! Pixel storage layouts and channel tuples
//!
//! This module describes the closed set of supported pixel layouts
//! (channel count, sample type, interleave) and the small fixed-width
//! tuples that carry per-channel coordinates and intensities through the
//! transform pipeline.

mod storage;
mod tuple;

pub use storage::{
    Channel, ChannelValue, PixelLayout, Rgb16Inter, Rgb16Planar, Rgb32Inter, Rgb32Planar,
    Rgb8Inter, Rgb8Planar, Rgba16Inter, Rgba16Planar, Rgba32Inter, Rgba32Planar, Rgba8Inter,
    Rgba8Planar, Storage, StorageInfo,
};
pub use tuple::{ColourTuple, CoordTuple};

/// Maximum number of channel lanes a model carries parameters for
///
/// Per-channel model parameters are stored in fixed arrays of this size so
/// that RGB and RGBA pipelines share one parameter representation.
pub const MAX_CHANNELS: usize = 4;

/// Coordinate tuple with a single lane (pre-broadcast destination coordinate)
pub type CoordTupleMono = CoordTuple<1>;
/// Coordinate tuple with one lane per RGB channel
pub type CoordTupleRgb = CoordTuple<3>;
/// Coordinate tuple with one lane per RGBA channel
pub type CoordTupleRgba = CoordTuple<4>;

/// Colour tuple with one lane per RGB channel
pub type ColourTupleRgb = ColourTuple<3>;
/// Colour tuple with one lane per RGBA channel
pub type ColourTupleRgba = ColourTuple<4>;
