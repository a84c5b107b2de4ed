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

//! lensrx: an offline lens-correction engine for digital camera images
//!
//! This crate rewrites a source raster into a destination raster by applying,
//! at every destination pixel, a composed geometric transform (distortion,
//! transverse chromatic aberration, lens-projection conversion, linear
//! rescaling) together with a per-channel multiplicative correction
//! (vignetting). The source raster is resampled with a selectable
//! reconstruction kernel, and all arithmetic happens in linear light via a
//! configurable opto-electronic transfer function.
//!
//! # Architecture
//!
//! The engine is organized into the following modules:
//!
//! - [`core::mem`]: Typed pixel storage layouts and fixed-width channel tuples
//! - [`core::image`]: Raster buffers, read/write views and pixel cursors
//! - [`core::model`]: Geometric and colour correction models
//! - [`core::queue`]: Ordered, composition-evaluated model queues
//! - [`core::gamma`]: Transfer functions (generic gamma, sRGB, EMOR)
//! - [`core::interp`]: Nearest / bilinear / Lanczos interpolators
//! - [`core::transform`]: The destination-scan transform driver
//! - [`core::scaler`]: The crop-fit auto-scaler
//! - [`core::pipeline`]: Settings-driven wiring of the above
//!
//! # Coordinate System
//!
//! All model math uses a normalised, signed, square-pixel coordinate system
//! with the image centre at the origin. The short half-axis spans [-1, +1];
//! for an image of aspect ratio A = width/height the long half-axis spans
//! [-A, +A].
//!
//! # Example
//!
//! ```
//! use lensrx::core::image::ImageBuffer;
//! use lensrx::core::interp::BilinearInterpolator;
//! use lensrx::core::mem::Rgb8Inter;
//! use lensrx::core::transform::ImageTransform;
//!
//! let input = ImageBuffer::<Rgb8Inter>::new(64, 48).unwrap();
//! let mut output = ImageBuffer::<Rgb8Inter>::new(64, 48).unwrap();
//!
//! let reader = input.view_r();
//! let writer = output.view_w();
//!
//! let interp = BilinearInterpolator::new(reader);
//! let mut transform = ImageTransform::new(interp, writer).unwrap();
//! // ... add correction models to transform.geom_queue_mut() ...
//! transform.do_transform();
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an
//! alias for `Result<T, EngineError>`. Configuration errors surface at
//! construction or mutator time; the transform itself never fails mid-stream.

pub mod core;

// Re-export commonly used types
pub use core::error::{EngineError, Result};
