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

//! Raster buffers, views and pixel cursors
//!
//! An [`ImageBuffer`] owns the flat sample array of a raster. Views are
//! non-owning references into a buffer: [`ImageViewR`] for reading,
//! [`ImageViewW`] for writing. A write view additionally carries a region
//! of interest and a parent-window rectangle, which lets it act as a tile
//! of a larger virtual frame.
//!
//! Iterators ([`ImageIterR`], [`ImageIterW`]) are stride-advancing cursors
//! over a view; they address single pixels and never interpolate.

mod buffer;
mod iter;
mod view;

pub use buffer::ImageBuffer;
pub use iter::{ImageIterR, ImageIterW};
pub use view::{ImageViewR, ImageViewW};
