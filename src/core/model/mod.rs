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

//! Correction models
//!
//! A geometric model maps a destination coordinate to a per-channel
//! source coordinate tuple; a colour model maps a per-channel source
//! coordinate tuple to a per-channel gain tuple. Models are plain value
//! types collected in tagged variants ([`GeomModel`], [`ColourModel`])
//! with a uniform apply operation, so queues can own and clone them
//! structurally.
//!
//! All models operate in the normalised coordinate system: centre origin,
//! short half-axis spanning [-1, +1]. Where a model's coefficients were
//! calibrated against a different aspect ratio or crop factor than the
//! input image uses, a [`CoordFrame`] rescales them on assignment.

mod base;
mod colour;
mod geom;
mod geometry;

pub use base::CoordFrame;
pub use colour::{ColourModel, HuginVignettingModel, VignettingModel};
pub use geom::{GeometryConvertModel, GeomModel, PtLensModel, ScalerModel};
pub use geometry::{LensGeometry, Projection};
