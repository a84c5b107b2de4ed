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

//! Core engine components
//!
//! Everything needed to run a correction pass lives here: typed pixel
//! storage, the normalised coordinate model, the correction model queues,
//! the interpolators, the gain (gamma) functions, the transform driver and
//! the auto-scaler.

pub mod error;
pub mod gamma;
pub mod image;
pub mod interp;
pub mod mem;
pub mod model;
pub mod pipeline;
pub mod queue;
pub mod scaler;
pub mod settings;
pub mod transform;

#[cfg(test)]
mod tests;
