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

//! Correction model queues
//!
//! A queue owns an ordered sequence of correction models and evaluates
//! them as one composed mapping. Models are added by value, so no caller
//! keeps an aliasing reference; the queue drops them on clear.
//!
//! # Composition
//!
//! The geometric queue composes left to right: the output tuple of model
//! `k` is the input tuple of model `k + 1`, and the monochrome destination
//! coordinate is broadcast to all lanes before the first model. Because
//! every model rewrites per-channel tuples, a TCA correction can precede
//! or follow a distortion correction. The designed order for photographic
//! correction is TCA, distortion, projection conversion, scale,
//! auto-scale adjustment.
//!
//! Colour gains compose by element-wise multiplication across the queue.
//!
//! Queues are mutated only before a transform runs; during the transform
//! they are read-only and safe to share across row tasks.

use crate::core::mem::{ColourTuple, CoordTuple};
use crate::core::model::{ColourModel, GeomModel};

/// An ordered queue of geometric correction models
///
/// # Examples
///
/// ```
/// use lensrx::core::model::{GeomModel, ScalerModel};
/// use lensrx::core::queue::GeomQueue;
///
/// let mut scaler = ScalerModel::new();
/// scaler.set_param(2.0).unwrap();
///
/// let mut queue = GeomQueue::new();
/// queue.add_model(GeomModel::Scaler(scaler));
///
/// let coords = queue.source_coords::<3>(1.0, 0.5);
/// assert_eq!(coords.x, [0.5; 3]);
/// assert_eq!(coords.y, [0.25; 3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeomQueue {
    models: Vec<GeomModel>,
}

impl GeomQueue {
    /// Create an empty queue (the identity mapping)
    pub fn new() -> Self {
        GeomQueue { models: Vec::new() }
    }

    /// Append a model to the queue
    ///
    /// The queue takes ownership; a reference to the queued model is
    /// returned for further parameter adjustment.
    pub fn add_model(&mut self, model: GeomModel) -> &mut GeomModel {
        self.models.push(model);
        self.models.last_mut().expect("queue is non-empty after push")
    }

    /// Insert a model at the front of the queue
    ///
    /// A front model rewrites the destination coordinate before any other
    /// model sees it; this is where the auto-scaler's crop-fit factor is
    /// installed.
    pub fn push_front_model(&mut self, model: GeomModel) {
        self.models.insert(0, model);
    }

    /// Drop all models
    pub fn clear(&mut self) {
        self.models.clear();
    }

    /// Number of queued models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if no models are queued
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Evaluate the composed mapping for one destination coordinate
    ///
    /// Broadcasts the coordinate to all lanes, then applies every model
    /// in insertion order.
    #[inline]
    pub fn source_coords<const N: usize>(&self, dst_x: f64, dst_y: f64) -> CoordTuple<N> {
        let mut coords = CoordTuple::splat(dst_x, dst_y);
        for model in &self.models {
            model.src_coords(&mut coords);
        }
        coords
    }
}

/// An ordered queue of colour correction models
///
/// Evaluates to the element-wise product of every model's gain tuple; an
/// empty queue yields unit gain.
#[derive(Debug, Clone, Default)]
pub struct ColourQueue {
    models: Vec<ColourModel>,
}

impl ColourQueue {
    /// Create an empty queue (unit gain)
    pub fn new() -> Self {
        ColourQueue { models: Vec::new() }
    }

    /// Append a model to the queue
    ///
    /// The queue takes ownership; a reference to the queued model is
    /// returned for further parameter adjustment.
    pub fn add_model(&mut self, model: ColourModel) -> &mut ColourModel {
        self.models.push(model);
        self.models.last_mut().expect("queue is non-empty after push")
    }

    /// Drop all models
    pub fn clear(&mut self) {
        self.models.clear();
    }

    /// Number of queued models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if no models are queued
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Evaluate the composed gains at a per-channel source position
    #[inline]
    pub fn correction_factors<const N: usize>(&self, coords: &CoordTuple<N>) -> ColourTuple<N> {
        let mut factors = ColourTuple::splat(1.0);
        let mut model_factors = ColourTuple::zero();
        for model in &self.models {
            model.correction_factors(coords, &mut model_factors);
            factors *= model_factors;
        }
        factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PtLensModel, ScalerModel, VignettingModel};

    #[test]
    fn test_empty_geom_queue_is_identity() {
        let queue = GeomQueue::new();
        let coords = queue.source_coords::<4>(0.25, -0.75);
        assert_eq!(coords, CoordTuple::splat(0.25, -0.75));
    }

    #[test]
    fn test_geom_queue_composes_in_insertion_order() {
        let mut queue = GeomQueue::new();

        let mut half = ScalerModel::new();
        half.set_param(2.0).unwrap();
        queue.add_model(GeomModel::Scaler(half));

        let mut model = PtLensModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, 0.5, 0.0);
        queue.add_model(GeomModel::PtLens(model));

        // x = 1.0 -> scaler -> 0.5 -> r' = 0.5 r^2 -> 0.125
        let coords = queue.source_coords::<3>(1.0, 0.0);
        assert!((coords.x[0] - 0.125).abs() < 1e-12);
        assert_eq!(coords.y[0], 0.0);
    }

    #[test]
    fn test_push_front_model_runs_first() {
        let mut queue = GeomQueue::new();

        let mut model = PtLensModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, 0.5, 0.0);
        queue.add_model(GeomModel::PtLens(model));

        let mut pre = ScalerModel::new();
        pre.set_param(0.5).unwrap();
        queue.push_front_model(GeomModel::Scaler(pre));

        // x = 1.0 -> front scaler (k=0.5) -> 2.0 -> r' = 0.5 r^2 -> 2.0
        let coords = queue.source_coords::<3>(1.0, 0.0);
        assert!((coords.x[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_clear_restores_identity() {
        let mut queue = GeomQueue::new();
        let mut scaler = ScalerModel::new();
        scaler.set_param(3.0).unwrap();
        queue.add_model(GeomModel::Scaler(scaler));
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
        let coords = queue.source_coords::<3>(0.5, 0.5);
        assert_eq!(coords, CoordTuple::splat(0.5, 0.5));
    }

    #[test]
    fn test_colour_queue_multiplies_gains() {
        let mut queue = ColourQueue::new();

        let mut first = VignettingModel::with_input_aspect(1.0);
        first.set_params(0.0, 0.0, -0.3);
        queue.add_model(ColourModel::Vignetting(first));

        let mut second = VignettingModel::with_input_aspect(1.0);
        second.set_params(0.0, 0.0, -0.2);
        queue.add_model(ColourModel::Vignetting(second));

        let coords = CoordTuple::<3>::splat(1.0, 0.0);
        let gains = queue.correction_factors(&coords);
        let expected = (1.0 / 0.7) * (1.0 / 0.8);
        assert!((gains.v[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_empty_colour_queue_is_unit_gain() {
        let queue = ColourQueue::new();
        let gains = queue.correction_factors(&CoordTuple::<4>::splat(0.9, 0.9));
        assert_eq!(gains.v, [1.0; 4]);
    }
}
