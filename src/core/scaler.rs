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

//! The crop-fit auto-scaler
//!
//! Given a composed geometric queue, finds the minimal positive scale
//! `s` such that applying the queue after an additional destination-side
//! scale of `s` maps every destination boundary point to a source point
//! inside the source frame.
//!
//! # Procedure
//!
//! For a candidate `s`, `N` equally spaced points on each of the four
//! destination boundary edges are pushed through the queue. For a
//! destination point at squared radius `r_d^2` whose channels land at a
//! maximum squared source radius `r_s^2`, the ratio `r_d^2 / r_s^2`
//! measures how tight the fit is; `step(s)` is the square root of the
//! boundary minimum. `step(s) > 1` means the source points lie inside
//! the destination radius (more scale needed), `step(s) < 1` means
//! headroom exists. A bracket is grown by halving or doubling (capped at
//! 10 iterations), then bisected.
//!
//! The auto-scaler clones the queue, so repeated evaluation never
//! mutates the transform's own queue, and it reports failure through the
//! result value rather than aborting. Installing the found scale is the
//! caller's decision; see
//! [`GeomQueue::push_front_model`](crate::core::queue::GeomQueue::push_front_model)
//! (the candidate scale acts on the destination coordinate before the
//! queue, so its scaler model belongs at the head, with `k = 1 / s`).

use crate::core::error::{EngineError, Result};
use crate::core::queue::GeomQueue;

/// Outcome of a scale search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSearch {
    /// True if the bisection converged
    pub found: bool,
    /// The converged scale, or the best effort so far on failure
    pub scale: f64,
}

/// Bisection search for the crop-fit scale of a geometric queue
///
/// # Examples
///
/// ```
/// use lensrx::core::model::{GeomModel, ScalerModel};
/// use lensrx::core::queue::GeomQueue;
/// use lensrx::core::scaler::AutoScaler;
///
/// // a queue that shrinks the frame by 20% leaves headroom; the
/// // auto-scaler finds the inverse factor
/// let mut scaler = ScalerModel::new();
/// scaler.set_param(0.8).unwrap();
/// let mut queue = GeomQueue::new();
/// queue.add_model(GeomModel::Scaler(scaler));
///
/// let result = AutoScaler::new(&queue, 1.5).find_scale::<3>(32).unwrap();
/// assert!(result.found);
/// assert!((result.scale - 0.8).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct AutoScaler {
    queue: GeomQueue,
    aspect: f64,
}

impl AutoScaler {
    /// Clone a queue for scale searching
    ///
    /// `aspect` is the destination frame's aspect ratio; the boundary
    /// walk samples the edges of the `[-aspect, aspect] x [-1, 1]`
    /// rectangle.
    pub fn new(queue: &GeomQueue, aspect: f64) -> Self {
        AutoScaler {
            queue: queue.clone(),
            aspect,
        }
    }

    /// Search for the crop-fit scale at the given boundary precision
    ///
    /// `precision` is both the number of boundary samples per edge and
    /// the bisection depth limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a precision below 2.
    /// Search failure (no bracket, depth exhausted) is not an error; it
    /// is reported through [`ScaleSearch::found`].
    pub fn find_scale<const N: usize>(&self, precision: usize) -> Result<ScaleSearch> {
        if precision < 2 {
            return Err(EngineError::config(format!(
                "auto-scaler precision must be >= 2, got {precision}"
            )));
        }

        let mut val1 = 1.0;
        let mut val2 = 1.0;

        if !self.find_start_pair::<N>(precision, &mut val1, &mut val2) {
            log::warn!("auto-scaler could not bracket a scale factor");
            return Ok(ScaleSearch {
                found: false,
                scale: (val1 + val2) / 2.0,
            });
        }

        let found = self.bisect::<N>(precision, &mut val1, &mut val2);
        Ok(ScaleSearch {
            found,
            scale: (val1 + val2) / 2.0,
        })
    }

    /// Bisect inside a bracketing pair until the precision target is met
    fn bisect<const N: usize>(&self, precision: usize, val1: &mut f64, val2: &mut f64) -> bool {
        let mut steps_left = precision;

        loop {
            if steps_left == 0 {
                // search depth exhausted
                return false;
            }

            let mid_val = (*val1 + *val2) / 2.0;
            let diff = (*val1 - *val2).abs();
            if (precision * 10) as f64 * diff < mid_val.abs() {
                // desired precision achieved
                return true;
            }

            let step1 = self.scale_step::<N>(precision, *val1) - 1.0;
            let step2 = self.scale_step::<N>(precision, *val2) - 1.0;
            let mid_step = self.scale_step::<N>(precision, mid_val) - 1.0;

            if !(step1 * step2 < 0.0) {
                // not bracketing the crossing
                return false;
            }

            if step1 * mid_step < 0.0 {
                *val2 = mid_val;
            } else {
                *val1 = mid_val;
            }

            steps_left -= 1;
        }
    }

    /// Grow a bracketing pair around the crossing of `step(s) = 1`
    fn find_start_pair<const N: usize>(
        &self,
        precision: usize,
        val1: &mut f64,
        val2: &mut f64,
    ) -> bool {
        const MAX_STEP: usize = 10;
        const MULT: f64 = 2.0;

        let mut scale_step = self.scale_step::<N>(precision, *val1);
        *val2 = *val1;

        if scale_step < 1.0 {
            for _ in 0..MAX_STEP {
                *val1 /= MULT;
                scale_step = self.scale_step::<N>(precision, *val1);
                if scale_step >= 1.0 {
                    return true;
                }
            }
        } else {
            for _ in 0..MAX_STEP {
                *val2 *= MULT;
                scale_step = self.scale_step::<N>(precision, *val2);
                if scale_step < 1.0 {
                    return true;
                }
            }
        }

        false
    }

    /// The fit measure at a candidate pre-scale
    ///
    /// Below 1 the warped boundary has headroom, above 1 it spills out of
    /// the source frame.
    pub fn scale_step<const N: usize>(&self, precision: usize, pre_scale: f64) -> f64 {
        let fact_y = self.search_horizontal::<N>(precision, pre_scale);
        let fact_x = self.search_vertical::<N>(precision, pre_scale);

        fact_x.min(fact_y).sqrt()
    }

    /// Walk the top and bottom boundary edges
    fn search_horizontal<const N: usize>(&self, px_width: usize, pre_scale: f64) -> f64 {
        let dst_top = -1.0;
        let dst_bottom = 1.0;
        let scale_x = 2.0 * self.aspect / (px_width - 1) as f64;

        let mut factor = f64::INFINITY;
        for i in 0..px_width {
            let cur_dst_x = i as f64 * scale_x - self.aspect;
            let factor_tmp = self
                .boundary_factor::<N>(cur_dst_x, dst_top, pre_scale)
                .min(self.boundary_factor::<N>(cur_dst_x, dst_bottom, pre_scale));
            factor = factor.min(factor_tmp);
        }

        factor
    }

    /// Walk the left and right boundary edges
    fn search_vertical<const N: usize>(&self, px_height: usize, pre_scale: f64) -> f64 {
        let dst_left = -self.aspect;
        let dst_right = self.aspect;
        let scale_y = 2.0 / (px_height - 1) as f64;

        let mut factor = f64::INFINITY;
        for i in 0..px_height {
            let cur_dst_y = i as f64 * scale_y - 1.0;
            let factor_tmp = self
                .boundary_factor::<N>(dst_left, cur_dst_y, pre_scale)
                .min(self.boundary_factor::<N>(dst_right, cur_dst_y, pre_scale));
            factor = factor.min(factor_tmp);
        }

        factor
    }

    /// Ratio of squared destination radius to maximal squared source radius
    fn boundary_factor<const N: usize>(&self, dst_x: f64, dst_y: f64, pre_scale: f64) -> f64 {
        let dst_r2 = dst_x * dst_x + dst_y * dst_y;

        let coords = self
            .queue
            .source_coords::<N>(dst_x * pre_scale, dst_y * pre_scale);

        let mut max_r2 = 0.0f64;
        for lane in 0..N {
            let r2 = coords.x[lane] * coords.x[lane] + coords.y[lane] * coords.y[lane];
            max_r2 = max_r2.max(r2);
        }

        dst_r2 / max_r2
    }
}
