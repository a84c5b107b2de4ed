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

//! The image transform driver
//!
//! Scans the destination region of interest pixel by pixel; for every
//! pixel (optionally oversampled on a regular grid) the geometric queue
//! produces per-channel source coordinates, the colour queue per-channel
//! gains, and the interpolator reconstructs the source samples. Values
//! are accumulated in linear light, clamped, re-encoded and quantised.
//!
//! # Parallelism
//!
//! The outer row loop is data-parallel: each destination row is one task
//! on the rayon pool. The read view, the queues, the interpolator's
//! kernel table and the gain LUTs are read-only during the transform;
//! write cursors of distinct rows address disjoint memory, so no
//! synchronisation is needed on sample writes. Pin the pool to one
//! worker for bit-exact reproducible runs.
//!
//! # Failure policy
//!
//! `do_transform` never fails mid-stream. Out-of-frame source samples
//! yield the interpolator's null value; they are not errors. Every
//! configuration error surfaces at construction or mutator time.

use rayon::prelude::*;

use crate::core::error::{EngineError, Result};
use crate::core::gamma::{GainFunction, GainLut};
use crate::core::image::ImageViewW;
use crate::core::interp::Interpolator;
use crate::core::mem::{Channel, ColourTuple, PixelLayout, StorageInfo};
use crate::core::queue::{ColourQueue, GeomQueue};

/// Default number of segments in the gain LUTs
pub const DEFAULT_GAMMA_SEGMENTS: usize = 1024;

/// The composed per-pixel transform over one read / write view pair
///
/// Owns the interpolator (which holds its reference to the read view),
/// the destination write view, the model queues and the gain tables. The
/// queues are created empty and may be mutated freely until
/// [`ImageTransform::do_transform`] is invoked.
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::interp::NearestInterpolator;
/// use lensrx::core::mem::Rgb8Inter;
/// use lensrx::core::transform::ImageTransform;
///
/// let input = ImageBuffer::<Rgb8Inter>::new(16, 16).unwrap();
/// let mut output = ImageBuffer::<Rgb8Inter>::new(16, 16).unwrap();
///
/// let interp = NearestInterpolator::new(input.view_r());
/// let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
/// transform.enable_gamma(false);
/// transform.do_transform();
/// ```
pub struct ImageTransform<'a, L: PixelLayout, I: Interpolator> {
    interpolator: I,
    writer: ImageViewW<'a, L>,
    geom_queue: GeomQueue,
    colour_queue: ColourQueue,
    oversampling: u32,
    gain: GainFunction,
    do_gamma: bool,
    lut_segments: usize,
    gamma_lut: GainLut,
    inv_gamma_lut: GainLut,
}

impl<'a, L: PixelLayout, I: Interpolator> ImageTransform<'a, L, I> {
    /// Create a transform over an interpolator / write view pair
    ///
    /// The default gain function is a generic gamma of 2.2 with LUTs of
    /// [`DEFAULT_GAMMA_SEGMENTS`] segments.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the write view's parent
    /// window is smaller than 2x2 pixels (the normalised coordinate
    /// system needs a nonzero extent on both axes).
    pub fn new(interpolator: I, writer: ImageViewW<'a, L>) -> Result<Self> {
        let (_, _, p_w, p_h) = writer.parent_window();
        if p_w < 2 || p_h < 2 {
            return Err(EngineError::config(format!(
                "destination parent window must be at least 2x2, got {p_w}x{p_h}"
            )));
        }

        let gain = GainFunction::Gamma(2.2);
        let gamma_lut = GainLut::build(DEFAULT_GAMMA_SEGMENTS, |v| gain.gamma(v));
        let inv_gamma_lut = GainLut::build(DEFAULT_GAMMA_SEGMENTS, |v| gain.inv_gamma(v));

        Ok(ImageTransform {
            interpolator,
            writer,
            geom_queue: GeomQueue::new(),
            colour_queue: ColourQueue::new(),
            oversampling: 1,
            gain,
            do_gamma: true,
            lut_segments: DEFAULT_GAMMA_SEGMENTS,
            gamma_lut,
            inv_gamma_lut,
        })
    }

    /// The geometric correction queue
    pub fn geom_queue(&self) -> &GeomQueue {
        &self.geom_queue
    }

    /// The geometric correction queue, mutable
    pub fn geom_queue_mut(&mut self) -> &mut GeomQueue {
        &mut self.geom_queue
    }

    /// The colour correction queue
    pub fn colour_queue(&self) -> &ColourQueue {
        &self.colour_queue
    }

    /// The colour correction queue, mutable
    pub fn colour_queue_mut(&mut self) -> &mut ColourQueue {
        &mut self.colour_queue
    }

    /// The interpolator
    pub fn interpolator(&self) -> &I {
        &self.interpolator
    }

    /// The interpolator, mutable (for null value, kernel configuration)
    pub fn interpolator_mut(&mut self) -> &mut I {
        &mut self.interpolator
    }

    /// The destination write view, mutable (for ROI adjustment)
    pub fn writer_mut(&mut self) -> &mut ImageViewW<'a, L> {
        &mut self.writer
    }

    /// Aspect ratio the transform operates in
    pub fn aspect_ratio(&self) -> f64 {
        self.interpolator.aspect_ratio()
    }

    /// Install a gain function pair and rebuild the LUTs
    pub fn set_gain_function(&mut self, gain: GainFunction) {
        self.gain = gain;
        self.rebuild_luts();
    }

    /// Rebuild the gain LUTs at a new segment count
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for fewer than 2 segments.
    pub fn set_gamma_precision(&mut self, segments: usize) -> Result<()> {
        if segments < 2 {
            return Err(EngineError::config(format!(
                "gamma LUT needs at least 2 segments, got {segments}"
            )));
        }
        self.lut_segments = segments;
        self.rebuild_luts();
        Ok(())
    }

    /// Enable or disable the gain function
    ///
    /// Disabling short-circuits both directions to identity. Running
    /// with gamma disabled while colour corrections are queued is
    /// defined but photometrically incorrect; it is offered for speed.
    pub fn enable_gamma(&mut self, enable: bool) {
        self.do_gamma = enable;
    }

    /// Set the oversampling grid size (`O x O` sub-samples per pixel)
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for zero.
    pub fn set_oversampling(&mut self, oversampling: u32) -> Result<()> {
        if oversampling == 0 {
            return Err(EngineError::config("oversampling must be >= 1"));
        }
        self.oversampling = oversampling;
        Ok(())
    }

    fn rebuild_luts(&mut self) {
        let gain = &self.gain;
        self.gamma_lut = GainLut::build(self.lut_segments, |v| gain.gamma(v));
        self.inv_gamma_lut = GainLut::build(self.lut_segments, |v| gain.inv_gamma(v));
    }

    /// Run the transform over the write view's region of interest
    ///
    /// Rows are dispatched to the current rayon pool; the final raster is
    /// deterministic given identical inputs regardless of worker count.
    pub fn do_transform(&mut self) {
        match L::NUM_CHANNELS {
            3 => self.transform_rows::<3>(),
            4 => self.transform_rows::<4>(),
            _ => unreachable!("layouts carry 3 or 4 channels"),
        }
    }

    fn transform_rows<const N: usize>(&mut self) {
        let (roi_x0, roi_y0, roi_x1, roi_y1) = self.writer.roi();
        let (p_offs_x, p_offs_y, p_w, p_h) = self.writer.parent_window();

        // coordinate transformation parameters
        let aspect = self.interpolator.aspect_ratio();
        let scale_x = 2.0 * aspect / (p_w - 1) as f64;
        let scale_y = 2.0 / (p_h - 1) as f64;

        // oversampling parameters
        let oversampling = self.oversampling as usize;
        let samp_step = 1.0 / self.oversampling as f64;
        let channel_scaling = samp_step * samp_step;

        // sample domains on the read and write side
        let (read_min, read_max) = self.interpolator.sample_range();
        let read_range = read_max - read_min;
        let info: &StorageInfo<L> = self.writer.storage_info();
        let write_min = info.min_val();
        let write_range = info.max_val() - write_min;

        let do_gamma = self.do_gamma;
        let interp = &self.interpolator;
        let geom_queue = &self.geom_queue;
        let colour_queue = &self.colour_queue;
        let gamma_lut = &self.gamma_lut;
        let inv_gamma_lut = &self.inv_gamma_lut;

        let raw_writer = self.writer.raw();

        (roi_y0..roi_y1).into_par_iter().for_each(move |j| {
            let mut iter = raw_writer.iter_at(roi_x0, j);

            for i in roi_x0..roi_x1 {
                let mut acc = ColourTuple::<N>::zero();

                // place each sub-sample at the centre of its sub-cell
                let ini_samp_x = i as f64 - 0.5 + samp_step / 2.0;
                let mut cur_samp_y = j as f64 - 0.5 + samp_step / 2.0;

                for _ in 0..oversampling {
                    let mut cur_samp_x = ini_samp_x;

                    for _ in 0..oversampling {
                        // normalised destination coordinate
                        let dst_x = (cur_samp_x + p_offs_x as f64) * scale_x - aspect;
                        let dst_y = (cur_samp_y + p_offs_y as f64) * scale_y - 1.0;

                        // per-channel source coordinates and gains
                        let coords = geom_queue.source_coords::<N>(dst_x, dst_y);
                        let gains = colour_queue.correction_factors(&coords);

                        for lane in 0..N {
                            let raw = interp.sample(
                                Channel::of_lane(lane),
                                coords.x[lane],
                                coords.y[lane],
                            );
                            let mut val = (raw - read_min) / read_range;
                            if do_gamma {
                                val = gamma_lut.eval(val);
                            }
                            acc.v[lane] += val * gains.v[lane];
                        }

                        cur_samp_x += samp_step;
                    }

                    cur_samp_y += samp_step;
                }

                // oversampling normalisation, clipping, re-encoding
                acc *= channel_scaling;
                acc.clamp01();

                for lane in 0..N {
                    let mut val = acc.v[lane];
                    if do_gamma {
                        val = inv_gamma_lut.eval(val);
                    }
                    iter.write_px_interp(Channel::of_lane(lane), val * write_range + write_min);
                }

                iter.inc_x();
            }
        });
    }
}
