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

//! Settings-driven correction pipeline
//!
//! Wires a [`Settings`] record into a concrete transform: builds the
//! interpolator, installs the gain function, queues the correction
//! models in the designed order (TCA, distortion, projection conversion,
//! scale, auto-scale adjustment), runs the auto-scaler when requested
//! and executes the transform.
//!
//! This is the monomorphisation point: [`run`] is generic over the pixel
//! layout, and the CLI dispatches into it from the runtime storage tag.

use crate::core::error::{EngineError, Result};
use crate::core::gamma::GainFunction;
use crate::core::image::{ImageBuffer, ImageViewW};
use crate::core::interp::{
    BilinearInterpolator, Interpolation, Interpolator, LanczosInterpolator, NearestInterpolator,
};
use crate::core::mem::PixelLayout;
use crate::core::model::{
    ColourModel, CoordFrame, GeometryConvertModel, GeomModel, HuginVignettingModel, Projection,
    PtLensModel, ScalerModel,
};
use crate::core::scaler::AutoScaler;
use crate::core::settings::{GainFuncKind, Settings, SubRect};
use crate::core::transform::ImageTransform;

// tuple lanes are always ordered R, G, B[, A]
const IDX_RED: usize = 0;
const IDX_BLUE: usize = 2;

/// Run a full correction pass over one typed buffer
///
/// Returns the corrected destination buffer. With a sub-rect configured
/// the destination is a tile of the source frame; otherwise it matches
/// the source dimensions.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] for malformed settings; the
/// transform itself cannot fail once configured.
///
/// # Examples
///
/// ```
/// use lensrx::core::image::ImageBuffer;
/// use lensrx::core::mem::Rgb8Inter;
/// use lensrx::core::pipeline;
/// use lensrx::core::settings::Settings;
///
/// let input = ImageBuffer::<Rgb8Inter>::new(32, 24).unwrap();
/// let mut settings = Settings::default();
/// settings.ptlens = Some(vec![0.0, 0.019, -0.066]);
/// settings.threads = 1;
///
/// let output = pipeline::run(&settings, &input).unwrap();
/// assert_eq!(output.width(), 32);
/// assert_eq!(output.height(), 24);
/// ```
pub fn run<L: PixelLayout>(settings: &Settings, input: &ImageBuffer<L>) -> Result<ImageBuffer<L>> {
    settings.validate()?;

    let in_w = input.width();
    let in_h = input.height();
    log::debug!("input dimensions: {in_w}x{in_h} ({})", L::STORAGE);

    let (offs_x, offs_y, dst_w, dst_h) = resolve_sub_rect(settings.sub_rect, in_w, in_h);
    let mut output = ImageBuffer::<L>::new(dst_w, dst_h)?;

    {
        let reader = input.view_r();
        let mut writer = output.view_w();
        writer.set_parent_window(offs_x, offs_y, in_w, in_h)?;

        match settings.interpolation {
            Interpolation::Nearest => {
                log::info!("use nearest neighbour interpolation");
                run_with(settings, NearestInterpolator::new(reader), writer, in_h)?;
            }
            Interpolation::Bilinear => {
                log::info!("use bilinear interpolation");
                run_with(settings, BilinearInterpolator::new(reader), writer, in_h)?;
            }
            Interpolation::Lanczos => {
                log::info!(
                    "use Lanczos interpolation, support = {}",
                    settings.lanczos_support
                );
                let mut interp = LanczosInterpolator::new(reader);
                interp.set_support(settings.lanczos_support)?;
                run_with(settings, interp, writer, in_h)?;
            }
        }
    }

    Ok(output)
}

/// Clamp a requested sub-rect to the source frame
///
/// Out-of-range requests fall back to the full frame (oversized) or to
/// the frame origin (misplaced), with a warning.
fn resolve_sub_rect(
    sub_rect: Option<SubRect>,
    in_w: usize,
    in_h: usize,
) -> (usize, usize, usize, usize) {
    let Some(rect) = sub_rect else {
        return (0, 0, in_w, in_h);
    };

    if rect.w > in_w || rect.h > in_h {
        log::warn!(
            "sub-rect {}x{} exceeds the {}x{} frame, using the full frame",
            rect.w,
            rect.h,
            in_w,
            in_h
        );
        return (0, 0, in_w, in_h);
    }

    let (mut x0, mut y0) = (rect.x0, rect.y0);
    if x0 > in_w - rect.w || y0 > in_h - rect.h {
        log::warn!("sub-rect offset +{x0}+{y0} out of range, using the frame origin");
        x0 = 0;
        y0 = 0;
    }

    (x0, y0, rect.w, rect.h)
}

fn run_with<L: PixelLayout, I: Interpolator + Send>(
    settings: &Settings,
    interpolator: I,
    writer: ImageViewW<'_, L>,
    input_height: usize,
) -> Result<()> {
    let mut transform = ImageTransform::new(interpolator, writer)?;

    set_gain_function(settings, &mut transform)?;
    transform.set_gamma_precision(settings.gamma_lut_size)?;
    transform.enable_gamma(!settings.no_gamma);
    transform.set_oversampling(settings.oversample)?;

    add_models(settings, &mut transform, input_height)?;

    if let Some(precision) = settings.autoscale {
        autoscale(&mut transform, precision)?;
    }

    match settings.threads {
        0 => transform.do_transform(),
        threads => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| EngineError::config(format!("thread pool: {e}")))?;
            pool.install(|| transform.do_transform());
        }
    }

    Ok(())
}

fn set_gain_function<L: PixelLayout, I: Interpolator>(
    settings: &Settings,
    transform: &mut ImageTransform<'_, L, I>,
) -> Result<()> {
    let gain = match settings.gain_func {
        GainFuncKind::Srgb => {
            log::info!("use sRGB gain function");
            GainFunction::srgb()
        }
        GainFuncKind::Gamma => {
            log::info!("use generic gamma gain function, gamma = {}", settings.gamma);
            GainFunction::generic_gamma(settings.gamma)?
        }
        GainFuncKind::Emor => {
            log::info!("use EMOR gain function");
            GainFunction::emor(&settings.emor_params)?
        }
        GainFuncKind::InvEmor => {
            log::info!("use inverse EMOR gain function");
            GainFunction::inv_emor(&settings.emor_params)?
        }
    };

    transform.set_gain_function(gain);
    Ok(())
}

/// Queue the configured correction models
///
/// Order matters: TCA first, then distortion, projection conversion and
/// plain scaling; vignetting goes to the colour queue.
fn add_models<L: PixelLayout, I: Interpolator>(
    settings: &Settings,
    transform: &mut ImageTransform<'_, L, I>,
    input_height: usize,
) -> Result<()> {
    let image_aspect = transform.aspect_ratio();

    let param_aspect = match settings.param_aspect {
        Some(aspect) => {
            log::info!("override parameter aspect: {aspect}");
            aspect
        }
        None => {
            // if no aspect is given, assume the landscape orientation of
            // the input image
            let aspect = if image_aspect > 1.0 {
                image_aspect
            } else {
                1.0 / image_aspect
            };
            log::debug!("assume parameter aspect: {aspect}");
            aspect
        }
    };

    let frame = CoordFrame::new(
        param_aspect,
        image_aspect,
        settings.param_crop,
        settings.image_crop,
    );

    // centre shift is given in pixels; normalised units are height-based
    let (x0, y0) = match settings.centre_shift {
        Some([px, py]) => (px / input_height as f64, py / input_height as f64),
        None => (0.0, 0.0),
    };

    if let Some(tca) = &settings.tca {
        log::info!("add model: linear TCA correction");
        let mut model = ScalerModel::new();
        model.set_param_single(IDX_RED, tca.kr)?;
        model.set_param_single(IDX_BLUE, tca.kb)?;
        transform.geom_queue_mut().add_model(GeomModel::Scaler(model));
    }

    if settings.ptlens_r.is_some() || settings.ptlens_b.is_some() {
        log::info!("add model: PTLens TCA correction");
        let mut model = PtLensModel::new(frame);
        model.set_params(0.0, 0.0, 0.0, 1.0);
        if let Some(params) = &settings.ptlens_r {
            model.set_params_single(IDX_RED, params[0], params[1], params[2], params[3]);
        }
        if let Some(params) = &settings.ptlens_b {
            model.set_params_single(IDX_BLUE, params[0], params[1], params[2], params[3]);
        }
        model.set_centre_shift(x0, y0);
        transform.geom_queue_mut().add_model(GeomModel::PtLens(model));
    }

    if let Some(params) = &settings.ptlens {
        log::info!("add model: PTLens geometric correction");
        let mut model = PtLensModel::new(frame);
        if params.len() == 4 {
            model.set_params(params[0], params[1], params[2], params[3]);
        } else {
            model.set_params_auto_d(params[0], params[1], params[2]);
        }
        model.set_centre_shift(x0, y0);
        transform.geom_queue_mut().add_model(GeomModel::PtLens(model));
    }

    if let Some(geometry) = &settings.geometry {
        log::info!(
            "add model: geometry conversion {:?} -> {:?}",
            geometry.src_geom,
            geometry.dst_geom
        );
        let src = Projection::new(geometry.src_geom, geometry.src_focal)?;
        let dst = Projection::new(geometry.dst_geom, geometry.dst_focal)?;
        let mut model =
            GeometryConvertModel::new(image_aspect, settings.image_crop, src, dst)?;
        model.set_centre_shift(x0, y0);
        transform
            .geom_queue_mut()
            .add_model(GeomModel::GeometryConvert(model));
    }

    if let Some(scale) = settings.scale {
        log::info!("add model: linear scaling factor {scale}");
        let mut model = ScalerModel::new();
        model.set_param(scale)?;
        transform.geom_queue_mut().add_model(GeomModel::Scaler(model));
    }

    if let Some(params) = &settings.vignetting {
        log::info!("add model: vignetting correction");
        let mut model = HuginVignettingModel::new(frame);
        model.set_params(params[0], params[1], params[2]);
        model.set_centre_shift(x0, y0);
        transform
            .colour_queue_mut()
            .add_model(ColourModel::HuginVignetting(model));
    }

    Ok(())
}

/// Run the auto-scaler and install the crop-fit factor at the queue head
fn autoscale<L: PixelLayout, I: Interpolator>(
    transform: &mut ImageTransform<'_, L, I>,
    precision: usize,
) -> Result<()> {
    let scaler = AutoScaler::new(transform.geom_queue(), transform.aspect_ratio());
    let result = match L::NUM_CHANNELS {
        3 => scaler.find_scale::<3>(precision)?,
        4 => scaler.find_scale::<4>(precision)?,
        _ => unreachable!("layouts carry 3 or 4 channels"),
    };

    if result.found {
        log::info!("auto-scale factor: {:.6}", result.scale);
        // the candidate scale acts on the destination coordinate before
        // the queue, so its scaler runs first and divides by 1/s
        let mut model = ScalerModel::new();
        model.set_param(1.0 / result.scale)?;
        transform
            .geom_queue_mut()
            .push_front_model(GeomModel::Scaler(model));
    } else {
        log::warn!(
            "auto-scaler did not converge (best effort {:.6}); scale left unchanged",
            result.scale
        );
    }

    Ok(())
}
