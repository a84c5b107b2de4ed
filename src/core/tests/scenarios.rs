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

//! End-to-end transform scenarios

use crate::core::image::ImageBuffer;
use crate::core::interp::{BilinearInterpolator, NearestInterpolator};
use crate::core::mem::{Channel, PixelLayout, Rgb16Inter, Rgb8Inter, Rgba8Inter};
use crate::core::model::{ColourModel, GeomModel, PtLensModel, ScalerModel, VignettingModel};
use crate::core::transform::ImageTransform;

fn fill<L, F>(buffer: &mut ImageBuffer<L>, mut f: F)
where
    L: PixelLayout,
    F: FnMut(usize, usize, Channel) -> L::Sample,
{
    let width = buffer.width();
    let height = buffer.height();
    let mut view = buffer.view_w();
    for y in 0..height {
        for x in 0..width {
            for lane in 0..L::NUM_CHANNELS {
                let chan = Channel::of_lane(lane);
                view.write_px_val(chan, x, y, f(x, y, chan));
            }
        }
    }
}

#[test]
fn test_identity_transform_is_bit_exact() {
    let mut input = ImageBuffer::<Rgb8Inter>::new(4, 4).unwrap();
    fill(&mut input, |x, y, chan| match chan {
        Channel::Red => (x * 16) as u8,
        Channel::Green => (y * 16) as u8,
        _ => ((x + y) * 8) as u8,
    });

    let mut output = ImageBuffer::<Rgb8Inter>::new(4, 4).unwrap();
    {
        let interp = NearestInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);
        transform.do_transform();
    }

    assert_eq!(input.data(), output.data());
}

#[test]
fn test_identity_transform_rgba_is_bit_exact() {
    let mut input = ImageBuffer::<Rgba8Inter>::new(5, 7).unwrap();
    fill(&mut input, |x, y, chan| {
        (x * 31 + y * 17 + chan.lane() * 53) as u8
    });

    let mut output = ImageBuffer::<Rgba8Inter>::new(5, 7).unwrap();
    {
        let interp = NearestInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);
        transform.do_transform();
    }

    assert_eq!(input.data(), output.data());
}

#[test]
fn test_ptlens_identity_coefficients_roundtrip() {
    let mut input = ImageBuffer::<Rgb16Inter>::new(100, 100).unwrap();
    let mut state = 0xACE1u32;
    fill(&mut input, |_, _, _| {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        (state >> 16) as u16
    });

    let mut output = ImageBuffer::<Rgb16Inter>::new(100, 100).unwrap();
    {
        let interp = BilinearInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);

        let mut model = PtLensModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, 0.0, 1.0);
        transform.geom_queue_mut().add_model(GeomModel::PtLens(model));

        transform.do_transform();
    }

    let in_view = input.view_r();
    let out_view = output.view_r();
    for y in 0..100 {
        for x in 0..100 {
            for lane in 0..3 {
                let chan = Channel::of_lane(lane);
                let a = in_view.px_val(chan, x, y) as i64;
                let b = out_view.px_val(chan, x, y) as i64;
                assert!((a - b).abs() <= 1, "({x},{y}) lane {lane}: {a} vs {b}");
            }
        }
    }
}

#[test]
fn test_centre_shift_cancels_at_unit_scale() {
    let mut input = ImageBuffer::<Rgb8Inter>::new(12, 9).unwrap();
    fill(&mut input, |x, y, chan| {
        (x * 13 + y * 29 + chan.lane() * 7) as u8
    });

    let mut output = ImageBuffer::<Rgb8Inter>::new(12, 9).unwrap();
    {
        let interp = NearestInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);

        // ((x - x0) / k + x0) with k = 1 cancels exactly
        let mut model = ScalerModel::new();
        model.set_param(1.0).unwrap();
        model.set_centre_shift(0.25, 0.0);
        transform.geom_queue_mut().add_model(GeomModel::Scaler(model));

        transform.do_transform();
    }

    assert_eq!(input.data(), output.data());
}

#[test]
fn test_linear_tca_shifts_channels_relative_to_green() {
    // all channels share one bright region left of sample column 90; the
    // per-channel scaler magnifies red and shrinks blue, so the red edge
    // lands further out than green and the blue edge closer in
    const W: usize = 100;
    const H: usize = 50;
    const EDGE: usize = 90;

    let mut input = ImageBuffer::<Rgb8Inter>::new(W, H).unwrap();
    fill(&mut input, |x, _, _| if x < EDGE { 255 } else { 0 });

    let mut output = ImageBuffer::<Rgb8Inter>::new(W, H).unwrap();
    {
        let interp = BilinearInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);

        let mut model = ScalerModel::new();
        model.set_param_single(0, 1.05).unwrap();
        model.set_param_single(2, 0.95).unwrap();
        transform.geom_queue_mut().add_model(GeomModel::Scaler(model));

        transform.do_transform();
    }

    let extent = |chan: Channel| -> usize {
        let view = output.view_r();
        (0..W)
            .filter(|&x| view.px_val(chan, x, H / 2) >= 128)
            .count()
    };

    let red = extent(Channel::Red);
    let green = extent(Channel::Green);
    let blue = extent(Channel::Blue);

    assert_eq!(green, EDGE, "green must be unchanged");
    assert!(red > green, "red edge must move outward (red {red}, green {green})");
    assert!(blue < green, "blue edge must move inward (blue {blue}, green {green})");

    // green passes through untouched
    let in_view = input.view_r();
    let out_view = output.view_r();
    for x in 0..W {
        let a = in_view.px_val(Channel::Green, x, H / 2) as i16;
        let b = out_view.px_val(Channel::Green, x, H / 2) as i16;
        assert!((a - b).abs() <= 1);
    }
}

#[test]
fn test_vignetting_compensation_ratio() {
    // uniform mid-grey input; compensation must brighten the corners by
    // exactly the inverse falloff
    const GREY: u16 = 24576;
    let mut input = ImageBuffer::<Rgb16Inter>::new(64, 64).unwrap();
    fill(&mut input, |_, _, _| GREY);

    let mut output = ImageBuffer::<Rgb16Inter>::new(64, 64).unwrap();
    {
        let interp = BilinearInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);

        let mut model = VignettingModel::with_input_aspect(1.0);
        model.set_params(0.0, 0.0, -0.3);
        transform
            .colour_queue_mut()
            .add_model(ColourModel::Vignetting(model));

        transform.do_transform();
    }

    let view = output.view_r();
    let corner = view.px_val(Channel::Green, 0, 0) as f64;
    let centre = view.px_val(Channel::Green, 32, 32) as f64;

    assert!(corner > centre, "corners must come out brighter");

    // corner pixel (0, 0) sits at r^2 = 2 in normalised coordinates
    let expected = 1.0 / (1.0 - 0.3 * 2.0);
    let ratio = corner / centre;
    assert!(
        (ratio - expected).abs() / expected < 0.005,
        "ratio {ratio} vs expected {expected}"
    );
}

#[test]
fn test_oversampling_keeps_flat_field() {
    let mut input = ImageBuffer::<Rgb8Inter>::new(10, 10).unwrap();
    fill(&mut input, |_, _, _| 99);

    let mut output = ImageBuffer::<Rgb8Inter>::new(10, 10).unwrap();
    {
        let interp = BilinearInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);
        transform.set_oversampling(3).unwrap();
        transform.do_transform();
    }

    assert!(output.data().iter().all(|&v| v == 99));
}

#[test]
fn test_roi_limits_the_written_region() {
    let mut input = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
    fill(&mut input, |x, y, _| (x * 10 + y) as u8);

    let mut output = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
    fill(&mut output, |_, _, _| 200);

    {
        let interp = NearestInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);
        transform.writer_mut().set_roi(2, 3, 6, 7).unwrap();
        transform.do_transform();
    }

    let in_view = input.view_r();
    let out_view = output.view_r();
    for y in 0..8 {
        for x in 0..8 {
            let inside = (2..6).contains(&x) && (3..7).contains(&y);
            let expected = if inside {
                in_view.px_val(Channel::Red, x, y)
            } else {
                200
            };
            assert_eq!(out_view.px_val(Channel::Red, x, y), expected, "({x},{y})");
        }
    }
}

#[test]
fn test_out_of_frame_samples_use_null_value() {
    let mut input = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
    fill(&mut input, |_, _, _| 250);

    let mut output = ImageBuffer::<Rgb8Inter>::new(8, 8).unwrap();
    {
        let interp = BilinearInterpolator::new(input.view_r());
        let mut transform = ImageTransform::new(interp, output.view_w()).unwrap();
        transform.enable_gamma(false);

        // zoom out far enough that the frame corners sample outside the
        // source image
        let mut model = ScalerModel::new();
        model.set_param(0.25).unwrap();
        transform.geom_queue_mut().add_model(GeomModel::Scaler(model));

        transform.do_transform();
    }

    let view = output.view_r();
    // the corner now looks at 4x the frame radius: background
    assert_eq!(view.px_val(Channel::Red, 0, 0), 0);
    // the centre still sees the image
    assert_eq!(view.px_val(Channel::Red, 4, 4), 250);
}
