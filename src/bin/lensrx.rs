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

//! lensrx CLI entry point
//!
//! Decodes the input image into a typed buffer, assembles a
//! [`Settings`] record from the command line (optionally on top of a
//! TOML correction profile), runs the correction pipeline and encodes
//! the result.
//!
//! Multi-value options use `:`-separated lists, e.g.
//! `--ptlens 0:0.019:-0.066` or `--sub-rect 100:50:800:600`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};

use lensrx::core::image::ImageBuffer;
use lensrx::core::interp::Interpolation;
use lensrx::core::mem::{Rgb16Inter, Rgb8Inter, Rgba16Inter, Rgba8Inter};
use lensrx::core::model::LensGeometry;
use lensrx::core::pipeline;
use lensrx::core::settings::{GainFuncKind, GeometrySettings, Settings, SubRect, TcaParams};
use lensrx::{EngineError, Result};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InterpArg {
    Nn,
    Bilin,
    Lanczos,
}

impl From<InterpArg> for Interpolation {
    fn from(arg: InterpArg) -> Self {
        match arg {
            InterpArg::Nn => Interpolation::Nearest,
            InterpArg::Bilin => Interpolation::Bilinear,
            InterpArg::Lanczos => Interpolation::Lanczos,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GainFuncArg {
    Srgb,
    Gamma,
    Emor,
    Invemor,
}

impl From<GainFuncArg> for GainFuncKind {
    fn from(arg: GainFuncArg) -> Self {
        match arg {
            GainFuncArg::Srgb => GainFuncKind::Srgb,
            GainFuncArg::Gamma => GainFuncKind::Gamma,
            GainFuncArg::Emor => GainFuncKind::Emor,
            GainFuncArg::Invemor => GainFuncKind::InvEmor,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeomArg {
    Rect,
    FishEquidist,
    FishEquisolid,
    FishStereo,
    FishOrtho,
}

impl From<GeomArg> for LensGeometry {
    fn from(arg: GeomArg) -> Self {
        match arg {
            GeomArg::Rect => LensGeometry::Rectilinear,
            GeomArg::FishEquidist => LensGeometry::FisheyeEquidist,
            GeomArg::FishEquisolid => LensGeometry::FisheyeEquisolid,
            GeomArg::FishStereo => LensGeometry::FisheyeStereo,
            GeomArg::FishOrtho => LensGeometry::FisheyeOrtho,
        }
    }
}

/// Offline lens correction for digital camera images
#[derive(Debug, Parser)]
#[command(name = "lensrx", version, about)]
struct Cli {
    /// Input image file
    input: PathBuf,

    /// Output image file
    output: PathBuf,

    /// Verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// TOML correction profile to start from (flags override it)
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// PTLens distortion coefficients
    #[arg(long, value_name = "a:b:c[:d]")]
    ptlens: Option<String>,

    /// PTLens TCA coefficients for the red channel
    #[arg(long = "ptlens-r", value_name = "a:b:c:d")]
    ptlens_r: Option<String>,

    /// PTLens TCA coefficients for the blue channel
    #[arg(long = "ptlens-b", value_name = "a:b:c:d")]
    ptlens_b: Option<String>,

    /// Linear TCA scaling factors
    #[arg(long, value_name = "kr:kb")]
    tca: Option<String>,

    /// Vignetting coefficients (Hugin convention)
    #[arg(long, value_name = "a:b:c")]
    vignetting: Option<String>,

    /// Centre shift in pixels
    #[arg(long = "centre-shift", value_name = "x0:y0")]
    centre_shift: Option<String>,

    /// Aspect ratio used for parameter calibration
    #[arg(long = "param-aspect", value_name = "ASPECT")]
    param_aspect: Option<f64>,

    /// Crop factor used for parameter calibration
    #[arg(long = "param-crop", value_name = "CROP")]
    param_crop: Option<f64>,

    /// Crop factor of the input image
    #[arg(long = "image-crop", value_name = "CROP")]
    image_crop: Option<f64>,

    /// Linear scaling factor
    #[arg(long, value_name = "FACTOR")]
    scale: Option<f64>,

    /// Restrict the output to a sub-rectangle of the source frame
    #[arg(long = "sub-rect", value_name = "x0:y0:w:h")]
    sub_rect: Option<String>,

    /// Gain (transfer) function
    #[arg(long = "gain-func", value_enum, value_name = "FUNC")]
    gain_func: Option<GainFuncArg>,

    /// Exponent for the generic gamma gain function
    #[arg(long, value_name = "GAMMA")]
    gamma: Option<f64>,

    /// EMOR basis coefficients
    #[arg(long = "emor-params", value_name = "h1:h2:...")]
    emor_params: Option<String>,

    /// Skip the gain function entirely (faster, photometrically wrong)
    #[arg(long = "no-gamma")]
    no_gamma: bool,

    /// Segment count of the gain lookup tables
    #[arg(long = "gamma-lut-size", value_name = "N")]
    gamma_lut_size: Option<usize>,

    /// Reconstruction kernel
    #[arg(long, value_enum, value_name = "KERNEL")]
    interpolation: Option<InterpArg>,

    /// Kernel support for Lanczos interpolation
    #[arg(long = "lanczos-supp", value_name = "N")]
    lanczos_supp: Option<usize>,

    /// Oversampling grid size (O x O sub-samples per pixel)
    #[arg(long, value_name = "O")]
    oversample: Option<u32>,

    /// Source lens projection (enables geometry conversion)
    #[arg(long = "src-geom", value_enum, value_name = "GEOM")]
    src_geom: Option<GeomArg>,

    /// Destination lens projection (enables geometry conversion)
    #[arg(long = "dst-geom", value_enum, value_name = "GEOM")]
    dst_geom: Option<GeomArg>,

    /// Focal lengths for geometry conversion, in millimetres
    #[arg(long = "focal-lengths", value_name = "src:dst")]
    focal_lengths: Option<String>,

    /// Fit the corrected frame with the auto-scaler
    #[arg(
        long,
        value_name = "PRECISION",
        num_args = 0..=1,
        default_missing_value = "128"
    )]
    autoscale: Option<usize>,

    /// Worker threads (0 = all cores)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(filter)
        .init();

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = build_settings(cli)?;
    settings.validate()?;

    log::info!("loading {}", cli.input.display());
    let loaded = load_image(&cli.input)?;

    let started = Instant::now();
    let corrected = match loaded {
        LoadedImage::Rgb8(buffer) => LoadedImage::Rgb8(pipeline::run(&settings, &buffer)?),
        LoadedImage::Rgba8(buffer) => LoadedImage::Rgba8(pipeline::run(&settings, &buffer)?),
        LoadedImage::Rgb16(buffer) => LoadedImage::Rgb16(pipeline::run(&settings, &buffer)?),
        LoadedImage::Rgba16(buffer) => LoadedImage::Rgba16(pipeline::run(&settings, &buffer)?),
    };
    log::info!("transform finished in {:.2?}", started.elapsed());

    log::info!("saving {}", cli.output.display());
    save_image(corrected, &cli.output)
}

/// Merge the CLI flags over a profile (or the defaults)
fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.profile {
        Some(path) => {
            log::info!("loading correction profile {}", path.display());
            Settings::load_profile(path)?
        }
        None => Settings::default(),
    };

    settings.verbose |= cli.verbose;
    settings.no_gamma |= cli.no_gamma;

    if let Some(spec) = &cli.ptlens {
        settings.ptlens = Some(parse_list(spec, "ptlens", 3, 4)?);
    }
    if let Some(spec) = &cli.ptlens_r {
        settings.ptlens_r = Some(parse_list(spec, "ptlens-r", 4, 4)?);
    }
    if let Some(spec) = &cli.ptlens_b {
        settings.ptlens_b = Some(parse_list(spec, "ptlens-b", 4, 4)?);
    }
    if let Some(spec) = &cli.tca {
        let vals = parse_list(spec, "tca", 2, 2)?;
        settings.tca = Some(TcaParams {
            kr: vals[0],
            kb: vals[1],
        });
    }
    if let Some(spec) = &cli.vignetting {
        settings.vignetting = Some(parse_list(spec, "vignetting", 3, 3)?);
    }
    if let Some(spec) = &cli.centre_shift {
        let vals = parse_list(spec, "centre-shift", 2, 2)?;
        settings.centre_shift = Some([vals[0], vals[1]]);
    }
    if let Some(spec) = &cli.sub_rect {
        let vals = parse_list(spec, "sub-rect", 4, 4)?;
        settings.sub_rect = Some(SubRect {
            x0: vals[0] as usize,
            y0: vals[1] as usize,
            w: vals[2] as usize,
            h: vals[3] as usize,
        });
    }
    if let Some(spec) = &cli.emor_params {
        settings.emor_params =
            parse_list(spec, "emor-params", 1, lensrx::core::gamma::EMOR_COEFF_NUM)?;
    }

    if let Some(aspect) = cli.param_aspect {
        settings.param_aspect = Some(aspect);
    }
    if let Some(crop) = cli.param_crop {
        settings.param_crop = crop;
    }
    if let Some(crop) = cli.image_crop {
        settings.image_crop = crop;
    }
    if let Some(scale) = cli.scale {
        settings.scale = Some(scale);
    }
    if let Some(gain_func) = cli.gain_func {
        settings.gain_func = gain_func.into();
    }
    if let Some(gamma) = cli.gamma {
        settings.gamma = gamma;
        // a bare --gamma implies the generic gamma function
        if cli.gain_func.is_none() {
            settings.gain_func = GainFuncKind::Gamma;
        }
    }
    if let Some(size) = cli.gamma_lut_size {
        settings.gamma_lut_size = size;
    }
    if let Some(interpolation) = cli.interpolation {
        settings.interpolation = interpolation.into();
    }
    if let Some(support) = cli.lanczos_supp {
        settings.lanczos_support = support;
    }
    if let Some(oversample) = cli.oversample {
        settings.oversample = oversample;
    }
    if let Some(precision) = cli.autoscale {
        settings.autoscale = Some(precision);
    }
    if let Some(threads) = cli.threads {
        settings.threads = threads;
    }

    match (cli.src_geom, cli.dst_geom) {
        (Some(src), Some(dst)) => {
            let (src_focal, dst_focal) = match &cli.focal_lengths {
                Some(spec) => {
                    let vals = parse_list(spec, "focal-lengths", 2, 2)?;
                    (vals[0], vals[1])
                }
                None => (10.0, 10.0),
            };
            settings.geometry = Some(GeometrySettings {
                src_geom: src.into(),
                dst_geom: dst.into(),
                src_focal,
                dst_focal,
            });
        }
        (None, None) => {}
        _ => {
            return Err(EngineError::config(
                "geometry conversion needs both --src-geom and --dst-geom",
            ));
        }
    }

    Ok(settings)
}

/// Parse a `:`-separated (or `;`-separated) list of numbers
fn parse_list(spec: &str, name: &str, min: usize, max: usize) -> Result<Vec<f64>> {
    let values: std::result::Result<Vec<f64>, _> = spec
        .split([':', ';'])
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>)
        .collect();

    let values =
        values.map_err(|e| EngineError::config(format!("--{name} {spec:?}: {e}")))?;

    if values.len() < min || values.len() > max {
        return Err(EngineError::config(format!(
            "--{name} takes {min}..{max} values, got {}",
            values.len()
        )));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_separators() {
        assert_eq!(parse_list("1:2:3", "x", 3, 3).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_list("1;2;3", "x", 3, 3).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(parse_list("1:2", "x", 3, 3).is_err());
        assert!(parse_list("1:two:3", "x", 3, 3).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "lensrx",
            "in.png",
            "out.png",
            "--ptlens",
            "0:0.019:-0.066",
            "--tca",
            "1.001:0.999",
            "--interpolation",
            "lanczos",
            "--lanczos-supp",
            "3",
            "--autoscale",
        ]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.ptlens, Some(vec![0.0, 0.019, -0.066]));
        assert_eq!(settings.tca.map(|t| (t.kr, t.kb)), Some((1.001, 0.999)));
        assert_eq!(settings.interpolation, Interpolation::Lanczos);
        assert_eq!(settings.lanczos_support, 3);
        assert_eq!(settings.autoscale, Some(128));
        settings.validate().unwrap();
    }

    #[test]
    fn test_bare_gamma_selects_generic_gamma() {
        let cli = Cli::parse_from(["lensrx", "in.png", "out.png", "--gamma", "1.8"]);
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.gain_func, GainFuncKind::Gamma);
        assert_eq!(settings.gamma, 1.8);
    }

    #[test]
    fn test_geometry_needs_both_projections() {
        let cli = Cli::parse_from(["lensrx", "in.png", "out.png", "--src-geom", "fish-equidist"]);
        assert!(build_settings(&cli).is_err());
    }
}

/// A decoded raster in one of the codec-supported storage layouts
enum LoadedImage {
    Rgb8(ImageBuffer<Rgb8Inter>),
    Rgba8(ImageBuffer<Rgba8Inter>),
    Rgb16(ImageBuffer<Rgb16Inter>),
    Rgba16(ImageBuffer<Rgba16Inter>),
}

/// Decode an image file into a typed buffer
///
/// 8-bit and 16-bit RGB/RGBA inputs keep their depth and alpha;
/// anything else (greyscale, 32-bit float) is converted to 8-bit RGB.
fn load_image(path: &Path) -> Result<LoadedImage> {
    let decoded = image::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
    let (w, h) = (decoded.width() as usize, decoded.height() as usize);

    let loaded = match decoded {
        image::DynamicImage::ImageRgb8(img) => {
            LoadedImage::Rgb8(ImageBuffer::from_vec(w, h, img.into_raw())?)
        }
        image::DynamicImage::ImageRgba8(img) => {
            LoadedImage::Rgba8(ImageBuffer::from_vec(w, h, img.into_raw())?)
        }
        image::DynamicImage::ImageRgb16(img) => {
            LoadedImage::Rgb16(ImageBuffer::from_vec(w, h, img.into_raw())?)
        }
        image::DynamicImage::ImageRgba16(img) => {
            LoadedImage::Rgba16(ImageBuffer::from_vec(w, h, img.into_raw())?)
        }
        other => {
            log::debug!("converting input to 8-bit RGB");
            let img = other.to_rgb8();
            LoadedImage::Rgb8(ImageBuffer::from_vec(w, h, img.into_raw())?)
        }
    };

    Ok(loaded)
}

/// Encode a typed buffer to an image file (format from the extension)
fn save_image(img: LoadedImage, path: &Path) -> Result<()> {
    let encode_err = |e: image::ImageError| EngineError::Encode(e.to_string());

    match img {
        LoadedImage::Rgb8(buffer) => {
            let (w, h) = (buffer.width() as u32, buffer.height() as u32);
            image::RgbImage::from_raw(w, h, buffer.into_vec())
                .expect("buffer dimensions match sample count")
                .save(path)
                .map_err(encode_err)
        }
        LoadedImage::Rgba8(buffer) => {
            let (w, h) = (buffer.width() as u32, buffer.height() as u32);
            image::RgbaImage::from_raw(w, h, buffer.into_vec())
                .expect("buffer dimensions match sample count")
                .save(path)
                .map_err(encode_err)
        }
        LoadedImage::Rgb16(buffer) => {
            let (w, h) = (buffer.width() as u32, buffer.height() as u32);
            let img = image::ImageBuffer::<image::Rgb<u16>, _>::from_raw(w, h, buffer.into_vec())
                .expect("buffer dimensions match sample count");
            image::DynamicImage::ImageRgb16(img).save(path).map_err(encode_err)
        }
        LoadedImage::Rgba16(buffer) => {
            let (w, h) = (buffer.width() as u32, buffer.height() as u32);
            let img = image::ImageBuffer::<image::Rgba<u16>, _>::from_raw(w, h, buffer.into_vec())
                .expect("buffer dimensions match sample count");
            image::DynamicImage::ImageRgba16(img).save(path).map_err(encode_err)
        }
    }
}
