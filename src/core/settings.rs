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

//! The correction settings record
//!
//! [`Settings`] is the options record the engine consumes: which
//! correction models to queue with which parameters, the interpolation
//! and gain-function choices, and the execution knobs. The CLI populates
//! it from flags; a whole record can also be stored as a TOML correction
//! profile and loaded back.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::interp::Interpolation;
use crate::core::model::LensGeometry;

/// Selects the gain (transfer) function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainFuncKind {
    /// sRGB piecewise companding
    Srgb,
    /// Generic power-law gamma
    Gamma,
    /// Empirical Model of Response
    Emor,
    /// Inverse Empirical Model of Response
    InvEmor,
}

/// Linear TCA correction factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TcaParams {
    /// Red channel scaling
    pub kr: f64,
    /// Blue channel scaling
    pub kb: f64,
}

/// A destination sub-rectangle of the source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRect {
    /// Left edge in pixels
    pub x0: usize,
    /// Top edge in pixels
    pub y0: usize,
    /// Width in pixels
    pub w: usize,
    /// Height in pixels
    pub h: usize,
}

/// Lens geometry conversion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometrySettings {
    /// Projection the photograph was taken through
    pub src_geom: LensGeometry,
    /// Projection the output should obey
    pub dst_geom: LensGeometry,
    /// Source focal length in millimetres
    pub src_focal: f64,
    /// Destination focal length in millimetres
    pub dst_focal: f64,
}

/// The options record consumed by [`pipeline::run`](crate::core::pipeline::run)
///
/// Every field has a neutral default, so a default record is an identity
/// pass (up to resampling).
///
/// # Examples
///
/// ```
/// use lensrx::core::settings::Settings;
///
/// let toml = r#"
///     ptlens = [0.0, 0.019, -0.066]
///     vignetting = [0.0, 0.0, -0.3]
///     oversample = 2
///     interpolation = "lanczos"
/// "#;
/// let settings = Settings::from_toml_str(toml).unwrap();
/// assert_eq!(settings.oversample, 2);
/// settings.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose logging
    pub verbose: bool,

    /// PTLens distortion coefficients `a, b, c[, d]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptlens: Option<Vec<f64>>,
    /// PTLens TCA coefficients for the red channel: `a, b, c, d`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptlens_r: Option<Vec<f64>>,
    /// PTLens TCA coefficients for the blue channel: `a, b, c, d`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptlens_b: Option<Vec<f64>>,

    /// Linear TCA factors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tca: Option<TcaParams>,

    /// Linear scaling factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    /// Vignetting coefficients `a, b, c` (Hugin convention)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignetting: Option<Vec<f64>>,

    /// Centre shift in pixels, `[x0, y0]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centre_shift: Option<[f64; 2]>,

    /// Aspect ratio the model parameters were calibrated at
    ///
    /// When absent, the landscape orientation of the input aspect is
    /// assumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_aspect: Option<f64>,
    /// Crop factor the model parameters were calibrated at
    pub param_crop: f64,
    /// Crop factor of the input image
    pub image_crop: f64,

    /// Restrict the output to a sub-rectangle of the source frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_rect: Option<SubRect>,

    /// Gain function family
    pub gain_func: GainFuncKind,
    /// Exponent for [`GainFuncKind::Gamma`]
    pub gamma: f64,
    /// Basis coefficients for the EMOR gain functions
    pub emor_params: Vec<f64>,
    /// Skip the gain function entirely (speed over photometry)
    pub no_gamma: bool,
    /// Segment count of the gain LUTs
    pub gamma_lut_size: usize,

    /// Reconstruction kernel
    pub interpolation: Interpolation,
    /// Kernel support for [`Interpolation::Lanczos`]
    pub lanczos_support: usize,

    /// Oversampling grid size (`O x O` sub-samples per pixel)
    pub oversample: u32,

    /// Lens geometry conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometrySettings>,

    /// Run the auto-scaler at this boundary precision and install the
    /// found crop-fit factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<usize>,

    /// Worker threads for the row-parallel driver (0 = all cores)
    pub threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            ptlens: None,
            ptlens_r: None,
            ptlens_b: None,
            tca: None,
            scale: None,
            vignetting: None,
            centre_shift: None,
            param_aspect: None,
            param_crop: 1.0,
            image_crop: 1.0,
            sub_rect: None,
            gain_func: GainFuncKind::Srgb,
            gamma: 2.2,
            emor_params: Vec::new(),
            no_gamma: false,
            gamma_lut_size: 1024,
            interpolation: Interpolation::default(),
            lanczos_support: 2,
            oversample: 1,
            geometry: None,
            autoscale: None,
            threads: 0,
        }
    }
}

impl Settings {
    /// Parse a TOML correction profile
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] on malformed TOML.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| EngineError::config(format!("profile parse error: {e}")))
    }

    /// Load a TOML correction profile from a file
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read and
    /// [`EngineError::InvalidConfig`] on malformed TOML.
    pub fn load_profile(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Settings::from_toml_str(&contents)
    }

    /// Serialise the record as a TOML correction profile
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EngineError::config(format!("profile encode error: {e}")))
    }

    /// Check the record for malformed values
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(params) = &self.ptlens {
            if params.len() != 3 && params.len() != 4 {
                return Err(EngineError::config(format!(
                    "ptlens takes 3 or 4 coefficients, got {}",
                    params.len()
                )));
            }
        }
        for (name, params) in [("ptlens_r", &self.ptlens_r), ("ptlens_b", &self.ptlens_b)] {
            if let Some(params) = params {
                if params.len() != 4 {
                    return Err(EngineError::config(format!(
                        "{name} takes 4 coefficients, got {}",
                        params.len()
                    )));
                }
            }
        }
        if let Some(params) = &self.vignetting {
            if params.len() != 3 {
                return Err(EngineError::config(format!(
                    "vignetting takes 3 coefficients, got {}",
                    params.len()
                )));
            }
        }
        if let Some(tca) = &self.tca {
            if !(tca.kr > 0.0) || !(tca.kb > 0.0) {
                return Err(EngineError::config(format!(
                    "TCA factors must be positive, got kr = {}, kb = {}",
                    tca.kr, tca.kb
                )));
            }
        }
        if let Some(scale) = self.scale {
            if !(scale > 0.0) || !scale.is_finite() {
                return Err(EngineError::config(format!(
                    "scale must be positive and finite, got {scale}"
                )));
            }
        }
        if let Some(aspect) = self.param_aspect {
            if !(aspect > 0.0) {
                return Err(EngineError::config(format!(
                    "param_aspect must be positive, got {aspect}"
                )));
            }
        }
        if !(self.param_crop > 0.0) || !(self.image_crop > 0.0) {
            return Err(EngineError::config(format!(
                "crop factors must be positive, got param {} / image {}",
                self.param_crop, self.image_crop
            )));
        }
        if let Some(rect) = &self.sub_rect {
            if rect.w == 0 || rect.h == 0 {
                return Err(EngineError::config("sub-rect must have positive dimensions"));
            }
        }
        if self.gain_func == GainFuncKind::Gamma && !(self.gamma > 0.0) {
            return Err(EngineError::config(format!(
                "gamma exponent must be positive, got {}",
                self.gamma
            )));
        }
        if self.gamma_lut_size < 2 {
            return Err(EngineError::config(format!(
                "gamma_lut_size must be >= 2, got {}",
                self.gamma_lut_size
            )));
        }
        if self.lanczos_support == 0 {
            return Err(EngineError::config("lanczos_support must be >= 1"));
        }
        if self.oversample == 0 {
            return Err(EngineError::config("oversample must be >= 1"));
        }
        if let Some(geometry) = &self.geometry {
            if !(geometry.src_focal > 0.0) || !(geometry.dst_focal > 0.0) {
                return Err(EngineError::config(format!(
                    "focal lengths must be positive, got {} / {}",
                    geometry.src_focal, geometry.dst_focal
                )));
            }
        }
        if let Some(precision) = self.autoscale {
            if precision < 2 {
                return Err(EngineError::config(format!(
                    "autoscale precision must be >= 2, got {precision}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_validates() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut settings = Settings::default();
        settings.ptlens = Some(vec![0.0, 0.019, -0.066]);
        settings.vignetting = Some(vec![0.1, -0.2, -0.3]);
        settings.tca = Some(TcaParams { kr: 1.001, kb: 0.999 });
        settings.sub_rect = Some(SubRect { x0: 10, y0: 20, w: 640, h: 480 });
        settings.geometry = Some(GeometrySettings {
            src_geom: LensGeometry::FisheyeEquisolid,
            dst_geom: LensGeometry::Rectilinear,
            src_focal: 8.0,
            dst_focal: 12.0,
        });
        settings.autoscale = Some(128);

        let toml_str = settings.to_toml_string().unwrap();
        let parsed = Settings::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_coefficient_count_validation() {
        let mut settings = Settings::default();
        settings.ptlens = Some(vec![0.1, 0.2]);
        assert!(settings.validate().is_err());

        settings.ptlens = Some(vec![0.1, 0.2, 0.3]);
        assert!(settings.validate().is_ok());

        settings.ptlens_r = Some(vec![0.0, 0.0, 0.0]);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_execution_knob_validation() {
        let mut settings = Settings::default();
        settings.oversample = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.lanczos_support = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.autoscale = Some(1);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "ptlens = [0.0, 0.02, -0.05]\noversample = 3\n").unwrap();

        let settings = Settings::load_profile(&path).unwrap();
        assert_eq!(settings.oversample, 3);
        assert_eq!(settings.ptlens, Some(vec![0.0, 0.02, -0.05]));

        assert!(Settings::load_profile(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_interpolation_aliases() {
        let settings = Settings::from_toml_str("interpolation = \"nn\"").unwrap();
        assert_eq!(settings.interpolation, Interpolation::Nearest);
        let settings = Settings::from_toml_str("interpolation = \"bilin\"").unwrap();
        assert_eq!(settings.interpolation, Interpolation::Bilinear);
    }

    #[test]
    fn test_unknown_gain_func_rejected() {
        assert!(Settings::from_toml_str("gain_func = \"log\"").is_err());
    }
}
