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

//! Lens projection geometries
//!
//! A projection maps the angle `theta` between a light ray and the
//! optical axis to a radial distance `r` on the sensor, parameterised by
//! the focal length `f` (both in millimetres):
//!
//! | Geometry | Forward map |
//! |---|---|
//! | rectilinear | `r = f * tan(theta)` |
//! | equidistant fisheye | `r = f * theta` |
//! | equisolid fisheye | `r = 2 f * sin(theta / 2)` |
//! | stereographic fisheye | `r = 2 f * tan(theta / 2)` |
//! | orthographic fisheye | `r = f * sin(theta)` |
//!
//! Geometry conversion composes one projection's inverse with another's
//! forward map. A ray that is not representable in a projection (for
//! example `theta >= 90°` through a rectilinear lens) has no cartesian
//! image; such conversions report `None` and the caller substitutes an
//! out-of-frame sentinel.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// The supported lens projection geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LensGeometry {
    /// Rectilinear (gnomonic) projection of an ordinary lens
    Rectilinear,
    /// Equidistant fisheye (`r` proportional to angle)
    #[serde(alias = "fish-equidist")]
    FisheyeEquidist,
    /// Equisolid-angle fisheye (area preserving)
    #[serde(alias = "fish-equisolid")]
    FisheyeEquisolid,
    /// Stereographic fisheye (conformal)
    #[serde(alias = "fish-stereo")]
    FisheyeStereo,
    /// Orthographic fisheye (hemispheric)
    #[serde(alias = "fish-ortho")]
    FisheyeOrtho,
}

/// A lens projection with a concrete focal length
///
/// # Examples
///
/// ```
/// use lensrx::core::model::{LensGeometry, Projection};
///
/// let fisheye = Projection::new(LensGeometry::FisheyeEquidist, 8.0).unwrap();
/// let (phi, theta) = fisheye.to_spherical(4.0, 0.0).unwrap();
/// assert!((theta - 0.5).abs() < 1e-12);
/// assert_eq!(phi, 0.0);
///
/// let (x, y) = fisheye.to_cartesian(phi, theta).unwrap();
/// assert!((x - 4.0).abs() < 1e-12);
/// assert!(y.abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    geometry: LensGeometry,
    focal_length: f64,
}

impl Projection {
    /// Create a projection
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a non-positive focal
    /// length.
    pub fn new(geometry: LensGeometry, focal_length: f64) -> Result<Self> {
        if !(focal_length > 0.0) {
            return Err(EngineError::config(format!(
                "focal length must be positive, got {focal_length}"
            )));
        }
        Ok(Projection {
            geometry,
            focal_length,
        })
    }

    /// The projection geometry
    #[inline]
    pub fn geometry(&self) -> LensGeometry {
        self.geometry
    }

    /// The focal length in millimetres
    #[inline]
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Change the focal length
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a non-positive value.
    pub fn set_focal_length(&mut self, focal_length: f64) -> Result<()> {
        if !(focal_length > 0.0) {
            return Err(EngineError::config(format!(
                "focal length must be positive, got {focal_length}"
            )));
        }
        self.focal_length = focal_length;
        Ok(())
    }

    /// Invert the projection: sensor position (mm) to spherical `(phi, theta)`
    ///
    /// `phi` is the azimuth around the optical axis, `theta` the angle
    /// against it. Returns `None` when the radial distance lies outside
    /// the projection's image circle.
    pub fn to_spherical(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let r = (x * x + y * y).sqrt();
        let phi = if r > 0.0 { y.atan2(x) } else { 0.0 };
        let f = self.focal_length;

        let theta = match self.geometry {
            LensGeometry::Rectilinear => (r / f).atan(),
            LensGeometry::FisheyeEquidist => {
                let theta = r / f;
                if theta > std::f64::consts::PI {
                    return None;
                }
                theta
            }
            LensGeometry::FisheyeEquisolid => {
                let s = r / (2.0 * f);
                if s > 1.0 {
                    return None;
                }
                2.0 * s.asin()
            }
            LensGeometry::FisheyeStereo => 2.0 * (r / (2.0 * f)).atan(),
            LensGeometry::FisheyeOrtho => {
                let s = r / f;
                if s > 1.0 {
                    return None;
                }
                s.asin()
            }
        };

        Some((phi, theta))
    }

    /// Apply the projection: spherical `(phi, theta)` to sensor position (mm)
    ///
    /// Returns `None` when the ray cannot form an image through this
    /// projection (behind the lens for rectilinear, beyond the hemisphere
    /// for orthographic).
    pub fn to_cartesian(&self, phi: f64, theta: f64) -> Option<(f64, f64)> {
        let f = self.focal_length;

        let r = match self.geometry {
            LensGeometry::Rectilinear => {
                if theta >= std::f64::consts::FRAC_PI_2 {
                    return None;
                }
                f * theta.tan()
            }
            LensGeometry::FisheyeEquidist => f * theta,
            LensGeometry::FisheyeEquisolid => 2.0 * f * (theta / 2.0).sin(),
            LensGeometry::FisheyeStereo => {
                if theta >= std::f64::consts::PI {
                    return None;
                }
                2.0 * f * (theta / 2.0).tan()
            }
            LensGeometry::FisheyeOrtho => {
                if theta > std::f64::consts::FRAC_PI_2 {
                    return None;
                }
                f * theta.sin()
            }
        };

        Some((r * phi.cos(), r * phi.sin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOMETRIES: [LensGeometry; 5] = [
        LensGeometry::Rectilinear,
        LensGeometry::FisheyeEquidist,
        LensGeometry::FisheyeEquisolid,
        LensGeometry::FisheyeStereo,
        LensGeometry::FisheyeOrtho,
    ];

    #[test]
    fn test_spherical_cartesian_roundtrip() {
        for geometry in GEOMETRIES {
            let proj = Projection::new(geometry, 12.0).unwrap();
            for &(x, y) in &[(3.0, 1.0), (-2.5, 4.0), (0.5, -0.5)] {
                let (phi, theta) = proj.to_spherical(x, y).unwrap();
                let (x2, y2) = proj.to_cartesian(phi, theta).unwrap();
                assert!(
                    (x - x2).abs() < 1e-9 && (y - y2).abs() < 1e-9,
                    "{geometry:?}: ({x}, {y}) -> ({x2}, {y2})"
                );
            }
        }
    }

    #[test]
    fn test_optical_axis_maps_to_origin() {
        for geometry in GEOMETRIES {
            let proj = Projection::new(geometry, 8.0).unwrap();
            let (phi, theta) = proj.to_spherical(0.0, 0.0).unwrap();
            assert_eq!(theta, 0.0);
            let (x, y) = proj.to_cartesian(phi, theta).unwrap();
            assert_eq!((x, y), (0.0, 0.0));
        }
    }

    #[test]
    fn test_rectilinear_rejects_half_sphere() {
        let proj = Projection::new(LensGeometry::Rectilinear, 10.0).unwrap();
        assert!(proj.to_cartesian(0.0, 1.6).is_none());
    }

    #[test]
    fn test_ortho_image_circle() {
        let proj = Projection::new(LensGeometry::FisheyeOrtho, 10.0).unwrap();
        // radius beyond f lies outside the image circle
        assert!(proj.to_spherical(10.5, 0.0).is_none());
        assert!(proj.to_spherical(9.5, 0.0).is_some());
    }

    #[test]
    fn test_wide_ray_through_fisheyes() {
        // a ray at 120 degrees images through an equidistant fisheye but
        // not through a rectilinear lens
        let fish = Projection::new(LensGeometry::FisheyeEquidist, 8.0).unwrap();
        let rect = Projection::new(LensGeometry::Rectilinear, 8.0).unwrap();
        let theta = 2.0 * std::f64::consts::FRAC_PI_3;
        assert!(fish.to_cartesian(0.3, theta).is_some());
        assert!(rect.to_cartesian(0.3, theta).is_none());
    }

    #[test]
    fn test_rejects_bad_focal_length() {
        assert!(Projection::new(LensGeometry::Rectilinear, 0.0).is_err());
        assert!(Projection::new(LensGeometry::Rectilinear, -1.0).is_err());
    }
}
