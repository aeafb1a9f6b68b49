//! Reduction parameters
//!
//! A `LodConfig` is built once by the caller, validated, and then only ever borrowed
//! immutably by the pipeline.

use crate::{LodError, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How planar distances are measured when comparing against `rdp_epsilon_meters`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Projection {
    /// Raw (lon, lat) degrees, with the tolerance scaled by a flat 1/111 000 degrees per
    /// meter on both axes.
    ///
    /// This ignores the `cos(latitude)` shrink of longitude degrees, so away from the
    /// equator east-west deviations are measured too small and simplification is more
    /// aggressive than the nominal tolerance suggests.
    #[default]
    DegreeScale,
    /// Local equirectangular meters around the mean latitude of the track.
    ///
    /// Longitude is scaled by `cos(mean latitude)` before measuring, so the tolerance
    /// means roughly the same ground distance in every direction.
    Equirectangular,
}

/// Configuration for a single LOD reduction
///
/// Fields are public for easy construction, but [`LodConfig::validate`] is enforced by
/// [`crate::apply_lod`] before any work happens.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LodConfig {
    /// Hard upper bound on the output length. Must be at least 1.
    /// Default: 20 000
    pub max_points_per_track: usize,
    /// Target sampling rate of the temporal decimation, in points per minute of track
    /// duration. 0 disables decimation.
    /// Default: 600
    pub target_points_per_min: f64,
    /// RDP tolerance in meters. 0 keeps every point that is not exactly on its chord.
    /// Default: 5.0
    pub rdp_epsilon_meters: f64,
    /// Run the RDP stage at all.
    /// Default: true
    pub use_rdp: bool,
    /// Distance model used by the RDP stage.
    /// Default: [`Projection::DegreeScale`]
    #[cfg_attr(feature = "serde", serde(default))]
    pub projection: Projection,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Default for LodConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl LodConfig {
    /// Create a validated configuration with the default projection
    pub fn new(
        max_points_per_track: usize,
        target_points_per_min: f64,
        rdp_epsilon_meters: f64,
        use_rdp: bool,
    ) -> Result<Self> {
        let config = Self {
            max_points_per_track,
            target_points_per_min,
            rdp_epsilon_meters,
            use_rdp,
            projection: Projection::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Settings for desktop rendering
    pub fn desktop() -> Self {
        Self {
            max_points_per_track: 20_000,
            target_points_per_min: 600.0,
            rdp_epsilon_meters: 5.0,
            use_rdp: true,
            projection: Projection::DegreeScale,
        }
    }

    /// Tighter settings for mobile devices
    pub fn mobile() -> Self {
        Self {
            max_points_per_track: 8_000,
            target_points_per_min: 300.0,
            rdp_epsilon_meters: 8.0,
            use_rdp: true,
            projection: Projection::DegreeScale,
        }
    }

    pub fn with_max_points(self, max_points_per_track: usize) -> Self {
        Self {
            max_points_per_track,
            ..self
        }
    }

    pub fn with_target_points_per_min(self, target_points_per_min: f64) -> Self {
        Self {
            target_points_per_min,
            ..self
        }
    }

    pub fn with_epsilon_meters(self, rdp_epsilon_meters: f64) -> Self {
        Self {
            rdp_epsilon_meters,
            ..self
        }
    }

    pub fn with_rdp(self, use_rdp: bool) -> Self {
        Self { use_rdp, ..self }
    }

    pub fn with_projection(self, projection: Projection) -> Self {
        Self { projection, ..self }
    }

    /// Reject values that would make the pipeline produce meaningless output
    pub fn validate(&self) -> Result<()> {
        if self.max_points_per_track == 0 {
            return Err(LodError::InvalidConfig {
                field: "max_points_per_track",
                reason: "must be at least 1".to_string(),
            });
        }
        check_non_negative("target_points_per_min", self.target_points_per_min)?;
        check_non_negative("rdp_epsilon_meters", self.rdp_epsilon_meters)?;
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(LodError::InvalidConfig {
            field,
            reason: format!("must be finite, got {value}"),
        });
    }
    if value < 0.0 {
        return Err(LodError::InvalidConfig {
            field,
            reason: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}
