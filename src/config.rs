use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::AxisConvention;
use crate::error::{ConfigError, Result};
use crate::num::Number;
use crate::solver::PoseSolver;

/// Tunables of a calibration session. Every field has a default, so an empty
/// yaml document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// raw depth units per world unit (millimetres to metres by default)
    pub depth_scale: Number,
    /// largest accepted raw depth sample
    pub max_depth: Option<Number>,
    /// row-major optical-to-body axis matrix, the rig's mounting by default
    pub axis_convention: Option<[Number; 9]>,
    /// relative singular value threshold of the rank check
    pub rank_tolerance: Number,
    /// smallest accepted thickness of the clicked points relative to their
    /// extent, zero disables the check
    pub min_spread_ratio: Number,
    /// flip reflective solutions into proper rotations
    pub enforce_proper_rotation: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            depth_scale: 1000.0,
            max_depth: None,
            axis_convention: None,
            rank_tolerance: PoseSolver::DEFAULT_RANK_TOLERANCE,
            min_spread_ratio: PoseSolver::DEFAULT_MIN_SPREAD_RATIO,
            enforce_proper_rotation: true,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.depth_scale.is_finite() || self.depth_scale <= 0.0 {
            return Err(ConfigError::InvalidDepthScale(self.depth_scale).into());
        }
        if let Some(max_depth) = self.max_depth {
            if !max_depth.is_finite() || max_depth <= 0.0 {
                return Err(ConfigError::InvalidMaxDepth(max_depth).into());
            }
        }
        if !(self.rank_tolerance > 0.0 && self.rank_tolerance < 1.0) {
            return Err(ConfigError::InvalidRankTolerance(self.rank_tolerance).into());
        }
        if !(self.min_spread_ratio >= 0.0 && self.min_spread_ratio < 1.0) {
            return Err(ConfigError::InvalidSpreadRatio(self.min_spread_ratio).into());
        }
        self.axis_convention()?;
        Ok(())
    }

    pub fn axis_convention(&self) -> Result<AxisConvention> {
        match &self.axis_convention {
            Some(values) => AxisConvention::from_row_slice(values),
            None => Ok(AxisConvention::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibrationError;

    #[test]
    fn empty_document_gives_defaults() {
        let config = SessionConfig::from_yaml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.depth_scale, 1000.0);
        assert!(config.enforce_proper_rotation);
        assert_eq!(config.axis_convention().unwrap(), AxisConvention::optical_to_body());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = SessionConfig::from_yaml_str(
            "depth_scale: 1.0\nmax_depth: 4.5\naxis_convention: [1, 0, 0, 0, 1, 0, 0, 0, 1]\n",
        )
        .unwrap();

        assert_eq!(config.depth_scale, 1.0);
        assert_eq!(config.max_depth, Some(4.5));
        assert_eq!(config.rank_tolerance, PoseSolver::DEFAULT_RANK_TOLERANCE);
        assert_eq!(config.min_spread_ratio, PoseSolver::DEFAULT_MIN_SPREAD_RATIO);
        assert_eq!(config.axis_convention().unwrap(), AxisConvention::identity());
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "depth_scale: 0.0",
            "max_depth: -1.0",
            "rank_tolerance: 2.0",
            "min_spread_ratio: -0.1",
            "min_spread_ratio: 1.0",
            "axis_convention: [1, 1, 0, 0, 1, 0, 0, 0, 1]",
        ];
        for yaml in cases.iter() {
            let err = SessionConfig::from_yaml_str(yaml).unwrap_err();
            assert!(
                matches!(err, CalibrationError::Configuration(_)),
                "{} gave {:?}",
                yaml,
                err
            );
        }
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = SessionConfig::from_yaml_str("depth_scael: 1000.0").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Configuration(ConfigError::Yaml(_))
        ));
    }
}
