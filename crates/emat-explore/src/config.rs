//! Configuration types for the exploration views.
//!
//! Both configs use the builder pattern and are validated on `build()`.

use serde::{Deserialize, Serialize};

/// Configuration for an [`Explore`](crate::Explore) controller.
///
/// # Example
///
/// ```rust,ignore
/// use emat_explore::ExploreConfig;
///
/// let config = ExploreConfig::builder()
///     .default_bins(30)
///     .slider_steps(100)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Number of equal-width bins used the first time a histogram is built.
    /// Default: 20
    pub default_bins: usize,

    /// Number of evenly spaced grid points a KDE curve is evaluated on.
    /// Default: 250
    pub kde_points: usize,

    /// Number of slider steps across a continuous domain.
    /// Default: 200
    pub slider_steps: usize,

    /// Marker and range settings for two-way scatter views.
    pub scatter: ScatterConfig,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            default_bins: 20,
            kde_points: 250,
            slider_steps: 200,
            scatter: ScatterConfig::default(),
        }
    }
}

impl ExploreConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ExploreConfigBuilder {
        ExploreConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.default_bins == 0 {
            return Err(ConfigValidationError::ZeroCount {
                field: "default_bins".to_string(),
            });
        }
        if self.kde_points < 2 {
            return Err(ConfigValidationError::ZeroCount {
                field: "kde_points".to_string(),
            });
        }
        if self.slider_steps == 0 {
            return Err(ConfigValidationError::ZeroCount {
                field: "slider_steps".to_string(),
            });
        }
        self.scatter.validate()
    }
}

/// Marker opacity and axis padding for a [`ScatterSelectionView`](crate::ScatterSelectionView).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterConfig {
    /// Point count above which a group's marker opacity starts to fall.
    /// Default: 500
    pub target_marker_opacity: usize,

    /// Lowest opacity a point group can be scaled down to.
    /// Default: 0.25
    pub minimum_marker_opacity: f64,

    /// Fraction of the data width added to each side of an axis range.
    /// Default: 0.07
    pub range_padding: f64,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            target_marker_opacity: 500,
            minimum_marker_opacity: 0.25,
            range_padding: 0.07,
        }
    }
}

impl ScatterConfig {
    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.minimum_marker_opacity) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "minimum_marker_opacity".to_string(),
                value: self.minimum_marker_opacity,
            });
        }
        if !(0.0..=1.0).contains(&self.range_padding) {
            return Err(ConfigValidationError::InvalidFraction {
                field: "range_padding".to_string(),
                value: self.range_padding,
            });
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("Invalid value for '{field}': count is too small")]
    ZeroCount { field: String },
}

/// Builder for [`ExploreConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ExploreConfigBuilder {
    default_bins: Option<usize>,
    kde_points: Option<usize>,
    slider_steps: Option<usize>,
    target_marker_opacity: Option<usize>,
    minimum_marker_opacity: Option<f64>,
    range_padding: Option<f64>,
}

impl ExploreConfigBuilder {
    /// Set the bin count for newly built histograms.
    #[must_use]
    pub fn default_bins(mut self, bins: usize) -> Self {
        self.default_bins = Some(bins);
        self
    }

    /// Set the number of KDE evaluation points.
    #[must_use]
    pub fn kde_points(mut self, points: usize) -> Self {
        self.kde_points = Some(points);
        self
    }

    /// Set the number of steps on continuous range sliders.
    #[must_use]
    pub fn slider_steps(mut self, steps: usize) -> Self {
        self.slider_steps = Some(steps);
        self
    }

    /// Set the point count above which scatter opacity is reduced.
    #[must_use]
    pub fn target_marker_opacity(mut self, count: usize) -> Self {
        self.target_marker_opacity = Some(count);
        self
    }

    /// Set the opacity floor for dense scatter groups.
    #[must_use]
    pub fn minimum_marker_opacity(mut self, opacity: f64) -> Self {
        self.minimum_marker_opacity = Some(opacity);
        self
    }

    /// Set the axis range padding fraction.
    #[must_use]
    pub fn range_padding(mut self, padding: f64) -> Self {
        self.range_padding = Some(padding);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ExploreConfig` or an error if validation fails.
    pub fn build(self) -> Result<ExploreConfig, ConfigValidationError> {
        let defaults = ScatterConfig::default();
        let config = ExploreConfig {
            default_bins: self.default_bins.unwrap_or(20),
            kde_points: self.kde_points.unwrap_or(250),
            slider_steps: self.slider_steps.unwrap_or(200),
            scatter: ScatterConfig {
                target_marker_opacity: self
                    .target_marker_opacity
                    .unwrap_or(defaults.target_marker_opacity),
                minimum_marker_opacity: self
                    .minimum_marker_opacity
                    .unwrap_or(defaults.minimum_marker_opacity),
                range_padding: self.range_padding.unwrap_or(defaults.range_padding),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExploreConfig::default();
        assert_eq!(config.default_bins, 20);
        assert_eq!(config.kde_points, 250);
        assert_eq!(config.slider_steps, 200);
        assert_eq!(config.scatter.target_marker_opacity, 500);
        assert_eq!(config.scatter.minimum_marker_opacity, 0.25);
        assert_eq!(config.scatter.range_padding, 0.07);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = ExploreConfig::builder().build().unwrap();
        assert_eq!(config, ExploreConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ExploreConfig::builder()
            .default_bins(10)
            .kde_points(100)
            .target_marker_opacity(1000)
            .minimum_marker_opacity(0.1)
            .build()
            .unwrap();

        assert_eq!(config.default_bins, 10);
        assert_eq!(config.kde_points, 100);
        assert_eq!(config.scatter.target_marker_opacity, 1000);
        assert_eq!(config.scatter.minimum_marker_opacity, 0.1);
    }

    #[test]
    fn test_builder_slider_and_padding() {
        let config = ExploreConfig::builder()
            .slider_steps(50)
            .range_padding(0.1)
            .build()
            .unwrap();
        assert_eq!(config.slider_steps, 50);
        assert_eq!(config.scatter.range_padding, 0.1);
        assert_eq!(config.default_bins, 20);
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = ExploreConfig::builder().default_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroCount { .. }
        ));
    }

    #[test]
    fn test_validation_opacity_out_of_range() {
        let result = ExploreConfig::builder().minimum_marker_opacity(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidFraction { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "default_bins": 12,
            "kde_points": 50,
            "slider_steps": 40,
            "scatter": {
                "target_marker_opacity": 200,
                "minimum_marker_opacity": 0.5,
                "range_padding": 0.1
            }
        }"#;
        let config: ExploreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.default_bins, 12);
        assert_eq!(config.scatter.target_marker_opacity, 200);
        assert!(config.validate().is_ok());
    }
}
