use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level tokenlens configuration, matching `tokenlens.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLensConfig {
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub layout: LayoutSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Token whose value holds the per-tier minimum-width thresholds.
    pub breakpoints_token: String,
    /// Root font size used when converting rem values to pixels.
    pub base_font_size_px: u32,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            breakpoints_token: "--ks-breakpoints".to_string(),
            base_font_size_px: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Base curvature for parallel-edge disambiguation.
    pub base_curvature: f64,
    /// Default node size in the serialized graph.
    pub node_size: f64,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            base_curvature: 0.25,
            node_size: 4.0,
        }
    }
}

impl TokenLensConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.resolver.breakpoints_token.starts_with("--") {
            return Err(ConfigError::Invalid(format!(
                "breakpoints_token must be a custom property name, got `{}`",
                self.resolver.breakpoints_token
            )));
        }
        if self.resolver.base_font_size_px == 0 {
            return Err(ConfigError::Invalid(
                "base_font_size_px must be non-zero".to_string(),
            ));
        }
        if self.layout.base_curvature <= 0.0 {
            return Err(ConfigError::Invalid(
                "base_curvature must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
