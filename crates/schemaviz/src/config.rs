//! Configuration types for schema graph building and rendering.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! configuration file; every field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining build and style settings.
//! - [`BuildOptions`] - Which optional edge kinds the graph builder emits.
//! - [`StyleConfig`] - Layout direction and edge colors of rendered diagrams.
//!
//! # Example
//!
//! ```
//! # use schemaviz::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.build().include_ownership());
//! assert!(config.style().role_color().is_ok());
//! ```

use std::{fmt, str::FromStr};

use serde::Deserialize;

use schemaviz_core::color::Color;

use crate::error::SchemaVizError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Graph building section.
    #[serde(default)]
    build: BuildOptions,

    /// Style section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(build: BuildOptions, style: StyleConfig) -> Self {
        Self { build, style }
    }

    /// Returns the build options.
    pub fn build(&self) -> &BuildOptions {
        &self.build
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns a copy with the build options replaced.
    pub fn with_build(mut self, build: BuildOptions) -> Self {
        self.build = build;
        self
    }
}

/// Toggles for the optional second pass of a build.
///
/// Both default to `true`. Subtype edges are always emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    include_ownership: bool,
    include_roles: bool,
}

impl BuildOptions {
    pub fn new(include_ownership: bool, include_roles: bool) -> Self {
        Self {
            include_ownership,
            include_roles,
        }
    }

    /// Whether owner → attribute edges are emitted.
    pub fn include_ownership(&self) -> bool {
        self.include_ownership
    }

    /// Whether relation → player edges are emitted.
    pub fn include_roles(&self) -> bool {
        self.include_roles
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Graphviz `rankdir` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RankDirection {
    #[default]
    #[serde(alias = "lr")]
    LR,
    #[serde(alias = "rl")]
    RL,
    #[serde(alias = "tb")]
    TB,
    #[serde(alias = "bt")]
    BT,
}

impl RankDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            RankDirection::LR => "LR",
            RankDirection::RL => "RL",
            RankDirection::TB => "TB",
            RankDirection::BT => "BT",
        }
    }
}

impl fmt::Display for RankDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankDirection {
    type Err = SchemaVizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LR" => Ok(RankDirection::LR),
            "RL" => Ok(RankDirection::RL),
            "TB" => Ok(RankDirection::TB),
            "BT" => Ok(RankDirection::BT),
            _ => Err(SchemaVizError::UnsupportedOption(format!(
                "rank direction `{s}` (expected LR, RL, TB or BT)"
            ))),
        }
    }
}

/// Visual styling of rendered diagrams.
///
/// Colors are kept as written and validated when a diagram is produced, so a
/// bad value is reported as [`SchemaVizError::UnsupportedOption`] rather than
/// as a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    rank_direction: RankDirection,
    subtype_color: String,
    ownership_color: String,
    role_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            rank_direction: RankDirection::default(),
            subtype_color: "black".to_string(),
            ownership_color: "red".to_string(),
            role_color: "forestgreen".to_string(),
        }
    }
}

impl StyleConfig {
    /// Returns the layout direction.
    pub fn rank_direction(&self) -> RankDirection {
        self.rank_direction
    }

    /// Returns the parsed color of subtype edges.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] for an invalid color string.
    pub fn subtype_color(&self) -> Result<Color, SchemaVizError> {
        parse_color("subtype_color", &self.subtype_color)
    }

    /// Returns the parsed color of ownership edges.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] for an invalid color string.
    pub fn ownership_color(&self) -> Result<Color, SchemaVizError> {
        parse_color("ownership_color", &self.ownership_color)
    }

    /// Returns the parsed color of role edges.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaVizError::UnsupportedOption`] for an invalid color string.
    pub fn role_color(&self) -> Result<Color, SchemaVizError> {
        parse_color("role_color", &self.role_color)
    }
}

fn parse_color(key: &str, value: &str) -> Result<Color, SchemaVizError> {
    Color::new(value).map_err(|err| SchemaVizError::UnsupportedOption(format!("{key}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert!(config.build().include_ownership());
        assert!(config.build().include_roles());
        assert_eq!(config.style().rank_direction(), RankDirection::LR);
        assert_eq!(config.style().ownership_color().unwrap().to_hex(), "#ff0000");
        assert_eq!(config.style().role_color().unwrap().to_hex(), "#228b22");
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r##"
            [build]
            include_roles = false

            [style]
            rank_direction = "TB"
            ownership_color = "#0000ff"
            "##,
        )
        .unwrap();

        assert!(config.build().include_ownership());
        assert!(!config.build().include_roles());
        assert_eq!(config.style().rank_direction(), RankDirection::TB);
        assert_eq!(config.style().ownership_color().unwrap().to_hex(), "#0000ff");
        assert_eq!(config.style().subtype_color().unwrap().to_hex(), "#000000");
    }

    #[test]
    fn test_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.build(), &BuildOptions::default());
    }

    #[test]
    fn test_invalid_color_is_unsupported_option() {
        let config: AppConfig = toml::from_str("[style]\nrole_color = \"greenish\"").unwrap();

        assert!(matches!(
            config.style().role_color(),
            Err(SchemaVizError::UnsupportedOption(_))
        ));
    }

    #[test]
    fn test_rank_direction_from_str() {
        assert_eq!("bt".parse::<RankDirection>().unwrap(), RankDirection::BT);
        assert!("up".parse::<RankDirection>().is_err());
    }
}
