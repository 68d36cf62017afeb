//! Serializable generator configuration.
//!
//! Every field has a default, so a config file only needs to list what it
//! changes.
//!
//! # Example
//!
//! ```
//! use gwent_card_renderer::GeneratorConfig;
//!
//! let config = GeneratorConfig::from_json(r#"{ "version": "v1-0-0", "maxGenerated": 0 }"#).unwrap();
//! assert_eq!(config.version, "v1-0-0");
//! assert_eq!(config.max_generated, 0);
//! assert_eq!(config.export.tiers.thumbnail.width, 137);
//! ```

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::{CardError, Result};
use crate::raster::{PointPx, SizePx};

// ============================================================================
// Resampling filter
// ============================================================================

/// Serializable version of [`FilterType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

// ============================================================================
// Export settings
// ============================================================================

/// Pixel sizes of the downsampled tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierSizes {
    pub high: SizePx,
    pub medium: SizePx,
    pub low: SizePx,
    pub thumbnail: SizePx,
}

impl Default for TierSizes {
    fn default() -> Self {
        Self {
            high: SizePx::new(1093, 1462),
            medium: SizePx::new(547, 731),
            low: SizePx::new(274, 366),
            thumbnail: SizePx::new(137, 183),
        }
    }
}

/// Geometry of the exported files.
///
/// The composed card is scaled to `face_size` and placed at `margin` on a
/// transparent canvas of `canvas_size`; that canvas is the `original` tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSettings {
    pub face_size: SizePx,
    pub canvas_size: SizePx,
    pub margin: PointPx,
    pub tiers: TierSizes,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            face_size: SizePx::new(1850, 2321),
            canvas_size: SizePx::new(2186, 2924),
            margin: PointPx::new(164, 330),
            tiers: TierSizes::default(),
        }
    }
}

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Everything the generator needs from its environment.
///
/// # JSON Format
///
/// ```json
/// {
///   "catalogPath": "cards.json",
///   "assetsRoot": "assets",
///   "cardsRoot": "images",
///   "customRoot": "image-custom",
///   "version": "v0-9-10",
///   "locale": "en-US",
///   "maxGenerated": 5,
///   "resampleFilter": "lanczos3",
///   "workers": 1,
///   "export": { "faceSize": { "width": 1850, "height": 2321 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    pub catalog_path: PathBuf,
    pub assets_root: PathBuf,
    pub cards_root: PathBuf,
    pub custom_root: PathBuf,
    /// Game version tag, only used in the output path.
    pub version: String,
    /// Locale of the description scanned for counters.
    pub locale: String,
    /// Stop after this many generated cards. 0 for no limit.
    pub max_generated: usize,
    pub resample_filter: ResampleFilter,
    /// Worker threads for batch runs; 1 runs sequentially.
    pub workers: usize,
    pub export: ExportSettings,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            catalog_path: "cards.json".into(),
            assets_root: "assets".into(),
            cards_root: "images".into(),
            custom_root: "image-custom".into(),
            version: "v0-9-10".into(),
            locale: "en-US".into(),
            max_generated: 5,
            resample_filter: ResampleFilter::default(),
            workers: 1,
            export: ExportSettings::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CardError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CardError::config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CardError::config(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CardError::config(e.to_string()))
    }

    pub fn filter(&self) -> FilterType {
        self.resample_filter.into()
    }

    /// Output folder of a catalog card: `<cardsRoot>/<version>/<id>/<id>00/`.
    pub fn catalog_destination(&self, id: &str) -> PathBuf {
        self.cards_root
            .join(&self.version)
            .join(id)
            .join(format!("{id}00"))
    }

    /// Output folder of a custom card: `<customRoot>/<stem>/`.
    pub fn custom_destination(&self, stem: &str) -> PathBuf {
        self.custom_root.join(stem)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_layout() {
        let config = GeneratorConfig::default();
        assert_eq!(config.max_generated, 5);
        assert_eq!(config.filter(), FilterType::Lanczos3);
        assert_eq!(config.export.canvas_size, SizePx::new(2186, 2924));
        assert_eq!(config.export.margin, PointPx::new(164, 330));
        assert_eq!(config.export.tiers.high, SizePx::new(1093, 1462));
    }

    #[test]
    fn empty_config_deserializes_to_defaults() {
        let config = GeneratorConfig::from_json("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn json_uses_camel_case_and_kebab_filters() {
        let mut config = GeneratorConfig::new();
        config.resample_filter = ResampleFilter::CatmullRom;
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"maxGenerated\""));
        assert!(json.contains("\"catmull-rom\""));

        let restored = GeneratorConfig::from_json(&json).unwrap();
        assert_eq!(restored.resample_filter, ResampleFilter::CatmullRom);
    }

    #[test]
    fn partial_export_section_keeps_other_defaults() {
        let json = r#"{ "export": { "margin": { "x": 0, "y": 0 } } }"#;
        let config = GeneratorConfig::from_json(json).unwrap();
        assert_eq!(config.export.margin, PointPx::ORIGIN);
        assert_eq!(config.export.face_size, SizePx::new(1850, 2321));
    }

    #[test]
    fn single_tier_override_keeps_other_tiers() {
        let json = r#"{ "export": { "tiers": { "high": { "width": 800, "height": 1000 } } } }"#;
        let config = GeneratorConfig::from_json(json).unwrap();
        assert_eq!(config.export.tiers.high, SizePx::new(800, 1000));
        assert_eq!(config.export.tiers.medium, SizePx::new(547, 731));
        assert_eq!(config.export.tiers.thumbnail, SizePx::new(137, 183));
    }

    #[test]
    fn destinations() {
        let config = GeneratorConfig::default();
        assert_eq!(
            config.catalog_destination("152101"),
            Path::new("images/v0-9-10/152101/15210100")
        );
        assert_eq!(config.custom_destination("ciri"), Path::new("image-custom/ciri"));
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let err = GeneratorConfig::from_json(r#"{ "workers": "many" }"#).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
