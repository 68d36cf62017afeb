//! Multi-resolution export of a composed card.

use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::config::ExportSettings;
use crate::error::{CardError, Result};
use crate::raster::{CardImage, Canvas, SizePx};

/// One of the five exported resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Original,
    High,
    Medium,
    Low,
    Thumbnail,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Original,
        Tier::High,
        Tier::Medium,
        Tier::Low,
        Tier::Thumbnail,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Original => "original",
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
            Tier::Thumbnail => "thumbnail",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.png", self.name())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file written by the exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub tier: Tier,
    pub path: PathBuf,
    pub size: SizePx,
}

/// Writes a card as `original.png` plus four downsampled tiers.
#[derive(Debug, Clone)]
pub struct ResolutionExporter {
    settings: ExportSettings,
    filter: FilterType,
}

impl ResolutionExporter {
    pub fn new(settings: ExportSettings, filter: FilterType) -> Self {
        Self { settings, filter }
    }

    pub fn tier_size(&self, tier: Tier) -> SizePx {
        let tiers = &self.settings.tiers;
        match tier {
            Tier::Original => self.settings.canvas_size,
            Tier::High => tiers.high,
            Tier::Medium => tiers.medium,
            Tier::Low => tiers.low,
            Tier::Thumbnail => tiers.thumbnail,
        }
    }

    /// Places the card face on the transparent export canvas.
    pub fn original(&self, card: &CardImage) -> RgbaImage {
        let face_size = self.settings.face_size;
        let face = if card.size() == face_size {
            card.as_image().clone()
        } else {
            imageops::resize(card.as_image(), face_size.width, face_size.height, self.filter)
        };

        let mut canvas = Canvas::transparent(self.settings.canvas_size);
        canvas.draw(&face, self.settings.margin);
        canvas.seal().into_image()
    }

    /// Renders every tier in memory, then writes them to `destination`.
    ///
    /// Each downsampled tier is resampled from the original, never from
    /// another tier.
    pub fn export(&self, card: &CardImage, destination: &Path) -> Result<Vec<ExportedFile>> {
        let original = self.original(card);

        let mut rendered = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            let size = self.tier_size(tier);
            let image = match tier {
                Tier::Original => original.clone(),
                _ => imageops::resize(&original, size.width, size.height, self.filter),
            };
            rendered.push((tier, image));
        }

        std::fs::create_dir_all(destination).map_err(|e| CardError::io(destination, e))?;

        let mut written = Vec::with_capacity(rendered.len());
        for (tier, image) in rendered {
            let path = destination.join(tier.file_name());
            image
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|source| CardError::Encode {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(tier = tier.name(), path = %path.display(), "tier written");
            written.push(ExportedFile {
                tier,
                size: SizePx::of(&image),
                path,
            });
        }

        Ok(written)
    }
}
