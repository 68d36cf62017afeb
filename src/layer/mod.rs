//! Declarative layer plans.
//!
//! A card is drawn as an ordered list of [`LayerDirective`]s on top of a
//! background layout. The resolver turns a [`CardDescriptor`] into that list
//! without touching the filesystem, so the whole plan can be inspected and
//! tested before any image is decoded.
//!
//! # Layer order (bottom to top)
//!
//! ```text
//! Layout ─► Artwork ─► Black border ─► Rank ─► Inner-faction ─► Rarity
//!        ─► Banner ─► Strength digit(s) ─► Position | Spy ─► Countdown + turns
//! ```
//!
//! [`CardDescriptor`]: crate::descriptor::CardDescriptor

pub mod geometry;
pub mod resolver;

pub use resolver::{resolve_layers, strength_digits, DigitKerning};

use std::path::PathBuf;

use crate::raster::{PointPx, SizePx};

// ============================================================================
// Step
// ============================================================================

/// A named composition step. The name is what gets reported when the step's
/// asset cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Layout,
    Artwork,
    BlackBorder,
    Rank,
    InnerFaction,
    Rarity,
    Banner,
    Strength,
    Position,
    Loyalty,
    Countdown,
    TurnNumber,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Layout => "Layout",
            Step::Artwork => "Artwork",
            Step::BlackBorder => "Black border",
            Step::Rank => "Rank",
            Step::InnerFaction => "Inner-faction",
            Step::Rarity => "Rarity",
            Step::Banner => "Banner",
            Step::Strength => "Strength",
            Step::Position => "Position",
            Step::Loyalty => "Loyalty",
            Step::Countdown => "Countdown",
            Step::TurnNumber => "Turn number",
        }
    }
}

// ============================================================================
// LayerDirective
// ============================================================================

/// How the source image is cut down before it is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFit {
    /// Use the image as decoded.
    AsIs,
    /// Keep the top-left window of the given size.
    Crop(SizePx),
    /// Scale until both sides cover the window, then keep its top-left part.
    /// Images already matching the window are left untouched.
    CoverThenCrop(SizePx),
}

/// One asset image and where it goes on the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDirective {
    pub step: Step,
    /// Asset path, relative to the assets root.
    pub source: PathBuf,
    pub fit: SourceFit,
    /// Target size; `None` draws the asset at its native size.
    pub size: Option<SizePx>,
    pub offset: PointPx,
    /// Whether the decoded asset may be kept for other cards.
    pub shared: bool,
}

impl LayerDirective {
    /// A full-frame overlay drawn at the origin at native size.
    pub fn overlay(step: Step, source: impl Into<PathBuf>) -> Self {
        Self {
            step,
            source: source.into(),
            fit: SourceFit::AsIs,
            size: None,
            offset: PointPx::ORIGIN,
            shared: true,
        }
    }

    /// An icon resized to `size` and drawn at `offset`.
    pub fn icon(step: Step, source: impl Into<PathBuf>, size: SizePx, offset: PointPx) -> Self {
        Self {
            step,
            source: source.into(),
            fit: SourceFit::AsIs,
            size: Some(size),
            offset,
            shared: true,
        }
    }
}

/// Background layout plus the ordered layers drawn over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerPlan {
    pub base: LayerDirective,
    pub layers: Vec<LayerDirective>,
}

impl LayerPlan {
    /// Steps in drawing order, base first.
    pub fn steps(&self) -> Vec<Step> {
        std::iter::once(self.base.step)
            .chain(self.layers.iter().map(|l| l.step))
            .collect()
    }

    pub fn count(&self, step: Step) -> usize {
        self.layers.iter().filter(|l| l.step == step).count()
    }

    pub fn find(&self, step: Step) -> Option<&LayerDirective> {
        self.layers.iter().find(|l| l.step == step)
    }
}
