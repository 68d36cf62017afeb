//! Maps a card descriptor to its layer plan.

use std::path::PathBuf;

use super::geometry::*;
use super::{LayerDirective, LayerPlan, SourceFit, Step};
use crate::descriptor::{custom_artwork_file, ArtworkSource, CardDescriptor, RenderSlot};
use crate::raster::PointPx;

pub const LAYOUT_ASSET: &str = "image_layout.png";
pub const BLACK_BORDER_ASSET: &str = "black_border.png";
pub const COUNTDOWN_ASSET: &str = "symbols/effects/countdown.png";
pub const SPY_ASSET: &str = "symbols/position/spy.png";

/// Which offset pair a two-digit strength uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitKerning {
    Single,
    /// A `1` is thin, so both digits move toward the center.
    Narrow,
    Wide,
}

/// Digits of a strength value with their offsets, tens first.
///
/// Zero yields nothing: events and cards without strength get no badge.
pub fn strength_digits(strength: u32) -> (DigitKerning, Vec<(u32, PointPx)>) {
    match strength {
        0 => (DigitKerning::Single, Vec::new()),
        1..=9 => (
            DigitKerning::Single,
            vec![(strength, PointPx::new(SINGLE_DIGIT_X, DIGIT_Y))],
        ),
        _ => {
            let (tens, units) = (strength / 10, strength % 10);
            let (kerning, (tens_x, units_x)) = if tens == 1 || units == 1 {
                (DigitKerning::Narrow, NARROW_PAIR_X)
            } else {
                (DigitKerning::Wide, WIDE_PAIR_X)
            };
            (
                kerning,
                vec![
                    (tens, PointPx::new(tens_x, DIGIT_Y)),
                    (units, PointPx::new(units_x, DIGIT_Y)),
                ],
            )
        }
    }
}

fn digit_asset(digit: u32) -> PathBuf {
    PathBuf::from(format!("symbols/strength/number{digit}.png"))
}

fn artwork_layer(artwork: &ArtworkSource) -> LayerDirective {
    let (source, fit) = match artwork {
        ArtworkSource::Catalog { id } => (
            PathBuf::from(format!("artworks/{id}00.png")),
            SourceFit::Crop(ARTWORK_WINDOW),
        ),
        ArtworkSource::Custom { filename } => (
            PathBuf::from("custom-artworks").join(custom_artwork_file(filename)),
            SourceFit::CoverThenCrop(ARTWORK_WINDOW),
        ),
    };
    LayerDirective {
        step: Step::Artwork,
        source,
        fit,
        size: Some(ARTWORK_SIZE),
        offset: ARTWORK_OFFSET,
        shared: false,
    }
}

/// Builds the ordered layer plan for a card.
pub fn resolve_layers(descriptor: &CardDescriptor) -> LayerPlan {
    let mut layers = vec![
        artwork_layer(&descriptor.artwork),
        LayerDirective::overlay(Step::BlackBorder, BLACK_BORDER_ASSET),
        LayerDirective::overlay(
            Step::Rank,
            format!("rank/{}.png", descriptor.card_type.as_str()),
        ),
        LayerDirective::overlay(
            Step::InnerFaction,
            format!("inner-faction/{}.png", descriptor.faction),
        ),
        LayerDirective::overlay(
            Step::Rarity,
            format!("rarity/{}.png", descriptor.rarity.as_str()),
        ),
        LayerDirective::overlay(
            Step::Banner,
            format!("banner/{}.png", descriptor.banner_variant()),
        ),
    ];

    let (_, digits) = strength_digits(descriptor.strength);
    layers.extend(digits.into_iter().map(|(digit, offset)| {
        LayerDirective::icon(Step::Strength, digit_asset(digit), DIGIT_SIZE, offset)
    }));

    match descriptor.render_slot() {
        RenderSlot::None => {}
        RenderSlot::Position(position) => layers.push(LayerDirective::icon(
            Step::Position,
            format!("symbols/position/{}.png", position.as_str()),
            SLOT_SIZE,
            SLOT_OFFSET,
        )),
        RenderSlot::Spy => layers.push(LayerDirective::icon(
            Step::Loyalty,
            SPY_ASSET,
            SLOT_SIZE,
            SLOT_OFFSET,
        )),
    }

    if let Some(turns) = descriptor.counter_turns {
        layers.push(LayerDirective::icon(
            Step::Countdown,
            COUNTDOWN_ASSET,
            HOURGLASS_SIZE,
            HOURGLASS_OFFSET,
        ));
        layers.push(LayerDirective::icon(
            Step::TurnNumber,
            digit_asset(turns.get()),
            TURNS_SIZE,
            TURNS_OFFSET,
        ));
    }

    LayerPlan {
        base: LayerDirective::overlay(Step::Layout, LAYOUT_ASSET),
        layers,
    }
}
