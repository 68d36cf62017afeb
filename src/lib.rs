//! gwent-card-renderer: composes Gwent card images from catalog metadata
//!
//! A card is built by stacking image layers (artwork, frame, rank, faction,
//! rarity, banner, strength digits, position or spy icon, countdown) on top
//! of a background layout, then exported as `original.png` plus four
//! downsampled tiers.
//!
//! # Example
//!
//! ```no_run
//! use gwent_card_renderer::{BatchRunner, Catalog, CardGenerator, GeneratorConfig};
//!
//! let config = GeneratorConfig::default();
//! let catalog = Catalog::load(&config.catalog_path)?;
//! let max = config.max_generated;
//! let generator = CardGenerator::new(config, catalog);
//!
//! // Every catalog id, stopping after `maxGenerated` cards
//! let report = BatchRunner::new(&generator).run(None, max);
//! println!("{report}");
//! # Ok::<(), gwent_card_renderer::CardError>(())
//! ```
//!
//! # Custom cards
//!
//! Cards that are not in the catalog are described with `key=value` pairs:
//!
//! ```no_run
//! use gwent_card_renderer::{CardGenerator, GeneratorConfig, parse_custom_args};
//!
//! let generator = CardGenerator::custom_only(GeneratorConfig::default());
//! let params = parse_custom_args(&["filename=ciri", "faction=skellige", "strength=9"]);
//! let card = generator.generate_custom_card(&params)?;
//! assert!(card.destination.ends_with("ciri"));
//! # Ok::<(), gwent_card_renderer::CardError>(())
//! ```

mod asset;
mod batch;
mod catalog;
mod compose;
mod config;
mod descriptor;
mod error;
mod export;
mod generator;
pub mod layer;
mod raster;

pub use asset::AssetStore;
pub use batch::{BatchReport, BatchRunner, BatchStats, CardOutcome, CardPipeline};
pub use catalog::{Catalog, CatalogRecord, Variation};
pub use compose::CompositionEngine;
pub use config::{ExportSettings, GeneratorConfig, ResampleFilter, TierSizes};
pub use descriptor::{
    map_catalog_record, map_custom_parameters, parse_custom_args, ArtworkSource, CardDescriptor,
    CardType, Faction, Position, Rarity, RenderSlot,
};
pub use error::{CardError, ErrorKind, Result};
pub use export::{ExportedFile, ResolutionExporter, Tier};
pub use generator::{CardGenerator, GeneratedCard};
pub use layer::{resolve_layers, LayerDirective, LayerPlan, SourceFit, Step};
pub use raster::{CardImage, PointPx, SizePx};
