//! Card generation: descriptor → layers → canvas → exported files.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::asset::AssetStore;
use crate::catalog::Catalog;
use crate::compose::CompositionEngine;
use crate::config::GeneratorConfig;
use crate::descriptor::{
    custom_stem, map_catalog_record, map_custom_parameters, ArtworkSource, CardDescriptor,
};
use crate::error::Result;
use crate::export::{ExportedFile, ResolutionExporter};
use crate::layer::resolve_layers;
use crate::raster::CardImage;

/// Result of one successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedCard {
    /// Catalog id, or the custom file name.
    pub label: String,
    pub destination: PathBuf,
    pub files: Vec<ExportedFile>,
    pub elapsed: Duration,
}

/// Main card generation engine.
///
/// Holds the catalog, the asset store and the exporter. It only reads shared
/// state, so one generator can serve several workers.
///
/// # Example
///
/// ```no_run
/// use gwent_card_renderer::{Catalog, CardGenerator, GeneratorConfig};
///
/// let config = GeneratorConfig::default();
/// let catalog = Catalog::load(&config.catalog_path)?;
/// let generator = CardGenerator::new(config, catalog);
///
/// let card = generator.generate_catalog_card("152101")?;
/// println!("wrote {} files to {}", card.files.len(), card.destination.display());
/// # Ok::<(), gwent_card_renderer::CardError>(())
/// ```
pub struct CardGenerator {
    config: GeneratorConfig,
    catalog: Catalog,
    assets: AssetStore,
    exporter: ResolutionExporter,
}

impl CardGenerator {
    pub fn new(config: GeneratorConfig, catalog: Catalog) -> Self {
        let assets = AssetStore::new(&config.assets_root);
        let exporter = ResolutionExporter::new(config.export, config.filter());
        Self {
            config,
            catalog,
            assets,
            exporter,
        }
    }

    /// A generator without a catalog, for custom cards only.
    pub fn custom_only(config: GeneratorConfig) -> Self {
        Self::new(config, Catalog::new())
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Maps a catalog id to its descriptor.
    pub fn describe(&self, id: &str) -> Result<CardDescriptor> {
        map_catalog_record(id, self.catalog.get(id), &self.config.locale)
    }

    /// Composes a card without writing anything.
    pub fn render(&self, descriptor: &CardDescriptor) -> Result<CardImage> {
        let plan = resolve_layers(descriptor);
        CompositionEngine::new(&self.assets, self.config.filter()).compose(&plan)
    }

    /// Where the files of a card go.
    pub fn destination(&self, descriptor: &CardDescriptor) -> PathBuf {
        match &descriptor.artwork {
            ArtworkSource::Catalog { id } => self.config.catalog_destination(id),
            ArtworkSource::Custom { filename } => {
                self.config.custom_destination(&custom_stem(filename))
            }
        }
    }

    /// Composes and exports an already mapped card.
    pub fn generate(&self, descriptor: &CardDescriptor) -> Result<GeneratedCard> {
        let started = Instant::now();
        let card = self.render(descriptor)?;
        let destination = self.destination(descriptor);
        let files = self.exporter.export(&card, &destination)?;

        let label = match &descriptor.artwork {
            ArtworkSource::Catalog { id } => id.clone(),
            ArtworkSource::Custom { filename } => filename.clone(),
        };
        Ok(GeneratedCard {
            label,
            destination,
            files,
            elapsed: started.elapsed(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn generate_catalog_card(&self, id: &str) -> Result<GeneratedCard> {
        let descriptor = self.describe(id)?;
        self.generate(&descriptor)
    }

    /// Generates a card from `key=value` style parameters.
    #[tracing::instrument(skip_all)]
    pub fn generate_custom_card<K, V>(&self, params: &[(K, V)]) -> Result<GeneratedCard>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let descriptor = map_custom_parameters(params);
        let result = self.generate(&descriptor);
        let ArtworkSource::Custom { filename } = &descriptor.artwork else {
            return result;
        };
        match &result {
            Ok(card) => tracing::info!(
                "[v] Custom card {filename} generated ({:.2} sec)",
                card.elapsed.as_secs_f64()
            ),
            Err(err) => tracing::error!("[x] Custom card {filename} can't be generated : {err}"),
        }
        result
    }
}

impl std::fmt::Debug for CardGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardGenerator")
            .field("config", &self.config)
            .field("cards", &self.catalog.len())
            .field("assets", &self.assets.root())
            .finish()
    }
}
