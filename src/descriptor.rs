//! Canonical visual description of a card and the mappers that build it from
//! catalog records or custom key=value parameters.

use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::CatalogRecord;
use crate::error::{CardError, Result};

// ============================================================================
// Faction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Faction {
    NorthernRealms,
    Monsters,
    Skellige,
    Scoiatael,
    Nilfgaard,
    #[default]
    Neutral,
}

/// Catalog faction strings and the faction each one maps to.
///
/// "Northen Realms" is how the catalog export spells it.
pub const FACTION_TABLE: &[(&str, Faction)] = &[
    ("Northen Realms", Faction::NorthernRealms),
    ("Northern Realms", Faction::NorthernRealms),
    ("Monster", Faction::Monsters),
    ("Monsters", Faction::Monsters),
    ("Skellige", Faction::Skellige),
    ("Scoiatael", Faction::Scoiatael),
    ("Nilfgaard", Faction::Nilfgaard),
    ("Neutral", Faction::Neutral),
];

impl Faction {
    pub const ALL: [Faction; 6] = [
        Faction::NorthernRealms,
        Faction::Monsters,
        Faction::Skellige,
        Faction::Scoiatael,
        Faction::Nilfgaard,
        Faction::Neutral,
    ];

    /// Maps a raw catalog faction string. Unknown strings are neutral.
    pub fn from_catalog(raw: &str) -> Self {
        FACTION_TABLE
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, faction)| *faction)
            .unwrap_or(Faction::Neutral)
    }

    /// Asset key of the faction.
    pub fn as_str(self) -> &'static str {
        match self {
            Faction::NorthernRealms => "northernrealms",
            Faction::Monsters => "monsters",
            Faction::Skellige => "skellige",
            Faction::Scoiatael => "scoiatael",
            Faction::Nilfgaard => "nilfgaard",
            Faction::Neutral => "neutral",
        }
    }
}

impl FromStr for Faction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Faction::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Card type, rarity, position
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CardType {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl CardType {
    pub fn as_str(self) -> &'static str {
        match self {
            CardType::Bronze => "bronze",
            CardType::Silver => "silver",
            CardType::Gold => "gold",
        }
    }
}

impl FromStr for CardType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bronze" => Ok(CardType::Bronze),
            "silver" => Ok(CardType::Silver),
            "gold" => Ok(CardType::Gold),
            _ => Err(()),
        }
    }
}

/// Rarity key, lower-cased. The set is open: any rarity with an asset works.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rarity(String);

impl Rarity {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Rarity {
    fn default() -> Self {
        Self("common".into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Melee,
    Ranged,
    Siege,
    Multiple,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Melee => "melee",
            Position::Ranged => "ranged",
            Position::Siege => "siege",
            Position::Multiple => "multiple",
        }
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "melee" => Ok(Position::Melee),
            "ranged" => Ok(Position::Ranged),
            "siege" => Ok(Position::Siege),
            "multiple" => Ok(Position::Multiple),
            _ => Err(()),
        }
    }
}

/// What occupies the position slot of the card. Spy and position share the
/// same spot, so at most one of them is ever drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSlot {
    None,
    Position(Position),
    Spy,
}

impl RenderSlot {
    /// Spy wins over position when both are set.
    pub fn from_parts(is_spy: bool, position: Option<Position>) -> Self {
        match (is_spy, position) {
            (true, _) => RenderSlot::Spy,
            (false, Some(position)) => RenderSlot::Position(position),
            (false, None) => RenderSlot::None,
        }
    }
}

/// Where the artwork comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    /// Pre-sized catalog artwork, keyed by card id.
    Catalog { id: String },
    /// A user-supplied file from the custom artwork folder.
    Custom { filename: String },
}

// ============================================================================
// CardDescriptor
// ============================================================================

/// Everything needed to draw one card, independent of where the data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDescriptor {
    /// Catalog id, `None` for custom cards.
    pub id: Option<String>,
    pub faction: Faction,
    pub card_type: CardType,
    pub rarity: Rarity,
    /// Zero means no strength badge.
    pub strength: u32,
    /// Position icon or spy eye; they share one spot on the card.
    pub slot: RenderSlot,
    pub counter_turns: Option<NonZeroU32>,
    pub artwork: ArtworkSource,
}

impl Default for CardDescriptor {
    fn default() -> Self {
        Self {
            id: None,
            faction: Faction::Neutral,
            card_type: CardType::Bronze,
            rarity: Rarity::default(),
            strength: 0,
            slot: RenderSlot::None,
            counter_turns: None,
            artwork: ArtworkSource::Custom {
                filename: DEFAULT_CUSTOM_FILENAME.into(),
            },
        }
    }
}

impl CardDescriptor {
    /// Banner asset key: the faction, with a `-plus` suffix for gold cards.
    pub fn banner_variant(&self) -> String {
        match self.card_type {
            CardType::Gold => format!("{}-plus", self.faction),
            _ => self.faction.to_string(),
        }
    }

    pub fn render_slot(&self) -> RenderSlot {
        self.slot
    }

    pub fn is_spy(&self) -> bool {
        self.slot == RenderSlot::Spy
    }

    pub fn position(&self) -> Option<Position> {
        match self.slot {
            RenderSlot::Position(position) => Some(position),
            _ => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.artwork, ArtworkSource::Custom { .. })
    }

    /// Id of the default printed variant, e.g. `15210100`.
    pub fn variant_id(&self) -> Option<String> {
        self.id.as_ref().map(|id| format!("{id}00"))
    }
}

// ============================================================================
// Catalog mapping
// ============================================================================

static COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Counter : ([0-9]+)").expect("valid counter regex"));

/// Extracts the turn count from a card description ("Counter : 3").
pub fn extract_counter(description: &str) -> Option<NonZeroU32> {
    COUNTER_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .and_then(NonZeroU32::new)
}

/// Spy iff the loyalties contain "disloyal" and not "loyal".
pub fn is_spy(loyalties: &[String]) -> bool {
    let has = |tag: &str| loyalties.iter().any(|l| l.eq_ignore_ascii_case(tag));
    has("disloyal") && !has("loyal")
}

/// Events and cards without a position get `None`; three tags mean `Multiple`.
pub fn derive_position(positions: &[String]) -> Option<Position> {
    if positions.iter().any(|p| p.eq_ignore_ascii_case("event")) {
        return None;
    }
    if positions.len() == 3 {
        return Some(Position::Multiple);
    }
    let first = positions.first()?;
    match first.parse::<Position>() {
        Ok(position) => Some(position),
        Err(()) => {
            tracing::warn!(position = %first, "unknown position tag, drawing no position icon");
            None
        }
    }
}

/// Builds a descriptor from the catalog record stored under `id`.
///
/// Fails with `NotFound` when there is no record and `NotReleased` when the
/// record is not public yet.
pub fn map_catalog_record(
    id: &str,
    record: Option<&CatalogRecord>,
    locale: &str,
) -> Result<CardDescriptor> {
    let record = record.ok_or_else(|| CardError::not_found(id))?;
    if !record.released {
        return Err(CardError::not_released(id));
    }

    let card_id = record.ingame_id.clone().unwrap_or_else(|| id.to_string());
    let rarity = record
        .variations
        .get(&format!("{card_id}00"))
        .map(|v| Rarity::new(&v.rarity))
        .unwrap_or_else(|| {
            tracing::warn!(id = %card_id, "default variation missing, rarity unknown");
            Rarity::new("")
        });
    let card_type = record.card_type.parse::<CardType>().unwrap_or_else(|()| {
        tracing::warn!(id = %card_id, card_type = %record.card_type, "unknown card type, using bronze");
        CardType::Bronze
    });

    Ok(CardDescriptor {
        faction: Faction::from_catalog(&record.faction),
        card_type,
        rarity,
        strength: record
            .strength
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(0),
        slot: RenderSlot::from_parts(
            is_spy(&record.loyalties),
            derive_position(&record.positions),
        ),
        counter_turns: extract_counter(record.description(locale)),
        artwork: ArtworkSource::Catalog {
            id: card_id.clone(),
        },
        id: Some(card_id),
    })
}

// ============================================================================
// Custom mapping
// ============================================================================

pub const DEFAULT_CUSTOM_FILENAME: &str = "default";

/// Keys understood by [`map_custom_parameters`].
pub const CUSTOM_KEYS: [&str; 8] = [
    "filename", "faction", "type", "rarity", "strength", "position", "spy", "count",
];

/// Splits `key=value` arguments. Tokens without `=` are dropped.
pub fn parse_custom_args<S: AsRef<str>>(args: &[S]) -> Vec<(String, String)> {
    args.iter()
        .filter_map(|arg| {
            let (key, value) = arg.as_ref().split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Builds a descriptor for a custom card, starting from defaults and
/// overriding only recognized keys.
pub fn map_custom_parameters<K, V>(params: &[(K, V)]) -> CardDescriptor
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut descriptor = CardDescriptor::default();
    let mut position = None;
    let mut spy = false;

    for (key, value) in params {
        let value = value.as_ref();
        match key.as_ref() {
            "filename" if !value.is_empty() => {
                descriptor.artwork = ArtworkSource::Custom {
                    filename: value.to_string(),
                };
            }
            "faction" => {
                descriptor.faction = value
                    .parse::<Faction>()
                    .unwrap_or_else(|()| Faction::from_catalog(value));
            }
            "type" => descriptor.card_type = value.parse::<CardType>().unwrap_or_default(),
            "rarity" if !value.is_empty() => descriptor.rarity = Rarity::new(value),
            "strength" => descriptor.strength = value.parse::<u32>().unwrap_or(0),
            "position" => position = value.parse::<Position>().ok(),
            "spy" => {
                spy = matches!(
                    value.to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes"
                )
            }
            "count" => {
                descriptor.counter_turns = value.parse::<u32>().ok().and_then(NonZeroU32::new)
            }
            other => {
                tracing::debug!(key = other, known = ?CUSTOM_KEYS, "ignoring custom parameter")
            }
        }
    }
    descriptor.slot = RenderSlot::from_parts(spy, position);

    descriptor
}

/// Custom artwork file name, with `.png` assumed when no extension is given.
pub fn custom_artwork_file(filename: &str) -> String {
    if Path::new(filename).extension().is_some() {
        filename.to_string()
    } else {
        format!("{filename}.png")
    }
}

/// Output folder name for a custom card: the file name without extension.
pub fn custom_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_CUSTOM_FILENAME.to_string())
}

// ============================================================================
// Tests
// ============================================================================
