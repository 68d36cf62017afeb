//! In-memory card catalog loaded from the gwent-data JSON export.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CardError, Result};

/// One card record as it appears in the catalog.
///
/// Only the fields needed for composition are kept; everything else in the
/// export is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "flag")]
    pub released: bool,
    pub faction: String,
    pub loyalties: Vec<String>,
    pub positions: Vec<String>,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(deserialize_with = "optional_id")]
    pub ingame_id: Option<String>,
    pub strength: Option<i64>,
    pub variations: HashMap<String, Variation>,
    pub info: HashMap<String, String>,
}

/// A printed variant of a card.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Variation {
    pub rarity: String,
}

impl CatalogRecord {
    /// Localized description text, empty when the locale is missing.
    pub fn description(&self, locale: &str) -> &str {
        self.info.get(locale).map(String::as_str).unwrap_or_default()
    }
}

/// The whole catalog, keyed by card id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: BTreeMap<String, CatalogRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| CardError::catalog(format!("open '{}': {e}", path.display())))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CardError::catalog(format!("parse '{}': {e}", path.display())))?;
        Self::from_value(value)
    }

    /// Parses a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CardError::catalog(e.to_string()))?;
        Self::from_value(value)
    }

    /// Accepts either an object keyed by card id or a wrapper (array or
    /// single-key object) whose first value is that object.
    fn from_value(value: Value) -> Result<Self> {
        let cards = match value {
            Value::Array(items) => items.into_iter().next(),
            Value::Object(map)
                if map.len() == 1
                    && map
                        .iter()
                        .next()
                        .is_some_and(|(key, inner)| is_wrapper(key, inner)) =>
            {
                map.into_iter().next().map(|(_, v)| v)
            }
            other => Some(other),
        };

        let Some(cards) = cards else {
            return Ok(Self::new());
        };

        let records: BTreeMap<String, CatalogRecord> = serde_json::from_value(cards)
            .map_err(|e| CardError::catalog(format!("malformed card record: {e}")))?;
        Ok(Self { records })
    }

    pub fn get(&self, id: &str) -> Option<&CatalogRecord> {
        self.records.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, record: CatalogRecord) {
        self.records.insert(id.into(), record);
    }

    /// All card ids in ascending order.
    pub fn ids(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Card ids are numeric, so a lone numeric key is a one-card catalog and
/// anything else holding an object of objects is a wrapper.
fn is_wrapper(key: &str, inner: &Value) -> bool {
    let numeric = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
    !numeric
        && inner
            .as_object()
            .is_some_and(|cards| cards.values().all(Value::is_object))
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "152101": {
            "released": 1,
            "faction": "Monster",
            "loyalties": ["Loyal"],
            "positions": ["Melee"],
            "type": "Gold",
            "ingameId": "152101",
            "strength": 11,
            "variations": { "15210100": { "rarity": "Legendary" } },
            "info": { "en-US": "Deploy: Counter : 3" },
            "flavor": { "en-US": "ignored" }
        },
        "112101": { "released": false, "faction": "Skellige", "ingameId": 112101 }
    }"#;

    #[test]
    fn parses_records_keyed_by_id() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.ids(), vec!["112101".to_string(), "152101".to_string()]);

        let record = catalog.get("152101").unwrap();
        assert!(record.released);
        assert_eq!(record.card_type, "Gold");
        assert_eq!(record.strength, Some(11));
        assert_eq!(record.variations["15210100"].rarity, "Legendary");
        assert_eq!(record.description("en-US"), "Deploy: Counter : 3");
        assert_eq!(record.description("fr-FR"), "");
    }

    #[test]
    fn accepts_integer_ids_and_boolean_flags() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let record = catalog.get("112101").unwrap();
        assert!(!record.released);
        assert_eq!(record.ingame_id.as_deref(), Some("112101"));
        assert!(record.positions.is_empty());
        assert!(record.strength.is_none());
    }

    #[test]
    fn unwraps_first_top_level_value() {
        let wrapped = format!("[{CATALOG}]");
        assert_eq!(Catalog::from_json(&wrapped).unwrap().len(), 2);

        let keyed = format!(r#"{{ "cards": {CATALOG} }}"#);
        assert_eq!(Catalog::from_json(&keyed).unwrap().len(), 2);
    }

    #[test]
    fn single_card_catalog_keeps_its_id() {
        let json = r#"{ "201": { "released": true, "faction": "Neutral" } }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.ids(), vec!["201".to_string()]);
    }

    #[test]
    fn single_card_with_only_object_fields_is_not_a_wrapper() {
        let json = r#"{ "201": {
            "variations": { "20100": { "rarity": "Rare" } },
            "info": { "en-US": "Counter : 2" }
        } }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.ids(), vec!["201".to_string()]);
        let record = catalog.get("201").unwrap();
        assert_eq!(record.variations["20100"].rarity, "Rare");
    }

    #[test]
    fn malformed_catalog_is_a_catalog_error() {
        let err = Catalog::from_json("{ not json").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Catalog);
    }
}
