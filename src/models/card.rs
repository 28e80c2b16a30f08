//! Card references and catalog metadata.

use serde::{Deserialize, Deserializer, Serialize};

/// Numeric card identifier as assigned by the game.
pub type CardId = u32;

/// A card as it appears inside a battle or player record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    /// Card identifier (identity)
    pub id: CardId,

    /// Display name at the time the battle was recorded
    #[serde(default)]
    pub name: String,

    /// Card level used in the battle
    #[serde(default)]
    pub level: Option<u32>,
}

impl CardRef {
    /// Create a new card reference.
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            level: None,
        }
    }
}

/// Card rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Epic => write!(f, "epic"),
            Rarity::Legendary => write!(f, "legendary"),
            Rarity::Champion => write!(f, "champion"),
            Rarity::Unknown => write!(f, "unknown"),
        }
    }
}

/// Icon URLs published with a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconUrls {
    #[serde(default)]
    pub medium: Option<String>,
}

/// Static catalog entry for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    /// Card identifier (unique in the catalog)
    pub id: CardId,

    /// Card name
    pub name: String,

    /// Elixir cost; tower troops and other support cards have none
    #[serde(default)]
    pub elixir_cost: Option<f64>,

    /// Rarity
    #[serde(default)]
    pub rarity: Option<Rarity>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub icon_urls: IconUrls,

    #[serde(default)]
    pub max_level: Option<u32>,

    /// Whether this is a support (tower troop) card
    #[serde(default, rename = "is_supportive_card")]
    pub is_supportive_card: bool,
}

impl CardMetadata {
    /// Create a catalog entry with only id and name set.
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            elixir_cost: None,
            rarity: None,
            icon_urls: IconUrls::default(),
            max_level: None,
            is_supportive_card: false,
        }
    }

    /// Builder method to set the elixir cost.
    pub fn with_elixir_cost(mut self, cost: f64) -> Self {
        self.elixir_cost = Some(cost);
        self
    }

    /// Builder method to set the rarity.
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    /// Builder method to set the medium icon URL.
    pub fn with_icon_url(mut self, url: impl Into<String>) -> Self {
        self.icon_urls.medium = Some(url.into());
        self
    }

    /// Medium-size icon URL, if published.
    pub fn icon_url(&self) -> Option<&str> {
        self.icon_urls.medium.as_deref()
    }
}

/// Deserialize an explicit `null` as the type's default.
///
/// Stored match records are inconsistent about absent arrays: some omit the
/// field, some write `null`. Both read as empty.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_metadata_from_catalog_json() {
        let json = r#"{
            "name": "Hog Rider",
            "id": 26000021,
            "maxLevel": 14,
            "rarity": "rare",
            "elixirCost": 4,
            "iconUrls": { "medium": "https://cdn.example/hog.png" }
        }"#;

        let card: CardMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(card.id, 26000021);
        assert_eq!(card.elixir_cost, Some(4.0));
        assert_eq!(card.rarity, Some(Rarity::Rare));
        assert_eq!(card.icon_url(), Some("https://cdn.example/hog.png"));
        assert!(!card.is_supportive_card);
    }

    #[test]
    fn test_card_metadata_missing_optional_fields() {
        let json = r#"{"name": "Tower Princess", "id": 159000000, "iconUrls": null}"#;
        let card: CardMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(card.elixir_cost, None);
        assert_eq!(card.rarity, None);
        assert_eq!(card.icon_url(), None);
    }

    #[test]
    fn test_unknown_rarity() {
        let rarity: Rarity = serde_json::from_str("\"mythic\"").unwrap();
        assert_eq!(rarity, Rarity::Unknown);
        assert_eq!(format!("{}", Rarity::Champion), "champion");
    }

    #[test]
    fn test_card_ref_without_name() {
        let card: CardRef = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(card, CardRef::new(7, ""));
    }
}
