use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DomainError;

/// Collector numbers without any leading digit ("★", "") sort after every
/// numbered card.
pub const UNNUMBERED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythic,
    /// Anything the backend reports outside the four print tiers
    /// (`special`, `bonus`, ...).
    Special,
}

impl Rarity {
    pub const TIERS: [Rarity; 4] = [Self::Common, Self::Uncommon, Self::Rare, Self::Mythic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Mythic => "mythic",
            Self::Special => "special",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Mythic => "Mythic",
            Self::Special => "Special",
        }
    }
}

impl From<String> for Rarity {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "common" => Self::Common,
            "uncommon" => Self::Uncommon,
            "rare" => Self::Rare,
            "mythic" => Self::Mythic,
            _ => Self::Special,
        }
    }
}

impl FromStr for Rarity {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match Rarity::from(value.to_string()) {
            Rarity::Special => Err(DomainError::UnknownOption {
                kind: "rarity",
                value: value.to_string(),
            }),
            tier => Ok(tier),
        }
    }
}

impl Serialize for Rarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Display for Rarity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One card of the collection snapshot served by `GET /api/cards`.
///
/// `name` is the identity used by every selection update; only `checked`
/// ever changes on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub price: f64,
    #[serde(
        default = "unnumbered",
        deserialize_with = "deserialize_collector_number"
    )]
    pub collector_number: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub booster: bool,
    #[serde(default)]
    pub checked: bool,
}

impl Card {
    pub fn new(name: impl Into<String>, rarity: Rarity, collector_number: u32, price: f64) -> Self {
        Self {
            name: name.into(),
            rarity,
            price,
            collector_number,
            image_url: None,
            booster: false,
            checked: false,
        }
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_booster(mut self, booster: bool) -> Self {
        self.booster = booster;
        self
    }
}

fn unnumbered() -> u32 {
    UNNUMBERED
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollectorNumber {
    Number(u64),
    Text(String),
}

fn deserialize_collector_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCollectorNumber::deserialize(deserializer)? {
        RawCollectorNumber::Number(value) => u32::try_from(value).unwrap_or(UNNUMBERED),
        RawCollectorNumber::Text(text) => parse_collector_number(&text),
    })
}

/// Reads the leading digits of a printed collector number ("123a" -> 123).
pub fn parse_collector_number(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(UNNUMBERED)
}
