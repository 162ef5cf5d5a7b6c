//! Cards and card sources
//!
//! A card is the secret information of a round. Cards come either from the
//! external card catalog or from the player's own custom cards; the engine
//! only cares about their identity, the name and an opaque display reference
//! (an emoji glyph or an image URL) that is forwarded to the presentation layer.

use std::hash::{Hash, Hasher};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Identifier of a card, unique within a card pool
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct CardId(u64);

impl CardId {
    /// Wraps a raw identifier
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A card that can be drawn as the secret of a round
///
/// Two cards are the same card if and only if their ids match, so equality
/// and hashing only look at [`Card::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Identity of the card within its pool
    pub id: CardId,
    /// Human readable name shown when the card is revealed
    pub name: String,
    /// Emoji glyph or image URL used to render the card
    pub display_ref: String,
    /// Whether the card was created by the user rather than fetched
    #[serde(default)]
    pub is_custom: bool,
}

impl Card {
    /// Creates a card coming from the external catalog
    pub fn catalog(id: u64, name: impl Into<String>, display_ref: impl Into<String>) -> Self {
        Self {
            id: CardId(id),
            name: name.into(),
            display_ref: display_ref.into(),
            is_custom: false,
        }
    }

    /// Creates a user-created card
    pub fn custom(id: u64, name: impl Into<String>, display_ref: impl Into<String>) -> Self {
        Self {
            is_custom: true,
            ..Self::catalog(id, name, display_ref)
        }
    }

    /// Whether the display reference points to an image rather than a glyph
    pub fn has_image(&self) -> bool {
        is_web_url(&self.display_ref)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Whether `value` looks like an `http://` or `https://` URL
pub(crate) fn is_web_url(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && value.len() > scheme.len()
    })
}

/// Counts the distinct card ids in a pool
pub fn distinct_ids(pool: &[Card]) -> usize {
    pool.iter().map(|card| card.id).unique().count()
}

/// Where the card pool of a round comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardSource {
    /// Only cards fetched from the external catalog
    #[default]
    Catalog,
    /// Only the user's custom cards
    Custom,
    /// Catalog cards followed by the user's custom cards
    Mixed,
}

/// Presentation information about a card source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    /// The source being described
    pub source: CardSource,
    /// Short display name
    pub name: &'static str,
    /// One line description
    pub description: &'static str,
    /// Emoji shown next to the name
    pub icon: &'static str,
}

impl CardSource {
    /// All card sources in display order
    pub const ALL: [Self; 3] = [Self::Catalog, Self::Custom, Self::Mixed];

    /// Returns the display information of this source
    pub fn info(self) -> SourceInfo {
        let (name, description, icon) = match self {
            Self::Catalog => ("Clash Royale", "Use only Clash Royale cards", "⚔️"),
            Self::Custom => ("Custom", "Use only your custom cards", "✨"),
            Self::Mixed => ("All", "Mix Clash cards with your custom cards", "🎲"),
        };
        SourceInfo {
            source: self,
            name,
            description,
            icon,
        }
    }

    /// Whether the catalog must be queried for this source
    pub fn uses_catalog(self) -> bool {
        matches!(self, Self::Catalog | Self::Mixed)
    }

    /// Whether the custom card store must be read for this source
    pub fn uses_custom(self) -> bool {
        matches!(self, Self::Custom | Self::Mixed)
    }
}
