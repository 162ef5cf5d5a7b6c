//! User-created cards and their persistence
//!
//! Custom cards let a group play with their own secrets. They are kept in a
//! [`CustomCardStore`], which in practice is a thin JSON layer over some
//! key-value storage (browser local storage, a file, ...). The engine only
//! relies on the load/save contract and never assumes a storage medium.

use std::collections::HashMap;

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    card::{Card, CardId, is_web_url},
    constants::custom_card::{DEFAULT_EMOJI, MAX_IMAGE_URL_LENGTH, MAX_NAME_LENGTH, STORAGE_KEY},
};

/// Errors that can occur while managing custom cards
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The underlying storage has no room left for the card list
    #[error("custom card storage is full")]
    StorageFull,
    /// The stored card list could not be decoded
    #[error("stored custom cards are corrupted: {0}")]
    Corrupted(String),
    /// The card name is empty or contains only whitespace
    #[error("card name cannot be empty")]
    Empty,
    /// The card name exceeds the maximum allowed length
    #[error("card name is too long")]
    TooLong,
    /// The card name contains inappropriate content
    #[error("card name is inappropriate")]
    Sinful,
    /// The image URL is not an http or https URL
    #[error("image URL must start with http:// or https://")]
    InvalidImageUrl,
    /// No custom card has the given id
    #[error("no custom card with id {0}")]
    UnknownCard(CardId),
}

/// Persists the list of custom cards
pub trait CustomCardStore {
    /// Loads every saved custom card, in insertion order
    ///
    /// # Errors
    ///
    /// Returns `Error::Corrupted` if the saved data cannot be decoded.
    fn load_custom_cards(&self) -> Result<Vec<Card>, Error>;

    /// Replaces the saved custom cards with `cards`
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageFull` if the storage cannot hold the list.
    fn save_custom_cards(&mut self, cards: &[Card]) -> Result<(), Error>;
}

/// Minimal string key-value storage
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageFull` if the value does not fit.
    fn set(&mut self, key: &str, value: String) -> Result<(), Error>;
}

/// In-memory key-value storage with an optional size quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates a store that rejects writes once keys and values exceed `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        if self
            .quota
            .is_some_and(|quota| self.used_without(key) + key.len() + value.len() > quota)
        {
            return Err(Error::StorageFull);
        }
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Stores custom cards as a JSON array under [`STORAGE_KEY`]
#[derive(Debug, Clone, Default)]
pub struct KeyValueCardStore<K> {
    storage: K,
}

impl<K: KeyValueStore> KeyValueCardStore<K> {
    /// Wraps a key-value storage
    pub fn new(storage: K) -> Self {
        Self { storage }
    }

    /// Returns the underlying storage
    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl<K: KeyValueStore> CustomCardStore for KeyValueCardStore<K> {
    fn load_custom_cards(&self) -> Result<Vec<Card>, Error> {
        match self.storage.get(STORAGE_KEY) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| Error::Corrupted(e.to_string())),
        }
    }

    fn save_custom_cards(&mut self, cards: &[Card]) -> Result<(), Error> {
        let raw = serde_json::to_string(cards).map_err(|e| Error::Corrupted(e.to_string()))?;
        self.storage.set(STORAGE_KEY, raw)
    }
}

/// User input describing a custom card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDraft {
    /// Name of the card, trimmed before use
    pub name: String,
    /// Emoji glyph shown when there is no image
    pub emoji: Option<String>,
    /// Optional http(s) image URL, takes precedence over the emoji
    pub image_url: Option<String>,
}

impl CardDraft {
    /// Creates a draft with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validates the draft and returns the cleaned name and display reference
    ///
    /// # Errors
    ///
    /// * `Error::Empty` - Name is empty after trimming whitespace
    /// * `Error::TooLong` - Name exceeds the maximum length
    /// * `Error::Sinful` - Name contains inappropriate content
    /// * `Error::InvalidImageUrl` - Image URL is present but not http(s)
    pub fn validate(&self) -> Result<(String, String), Error> {
        let name = rustrict::trim_whitespace(&self.name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::TooLong);
        }
        if name.is_inappropriate() {
            return Err(Error::Sinful);
        }

        let image_url = self
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let display_ref = match image_url {
            Some(url) if url.len() <= MAX_IMAGE_URL_LENGTH && is_web_url(url) => url.to_owned(),
            Some(_) => return Err(Error::InvalidImageUrl),
            None => self
                .emoji
                .as_deref()
                .map(str::trim)
                .filter(|emoji| !emoji.is_empty())
                .unwrap_or(DEFAULT_EMOJI)
                .to_owned(),
        };

        Ok((name.to_owned(), display_ref))
    }
}

/// Keeps the user's custom cards in sync with their store
///
/// Every mutation is saved immediately. When the store refuses a write the
/// in-memory list keeps its previous content, so the list always mirrors
/// what has been persisted.
#[derive(Debug, Clone, Default)]
pub struct CustomCards {
    cards: Vec<Card>,
}

impl CustomCards {
    /// Loads the saved cards from `store`
    ///
    /// # Errors
    ///
    /// Returns `Error::Corrupted` if the saved data cannot be decoded.
    pub fn load<S: CustomCardStore + ?Sized>(store: &S) -> Result<Self, Error> {
        let cards = store.load_custom_cards()?;
        debug!(count = cards.len(), "Loaded custom cards");
        Ok(Self { cards })
    }

    /// Returns the current cards
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Validates `draft`, appends it as a new card and saves the list
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad draft, or `Error::StorageFull`
    /// if the list cannot be saved.
    pub fn add<S: CustomCardStore + ?Sized>(
        &mut self,
        draft: &CardDraft,
        store: &mut S,
    ) -> Result<Card, Error> {
        let (name, display_ref) = draft.validate()?;
        let card = Card::custom(self.next_id(), name, display_ref);

        let mut cards = self.cards.clone();
        cards.push(card.clone());
        self.commit(cards, store)?;

        Ok(card)
    }

    /// Replaces the name and display reference of an existing card
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCard` if no card has `id`, a validation error
    /// for a bad draft, or `Error::StorageFull` if the list cannot be saved.
    pub fn edit<S: CustomCardStore + ?Sized>(
        &mut self,
        id: CardId,
        draft: &CardDraft,
        store: &mut S,
    ) -> Result<Card, Error> {
        let (name, display_ref) = draft.validate()?;

        let mut cards = self.cards.clone();
        let card = cards
            .iter_mut()
            .find(|card| card.id == id)
            .ok_or(Error::UnknownCard(id))?;
        card.name = name;
        card.display_ref = display_ref;
        let edited = card.clone();

        self.commit(cards, store)?;

        Ok(edited)
    }

    /// Removes the card with `id` and saves the list
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownCard` if no card has `id`, or
    /// `Error::StorageFull` if the list cannot be saved.
    pub fn remove<S: CustomCardStore + ?Sized>(
        &mut self,
        id: CardId,
        store: &mut S,
    ) -> Result<(), Error> {
        if !self.cards.iter().any(|card| card.id == id) {
            return Err(Error::UnknownCard(id));
        }

        let cards = self
            .cards
            .iter()
            .filter(|card| card.id != id)
            .cloned()
            .collect();
        self.commit(cards, store)
    }

    fn commit<S: CustomCardStore + ?Sized>(
        &mut self,
        cards: Vec<Card>,
        store: &mut S,
    ) -> Result<(), Error> {
        if let Err(e) = store.save_custom_cards(&cards) {
            warn!(error = %e, "Failed to save custom cards");
            return Err(e);
        }
        self.cards = cards;
        Ok(())
    }

    /// Ids follow the wall clock in milliseconds, bumped past existing ids
    fn next_id(&self) -> u64 {
        let now = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);

        let highest = self.cards.iter().map(|card| card.id.get()).max();

        match highest {
            Some(highest) if highest >= now => highest + 1,
            _ => now,
        }
    }
}
