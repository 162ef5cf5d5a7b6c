//! External card catalog
//!
//! The catalog is the remote collaborator that supplies the regular card
//! pool. Fetching over the network is out of scope for the engine; this
//! module defines the [`CardCatalog`] seam, decodes catalog payloads and
//! classifies catalog failures into the error taxonomy surfaced to players.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::card::Card;

/// Errors reported by the card catalog
///
/// Any catalog error is fatal to the session being built; the engine never
/// retries on its own.
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The catalog could not be reached or returned an unusable payload
    #[error("card catalog unavailable: {0}")]
    CatalogUnavailable(String),
    /// The catalog rejected the configured credentials
    #[error("card catalog rejected the credentials: {0}")]
    AuthError(String),
    /// The catalog is throttling requests
    #[error("card catalog rate limit reached, try again later")]
    RateLimited,
}

impl Error {
    /// Classifies a failed catalog response from its HTTP status and body
    ///
    /// The body is inspected for a JSON `reason` or `message` field so the
    /// upstream explanation can be surfaced to the player.
    pub fn from_status(status: u16, body: &str) -> Self {
        let reason = upstream_reason(body);

        match status {
            401 | 403 => {
                let lowered = body.to_lowercase();
                if lowered.contains("ip") || lowered.contains("address") {
                    Self::AuthError(
                        "the API key does not allow access from this IP address".to_owned(),
                    )
                } else {
                    Self::AuthError(
                        reason.unwrap_or_else(|| "invalid API key or missing permissions".to_owned()),
                    )
                }
            }
            429 => Self::RateLimited,
            _ => Self::CatalogUnavailable(reason.unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("unexpected status {status}")
                } else {
                    body.trim().to_owned()
                }
            })),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    reason: Option<String>,
    message: Option<String>,
}

fn upstream_reason(body: &str) -> Option<String> {
    let ErrorBody { reason, message } = serde_json::from_str(body).ok()?;
    reason.or(message)
}

/// A card as returned by the catalog
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItem {
    id: u64,
    name: String,
    icon_urls: IconUrls,
}

#[derive(Deserialize)]
struct IconUrls {
    medium: String,
}

#[derive(Deserialize)]
struct CatalogPayload {
    items: Option<Vec<CatalogItem>>,
}

/// Decodes a successful catalog response body into cards
///
/// # Errors
///
/// Returns `Error::CatalogUnavailable` if the body is not a catalog payload
/// or if it does not contain any card.
pub fn parse_cards(body: &str) -> Result<Vec<Card>, Error> {
    let payload: CatalogPayload = serde_json::from_str(body)
        .map_err(|e| Error::CatalogUnavailable(format!("invalid catalog payload: {e}")))?;

    match payload.items {
        Some(items) if !items.is_empty() => Ok(items
            .into_iter()
            .map(|item| Card::catalog(item.id, item.name, item.icon_urls.medium))
            .collect()),
        _ => Err(Error::CatalogUnavailable(
            "the catalog returned no cards".to_owned(),
        )),
    }
}

/// Supplies the regular card pool
pub trait CardCatalog {
    /// Fetches every card currently offered by the catalog
    ///
    /// # Errors
    ///
    /// Returns one of the catalog errors when the cards cannot be obtained.
    fn fetch_cards(&self) -> Result<Vec<Card>, Error>;
}

/// A catalog backed by a fixed list of cards
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<Card>);

impl CardCatalog for StaticCatalog {
    fn fetch_cards(&self) -> Result<Vec<Card>, Error> {
        Ok(self.0.clone())
    }
}

impl<F: Fn() -> Result<Vec<Card>, Error>> CardCatalog for F {
    fn fetch_cards(&self) -> Result<Vec<Card>, Error> {
        self()
    }
}
