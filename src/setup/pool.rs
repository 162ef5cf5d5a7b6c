//! Card pool resolution from the selected card source

use tracing::warn;

use crate::{
    card::{Card, CardSource},
    catalog::CardCatalog,
    custom::CustomCardStore,
};

use super::Error;

/// Gathers the card pool of a round from `source`
///
/// Mixed pools are the catalog cards followed by the custom cards, without
/// deduplication. If only one half of a mixed pool can be loaded and it
/// holds cards, that half is used alone.
///
/// # Errors
///
/// Returns the collaborator error of the source. For a mixed source this
/// happens when one half fails and the other half is empty or fails too. The
/// catalog error wins when both fail.
pub fn resolve_pool<C, S>(source: CardSource, catalog: &C, store: &S) -> Result<Vec<Card>, Error>
where
    C: CardCatalog + ?Sized,
    S: CustomCardStore + ?Sized,
{
    let catalog_cards = source.uses_catalog().then(|| catalog.fetch_cards());
    let custom_cards = source.uses_custom().then(|| store.load_custom_cards());

    match (catalog_cards, custom_cards) {
        (Some(cards), None) => Ok(cards?),
        (None, Some(custom)) => Ok(custom?),
        (Some(Ok(mut cards)), Some(Ok(custom))) => {
            cards.extend(custom);
            Ok(cards)
        }
        (Some(Ok(cards)), Some(Err(error))) if !cards.is_empty() => {
            warn!(%error, "Custom cards unavailable, using catalog cards only");
            Ok(cards)
        }
        (Some(Err(error)), Some(Ok(custom))) if !custom.is_empty() => {
            warn!(%error, "Card catalog unavailable, using custom cards only");
            Ok(custom)
        }
        (Some(Err(error)), Some(_)) => Err(error.into()),
        (Some(Ok(_)), Some(Err(error))) => Err(error.into()),
        (None, None) => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        catalog::{self, StaticCatalog},
        custom::{self, KeyValueCardStore, KeyValueStore, MemoryStore},
    };

    fn catalog_cards() -> StaticCatalog {
        StaticCatalog(vec![
            Card::catalog(1, "Knight", "https://cdn/knight.png"),
            Card::catalog(2, "Archers", "https://cdn/archers.png"),
        ])
    }

    fn custom_store() -> KeyValueCardStore<MemoryStore> {
        let mut store = KeyValueCardStore::new(MemoryStore::default());
        store
            .save_custom_cards(&[Card::custom(1, "Grandma", "👵")])
            .unwrap();
        store
    }

    fn corrupted_store() -> KeyValueCardStore<MemoryStore> {
        let mut storage = MemoryStore::default();
        storage
            .set(crate::constants::custom_card::STORAGE_KEY, "{oops".to_owned())
            .unwrap();
        KeyValueCardStore::new(storage)
    }

    fn empty_catalog() -> Result<Vec<Card>, catalog::Error> {
        Ok(Vec::new())
    }

    fn offline() -> Result<Vec<Card>, catalog::Error> {
        Err(catalog::Error::CatalogUnavailable("offline".to_owned()))
    }

    #[test]
    fn test_single_sources() {
        let pool = resolve_pool(CardSource::Catalog, &catalog_cards(), &custom_store()).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.iter().all(|card| !card.is_custom));

        let pool = resolve_pool(CardSource::Custom, &catalog_cards(), &custom_store()).unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool[0].is_custom);
    }

    #[test]
    fn test_mixed_concatenates_without_dedup() {
        let pool = resolve_pool(CardSource::Mixed, &catalog_cards(), &custom_store()).unwrap();

        assert_eq!(
            pool.iter().map(|card| card.name.as_str()).collect::<Vec<_>>(),
            vec!["Knight", "Archers", "Grandma"]
        );
        // the custom card shares id 1 with the knight and is kept anyway
        assert_eq!(pool[0], pool[2]);
    }

    #[test]
    fn test_mixed_degrades_to_one_half() {
        let pool = resolve_pool(CardSource::Mixed, &catalog_cards(), &corrupted_store()).unwrap();
        assert_eq!(pool.len(), 2);

        let pool = resolve_pool(CardSource::Mixed, &offline, &custom_store()).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_errors_propagate() {
        assert_eq!(
            resolve_pool(CardSource::Catalog, &offline, &custom_store()),
            Err(Error::Catalog(catalog::Error::CatalogUnavailable(
                "offline".to_owned()
            )))
        );
        assert!(matches!(
            resolve_pool(CardSource::Custom, &catalog_cards(), &corrupted_store()),
            Err(Error::CustomCards(custom::Error::Corrupted(_)))
        ));
        assert!(matches!(
            resolve_pool(CardSource::Mixed, &offline, &corrupted_store()),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_mixed_surfaces_failure_when_other_half_is_empty() {
        let empty_store = KeyValueCardStore::new(MemoryStore::default());
        assert_eq!(
            resolve_pool(CardSource::Mixed, &offline, &empty_store),
            Err(Error::Catalog(catalog::Error::CatalogUnavailable(
                "offline".to_owned()
            )))
        );

        assert!(matches!(
            resolve_pool(CardSource::Mixed, &empty_catalog, &corrupted_store()),
            Err(Error::CustomCards(custom::Error::Corrupted(_)))
        ));

        // an empty half next to a healthy one is not an error
        let pool = resolve_pool(CardSource::Mixed, &catalog_cards(), &empty_store).unwrap();
        assert_eq!(pool.len(), 2);
    }
}
