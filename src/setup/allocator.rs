//! Card allocation for every game mode
//!
//! The allocator draws the secret card(s) of a round from the pool and maps
//! every seat to the card it is allowed to see. The per-seat mapping is the
//! only channel through which a player learns the secret, so the rules below
//! are what keeps each mode honest:
//!
//! | Mode            | Non-impostor seats          | Impostor seats |
//! |-----------------|-----------------------------|----------------|
//! | Classic         | secret card                 | nothing        |
//! | Spy             | secret card                 | secondary card |
//! | Double trouble  | card A or card B, shuffled  | nothing        |
//! | Relampago       | secret card                 | nothing        |

use itertools::Itertools;
use serde::Serialize;

use crate::{
    card::{Card, distinct_ids},
    rng::{self, RandomSource},
};

use super::{Error, GameMode, Role, roles::role_counts};

/// The cards drawn for a round and what every seat sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// The card non-impostors are meant to recognize (card A in double trouble)
    pub secret_card: Card,
    /// The second card of spy and double trouble rounds
    pub secondary_card: Option<Card>,
    /// Card visible to each seat, in seat order
    pub per_seat: Vec<Option<Card>>,
}

/// Checks that `pool` holds enough distinct cards for `mode`
///
/// # Errors
///
/// Returns `Error::InsufficientCards` when the pool has fewer distinct ids
/// than [`GameMode::min_distinct_cards`].
pub fn ensure_pool(pool: &[Card], mode: GameMode) -> Result<(), Error> {
    let required = mode.min_distinct_cards();
    let available = distinct_ids(pool);

    if available < required {
        return Err(Error::InsufficientCards {
            mode,
            required,
            available,
        });
    }

    Ok(())
}

/// Draws a card whose id differs from `excluded`
///
/// Filtering before drawing means this always terminates, even when only one
/// other id exists in the pool.
fn draw_other<'a, R: RandomSource + ?Sized>(
    pool: &'a [Card],
    excluded: &Card,
    rng: &mut R,
) -> Option<&'a Card> {
    let others = pool.iter().filter(|card| card.id != excluded.id).collect_vec();
    rng::choose(&others, rng).copied()
}

fn insufficient(pool: &[Card], mode: GameMode) -> Error {
    Error::InsufficientCards {
        mode,
        required: mode.min_distinct_cards(),
        available: distinct_ids(pool),
    }
}

/// Allocates the cards of a round
///
/// # Arguments
///
/// * `pool` - Cards to draw from, duplicates allowed
/// * `roles` - Role of every seat, in seat order
/// * `mode` - Mode whose secrecy rules apply
/// * `rng` - Source of randomness for every draw
///
/// # Errors
///
/// Returns `Error::InsufficientCards` if the pool is too small for the mode.
/// The pool is checked before any card is drawn.
pub fn allocate<R: RandomSource + ?Sized>(
    pool: &[Card],
    roles: &[Role],
    mode: GameMode,
    rng: &mut R,
) -> Result<Allocation, Error> {
    ensure_pool(pool, mode)?;

    let secret_card = rng::choose(pool, rng)
        .cloned()
        .ok_or_else(|| insufficient(pool, mode))?;

    match mode {
        GameMode::Classic | GameMode::Relampago => {
            let per_seat = roles
                .iter()
                .map(|role| match role {
                    Role::Impostor => None,
                    Role::NotImpostor => Some(secret_card.clone()),
                })
                .collect();

            Ok(Allocation {
                secret_card,
                secondary_card: None,
                per_seat,
            })
        }
        GameMode::Spy => {
            let secondary_card = draw_other(pool, &secret_card, rng)
                .cloned()
                .ok_or_else(|| insufficient(pool, mode))?;

            let per_seat = roles
                .iter()
                .map(|role| match role {
                    Role::Impostor => Some(secondary_card.clone()),
                    Role::NotImpostor => Some(secret_card.clone()),
                })
                .collect();

            Ok(Allocation {
                secret_card,
                secondary_card: Some(secondary_card),
                per_seat,
            })
        }
        GameMode::DoubleTrouble => {
            let other_card = draw_other(pool, &secret_card, rng)
                .cloned()
                .ok_or_else(|| insufficient(pool, mode))?;

            let crew = role_counts(roles)[Role::NotImpostor];
            let first_half = crew.div_ceil(2);

            let mut crew_cards = std::iter::repeat_n(&secret_card, first_half)
                .chain(std::iter::repeat_n(&other_card, crew - first_half))
                .collect_vec();
            rng::shuffle(&mut crew_cards, rng);

            let mut crew_cards = crew_cards.into_iter();
            let per_seat = roles
                .iter()
                .map(|role| match role {
                    Role::Impostor => None,
                    Role::NotImpostor => crew_cards.next().cloned(),
                })
                .collect();

            Ok(Allocation {
                secret_card,
                secondary_card: Some(other_card),
                per_seat,
            })
        }
    }
}
