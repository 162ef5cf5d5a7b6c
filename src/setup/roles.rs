//! Role distribution across seats

use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};

use crate::rng::{self, RandomSource};

use super::Error;

/// The secret role of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Has to bluff without (full) knowledge of the secret card
    Impostor,
    /// Knows the secret card and has to prove it
    NotImpostor,
}

impl Role {
    /// Whether this is the impostor role
    pub fn is_impostor(self) -> bool {
        matches!(self, Self::Impostor)
    }
}

/// Assigns one role per seat, uniformly shuffled
///
/// The roles are laid out in canonical order (every impostor first) and then
/// shuffled, so every arrangement of the multiset is equally likely and the
/// seat number carries no information about the role.
///
/// # Arguments
///
/// * `players_count` - Number of seats
/// * `impostors_count` - Number of seats that get [`Role::Impostor`]
/// * `rng` - Source of randomness for the shuffle
///
/// # Errors
///
/// Returns `Error::InvalidConfig` if `impostors_count` is zero or not lower
/// than `players_count`.
pub fn assign_roles<R: RandomSource + ?Sized>(
    players_count: usize,
    impostors_count: usize,
    rng: &mut R,
) -> Result<Vec<Role>, Error> {
    if impostors_count < 1 || impostors_count >= players_count {
        return Err(Error::InvalidConfig(format!(
            "{impostors_count} impostors cannot play among {players_count} players"
        )));
    }

    let mut roles = std::iter::repeat_n(Role::Impostor, impostors_count)
        .chain(std::iter::repeat_n(
            Role::NotImpostor,
            players_count - impostors_count,
        ))
        .collect::<Vec<_>>();

    rng::shuffle(&mut roles, rng);

    Ok(roles)
}

/// Counts how many seats hold each role
pub fn role_counts(roles: &[Role]) -> EnumMap<Role, usize> {
    let mut counts = EnumMap::default();
    for role in roles {
        counts[*role] += 1;
    }
    counts
}
