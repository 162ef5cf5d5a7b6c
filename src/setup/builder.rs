//! Composition of roles, cards and configuration into a session

use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::{card::Card, rng::RandomSource};

use super::{
    Counts, Error, GameConfig, GameMode, Role,
    allocator::{self, Allocation},
    roles,
};

/// A participant of the round, identified by seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    seat_number: usize,
    role: Role,
    assigned_card: Option<Card>,
}

impl Player {
    /// Seat of the player, starting at 1
    pub fn seat_number(&self) -> usize {
        self.seat_number
    }

    /// Secret role of the player
    pub fn role(&self) -> Role {
        self.role
    }

    /// The card this player is allowed to see, if any
    pub fn assigned_card(&self) -> Option<&Card> {
        self.assigned_card.as_ref()
    }
}

/// Everything decided at the start of a round
///
/// A session never changes once built. Phase transitions only move the
/// cursor held by the game, never the roles or the cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    config: GameConfig,
    secret_card: Card,
    secondary_card: Option<Card>,
    players: Vec<Player>,
}

impl GameSession {
    /// Configuration the session was built with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Mode of the session
    pub fn mode(&self) -> GameMode {
        self.config.mode()
    }

    /// The secret card of the round
    pub fn secret_card(&self) -> &Card {
        &self.secret_card
    }

    /// The second card of spy and double trouble rounds
    pub fn secondary_card(&self) -> Option<&Card> {
        self.secondary_card.as_ref()
    }

    /// Players in seat order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of players
    pub fn players_count(&self) -> usize {
        self.players.len()
    }

    /// Player sitting at zero-based `index`
    pub fn player_at(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    /// Seat numbers of every impostor, ascending
    pub fn impostor_seats(&self) -> Vec<usize> {
        self.players
            .iter()
            .filter(|player| player.role.is_impostor())
            .map(Player::seat_number)
            .collect_vec()
    }
}

/// Builds the session of a new round
///
/// Counts and pool are validated before anything is drawn, then roles are
/// shuffled across seats and cards are allocated per the mode rules. Given
/// a seeded `rng` the result is fully reproducible.
///
/// # Arguments
///
/// * `pool` - Cards the secret is drawn from
/// * `players_count` - Number of seats
/// * `impostors_count` - Number of impostors among the seats
/// * `mode` - Game mode of the round
/// * `rng` - Source of randomness for every draw
///
/// # Errors
///
/// * `Error::InvalidConfig` - The counts are out of bounds
/// * `Error::InsufficientCards` - The pool is too small for `mode`
pub fn build_session<R: RandomSource + ?Sized>(
    pool: &[Card],
    players_count: usize,
    impostors_count: usize,
    mode: GameMode,
    rng: &mut R,
) -> Result<GameSession, Error> {
    let counts = Counts::new(players_count, impostors_count)?;
    allocator::ensure_pool(pool, mode)?;

    let roles = roles::assign_roles(players_count, impostors_count, rng)?;
    let Allocation {
        secret_card,
        secondary_card,
        per_seat,
    } = allocator::allocate(pool, &roles, mode, rng)?;

    let players = roles
        .into_iter()
        .zip(per_seat)
        .enumerate()
        .map(|(index, (role, assigned_card))| Player {
            seat_number: index + 1,
            role,
            assigned_card,
        })
        .collect_vec();

    info!(
        %mode,
        players = players_count,
        impostors = impostors_count,
        pool = pool.len(),
        "Session built"
    );

    Ok(GameSession {
        config: GameConfig::new(mode, counts),
        secret_card,
        secondary_card,
        players,
    })
}
