//! Game modes and validated round configuration
//!
//! Every mode shares the same player/impostor counts; only the lightning
//! mode carries extra timing. [`GameConfig`] keeps all of them in one tagged
//! enum so the rest of the engine handles a single configuration shape.

use std::{fmt::Display, str::FromStr, time::Duration};

use garde::Validate;
use heck::ToShoutySnakeCase;
use serde::{Deserialize, Serialize};

use crate::constants::{
    players::{MAX_IMPOSTORS, MAX_PLAYERS, MIN_IMPOSTORS, MIN_PLAYERS},
    relampago,
};

use super::Error;

/// The selectable game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// Impostors see no card and must bluff blind
    #[default]
    Classic,
    /// Impostors see a different card and are not told they are impostors
    Spy,
    /// Non-impostors are split between two different cards
    DoubleTrouble,
    /// Classic rules with a short reveal window and a round countdown
    Relampago,
}

/// Presentation information about a game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    /// The mode being described
    pub mode: GameMode,
    /// Short display name
    pub name: &'static str,
    /// One line description of the rules
    pub description: &'static str,
    /// Emoji shown next to the name
    pub icon: &'static str,
}

impl GameMode {
    /// All modes in display order
    pub const ALL: [Self; 4] = [Self::Classic, Self::Spy, Self::DoubleTrouble, Self::Relampago];

    /// Distinct cards a pool must contain for this mode
    pub fn min_distinct_cards(self) -> usize {
        match self {
            Self::Classic | Self::Relampago => 1,
            Self::Spy | Self::DoubleTrouble => 2,
        }
    }

    /// Whether the phases of this mode advance on timers
    pub fn is_timed(self) -> bool {
        matches!(self, Self::Relampago)
    }

    /// Wire name of the mode
    pub fn code(self) -> &'static str {
        match self {
            Self::Classic => "CLASSIC",
            Self::Spy => "SPY",
            Self::DoubleTrouble => "DOUBLE_TROUBLE",
            Self::Relampago => "RELAMPAGO",
        }
    }

    /// Returns the display information of this mode
    pub fn info(self) -> ModeInfo {
        let (name, description, icon) = match self {
            Self::Classic => (
                "Classic",
                "The impostor sees no card and has to bluff",
                "🎭",
            ),
            Self::Spy => (
                "Spy",
                "The impostor sees a different card and does not know it!",
                "🕵️",
            ),
            Self::DoubleTrouble => (
                "Double Trouble",
                "Two secret cards split the crew, impostors see none",
                "👯",
            ),
            Self::Relampago => (
                "Lightning",
                "Classic rules against the clock",
                "⚡",
            ),
        };
        ModeInfo {
            mode: self,
            name,
            description,
            icon,
        }
    }
}

impl Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GameMode {
    type Err = Error;

    /// Parses a mode selector, ignoring case and separators
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for an unknown selector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_shouty_snake_case();
        Self::ALL
            .into_iter()
            .find(|mode| mode.code() == normalized)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown game mode `{}`", s.trim())))
    }
}

/// Validated player and impostor counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", try_from = "UncheckedCounts")]
pub struct Counts {
    /// Number of players sharing the device
    #[garde(range(min = MIN_PLAYERS, max = MAX_PLAYERS))]
    players_count: usize,
    /// Number of players secretly assigned the impostor role
    #[garde(range(min = MIN_IMPOSTORS, max = MAX_IMPOSTORS))]
    impostors_count: usize,
}

/// Counts as received on the wire, before validation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UncheckedCounts {
    players_count: usize,
    impostors_count: usize,
}

impl TryFrom<UncheckedCounts> for Counts {
    type Error = Error;

    fn try_from(value: UncheckedCounts) -> Result<Self, Self::Error> {
        Self::new(value.players_count, value.impostors_count)
    }
}

impl Counts {
    /// Validates a pair of counts
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` unless
    /// `1 <= impostors_count < players_count` and `3 <= players_count <= 10`.
    pub fn new(players_count: usize, impostors_count: usize) -> Result<Self, Error> {
        let counts = Self {
            players_count,
            impostors_count,
        };

        counts
            .validate()
            .map_err(|report| Error::InvalidConfig(report.to_string()))?;

        if impostors_count >= players_count {
            return Err(Error::InvalidConfig(format!(
                "impostors_count: {impostors_count} must be lower than the {players_count} players"
            )));
        }

        Ok(counts)
    }

    /// Number of players
    pub fn players_count(self) -> usize {
        self.players_count
    }

    /// Number of impostors
    pub fn impostors_count(self) -> usize {
        self.impostors_count
    }
}

/// Phase timing of the lightning mode
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    /// How long each seat sees its card
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub reveal: Duration,
    /// How long the group discussion lasts
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub round: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reveal: Duration::from_secs(relampago::REVEAL_SECONDS),
            round: Duration::from_secs(relampago::ROUND_SECONDS),
        }
    }
}

impl Timing {
    /// Reveal window in whole seconds
    pub fn reveal_seconds(self) -> u64 {
        self.reveal.as_secs()
    }

    /// Round window in whole seconds
    pub fn round_seconds(self) -> u64 {
        self.round.as_secs()
    }
}

/// Configuration of one round, tagged by mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameConfig {
    /// Classic rules
    Classic(Counts),
    /// Spy rules
    Spy(Counts),
    /// Double trouble rules
    DoubleTrouble(Counts),
    /// Classic rules with timers
    Relampago {
        /// Player and impostor counts
        counts: Counts,
        /// Reveal and round windows
        timing: Timing,
    },
}

impl GameConfig {
    /// Builds the configuration of `mode`, attaching the fixed timing constants when needed
    pub fn new(mode: GameMode, counts: Counts) -> Self {
        match mode {
            GameMode::Classic => Self::Classic(counts),
            GameMode::Spy => Self::Spy(counts),
            GameMode::DoubleTrouble => Self::DoubleTrouble(counts),
            GameMode::Relampago => Self::Relampago {
                counts,
                timing: Timing::default(),
            },
        }
    }

    /// The mode of this configuration
    pub fn mode(&self) -> GameMode {
        match self {
            Self::Classic(_) => GameMode::Classic,
            Self::Spy(_) => GameMode::Spy,
            Self::DoubleTrouble(_) => GameMode::DoubleTrouble,
            Self::Relampago { .. } => GameMode::Relampago,
        }
    }

    /// The player and impostor counts
    pub fn counts(&self) -> Counts {
        match self {
            Self::Classic(counts)
            | Self::Spy(counts)
            | Self::DoubleTrouble(counts)
            | Self::Relampago { counts, .. } => *counts,
        }
    }

    /// The phase timing, for timed modes only
    pub fn timing(&self) -> Option<Timing> {
        match self {
            Self::Relampago { timing, .. } => Some(*timing),
            _ => None,
        }
    }

    /// Number of players
    pub fn players_count(&self) -> usize {
        self.counts().players_count()
    }

    /// Number of impostors
    pub fn impostors_count(&self) -> usize {
        self.counts().impostors_count()
    }
}
