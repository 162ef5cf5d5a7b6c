//! Configuration constants for the impostor game engine
//!
//! This module contains the fixed limits and timing values used throughout
//! the engine to validate requests and drive the timed game mode.

/// Player and impostor count limits
pub mod players {
    /// Minimum number of players sharing the device
    pub const MIN_PLAYERS: usize = 3;
    /// Maximum number of players sharing the device
    pub const MAX_PLAYERS: usize = 10;
    /// Minimum number of impostors in a round
    pub const MIN_IMPOSTORS: usize = 1;
    /// Maximum number of impostors in a round (always fewer than the players)
    pub const MAX_IMPOSTORS: usize = MAX_PLAYERS - 1;
}

/// Timing of the lightning ("relâmpago") mode
pub mod relampago {
    /// Seconds each seat gets to look at its card before the device moves on
    pub const REVEAL_SECONDS: u64 = 3;
    /// Seconds of group discussion before the round ends on its own
    pub const ROUND_SECONDS: u64 = 90;
}

/// Cooperative timer configuration
pub mod timer {
    /// Seconds between two consecutive timer ticks
    pub const TICK_SECONDS: u64 = 1;
}

/// User-created card constraints
pub mod custom_card {
    /// Maximum length of a custom card name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
    /// Maximum length of a custom card image URL
    pub const MAX_IMAGE_URL_LENGTH: usize = 500;
    /// Glyph used when a custom card has neither an emoji nor an image
    pub const DEFAULT_EMOJI: &str = "🎴";
    /// Key under which custom cards are persisted in a key-value store
    pub const STORAGE_KEY: &str = "clash-impostor-custom-cards";
}
