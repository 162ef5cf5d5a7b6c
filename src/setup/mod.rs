//! Session setup: role assignment and card distribution
//!
//! This module turns a start request into an immutable [`GameSession`]. It
//! validates the requested counts, resolves the card pool from the chosen
//! source, shuffles the roles across seats and hands out cards according to
//! the secrecy rules of the selected game mode.

use serde::Serialize;
use thiserror::Error;

pub mod allocator;
pub mod builder;
pub mod config;
pub mod pool;
pub mod roles;

pub use allocator::{Allocation, allocate};
pub use builder::{GameSession, Player, build_session};
pub use config::{Counts, GameConfig, GameMode, ModeInfo, Timing};
pub use pool::resolve_pool;
pub use roles::{Role, assign_roles};

/// Errors that can occur while setting up a session
#[derive(Error, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad player or impostor counts, or an unknown game mode
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The card pool is too small for the chosen mode
    #[error("{mode} needs {required} distinct cards but only {available} are available")]
    InsufficientCards {
        /// The mode that was requested
        mode: GameMode,
        /// Distinct cards the mode needs
        required: usize,
        /// Distinct cards found in the pool
        available: usize,
    },
    /// The card catalog failed
    #[error(transparent)]
    Catalog(#[from] crate::catalog::Error),
    /// The custom card store failed
    #[error(transparent)]
    CustomCards(#[from] crate::custom::Error),
}
