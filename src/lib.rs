//! # Impostor Game Library
//!
//! This library provides the core logic of a shared-device impostor party
//! game. A round secretly assigns the impostor role to some of the players,
//! draws a secret card from a card pool and hands each seat the card it is
//! allowed to see, then drives the device from seat to seat and through the
//! group discussion.
//!
//! The crate is split the same way a round unfolds:
//!
//! * [`card`], [`catalog`] and [`custom`] describe the cards and where they
//!   come from.
//! * [`setup`] validates a start request and builds the immutable
//!   [`GameSession`] of a round.
//! * [`game`] is the turn and phase state machine, talking to the front end
//!   through the [`session::Presenter`] trait.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod card;
pub mod catalog;
pub mod constants;
pub mod custom;
pub mod game;
pub mod rng;
pub mod session;
pub mod setup;

pub use card::{Card, CardId, CardSource};
pub use game::{AlarmMessage, Game, IncomingMessage, Phase, SyncMessage, UpdateMessage};
pub use setup::{GameConfig, GameMode, GameSession, Player, Role};
