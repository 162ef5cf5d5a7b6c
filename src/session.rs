//! Presentation layer seam
//!
//! The engine never renders anything itself. Every phase change is pushed to
//! a [`Presenter`] as a full [`SyncMessage`], and timer ticks are pushed as
//! small [`UpdateMessage`]s, so any front end (terminal, web view, test
//! recorder) can drive the shared device.

use crate::game::{SyncMessage, UpdateMessage};

/// Receives the views produced by the engine
pub trait Presenter {
    /// Replaces the whole screen with `state`
    ///
    /// Sent on every phase change, and whenever the caller asks the game to
    /// resynchronize its view.
    ///
    /// # Arguments
    ///
    /// * `state` - The view of the current phase
    fn send_state(&self, state: &SyncMessage);

    /// Applies a partial change to the current screen
    ///
    /// # Arguments
    ///
    /// * `update` - The change to apply, such as a clock tick
    fn send_update(&self, update: &UpdateMessage);
}
