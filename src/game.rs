//! Turn and phase state machine
//!
//! A [`Game`] drives one shared device through a round: choosing the mode,
//! entering the player counts, passing the device to every seat for a
//! private reveal, then the group discussion and the final reveal of the
//! impostors. The game owns the current [`GameSession`] and the phase
//! [`Cursor`]; the presentation layer only ever sees the views it is sent.
//!
//! Timers are cooperative. Entering a timed phase hands a [`AlarmMessage`]
//! to the caller's scheduler, and the caller feeds it back through
//! [`Game::receive_alarm`] once the delay has elapsed. Only one timer is
//! active at a time, and leaving a phase invalidates it, so an alarm that
//! was scheduled for an earlier phase or round is silently dropped.

use derive_where::derive_where;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, info};

use crate::{
    card::{Card, CardSource, SourceInfo},
    catalog::CardCatalog,
    constants::{
        players::{MAX_PLAYERS, MIN_PLAYERS},
        timer::TICK_SECONDS,
    },
    custom::CustomCardStore,
    rng::{self, RandomSource},
    session::Presenter,
    setup::{self, GameMode, GameSession, ModeInfo, Timing},
};

/// The screens a round goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Choosing the game mode
    #[default]
    ModeSelect,
    /// Entering the player and impostor counts
    Start,
    /// Handing the device to the current seat
    Pass,
    /// The current seat privately looks at its card
    Reveal,
    /// Group discussion
    Playing,
    /// The impostors are revealed
    GameEnd,
}

/// Position of the game within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    /// Current phase
    pub phase: Phase,
    /// Zero-based index of the seat holding the device
    pub current_seat_index: usize,
    /// Seconds elapsed in the current timed phase
    pub elapsed_seconds: u64,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    /// Someone asked to reveal the impostors
    ImpostorsRevealed,
    /// The round countdown ran out
    TimeUp,
}

/// Identifies one started timer
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct TimerId(u64);

/// Messages scheduled by the game to be delivered back after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One second of a timed phase has elapsed
    Tick {
        /// The timer this tick belongs to
        timer: TimerId,
    },
}

/// Parameters of a new round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Number of players sharing the device
    pub players_count: usize,
    /// Number of impostors among them
    pub impostors_count: usize,
    /// Game mode of the round
    pub mode: GameMode,
    /// Where the card pool comes from
    #[serde(default)]
    pub card_source: CardSource,
}

impl StartRequest {
    /// Creates a request from a free-form mode selector
    ///
    /// # Errors
    ///
    /// Returns `setup::Error::InvalidConfig` if `mode` names no game mode.
    pub fn new(
        players_count: usize,
        impostors_count: usize,
        mode: &str,
        card_source: CardSource,
    ) -> Result<Self, setup::Error> {
        Ok(Self {
            players_count,
            impostors_count,
            mode: mode.parse()?,
            card_source,
        })
    }
}

/// Actions sent by the presentation layer
#[derive(Debug, Clone, Copy, Deserialize)]
pub enum IncomingMessage {
    /// Pick a mode on the mode selection screen
    SelectMode(GameMode),
    /// Go back from the start screen to the mode selection screen
    ChangeMode,
    /// Build a session and start the round
    StartSession(StartRequest),
    /// The seat holding the device is ready to look
    Ready,
    /// The seat holding the device has seen its card
    Seen,
    /// End the discussion and reveal the impostors
    RevealImpostors,
    /// Discard the round and go back to mode selection
    Abort,
}

/// What the seat holding the device is shown during its reveal
#[derive(Debug, Clone, Serialize)]
pub enum RevealView {
    /// The seat is an impostor that gets no card
    Impostor,
    /// The seat is shown a card
    ///
    /// Spy impostors are shown their card like anyone else, without being
    /// told their role.
    Card(Card),
}

/// Clock shown while a phase is running
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clock {
    /// Seconds elapsed in the phase
    pub elapsed_seconds: u64,
    /// Seconds left before the phase ends on its own, for timed phases
    pub remaining_seconds: Option<u64>,
    /// The `mm:ss` text to display
    pub display: String,
}

impl Clock {
    fn new(elapsed_seconds: u64, limit: Option<u64>) -> Self {
        let remaining_seconds = limit.map(|limit| limit.saturating_sub(elapsed_seconds));
        Self {
            elapsed_seconds,
            remaining_seconds,
            display: format_clock(remaining_seconds.unwrap_or(elapsed_seconds)),
        }
    }
}

/// Outcome of a round, shown once the impostors are revealed
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    /// Mode the round was played in
    pub mode: ModeInfo,
    /// Why the round ended
    pub reason: EndReason,
    /// Title announcing the impostors
    pub headline: String,
    /// Seat numbers of the impostors
    pub impostor_seats: Vec<usize>,
    /// The secret card
    pub secret_card: Card,
    /// The second card, for modes that have one
    pub secondary_card: Option<Card>,
    /// Length of the discussion in seconds
    pub elapsed_seconds: u64,
}

/// Full views of every phase
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum SyncMessage {
    /// The list of modes to choose from
    ModeSelect {
        /// Every selectable mode
        modes: Vec<ModeInfo>,
    },
    /// The form to enter the player counts
    Start {
        /// The selected mode
        mode: ModeInfo,
        /// Card sources to choose from
        card_sources: Vec<SourceInfo>,
        /// Lowest accepted number of players
        min_players: usize,
        /// Highest accepted number of players
        max_players: usize,
    },
    /// Ask to hand the device to a seat
    Pass {
        /// Seat to hand the device to, starting at 1
        seat_number: usize,
        /// Number of seats in the round
        players_count: usize,
    },
    /// The private reveal of the seat holding the device
    Reveal {
        /// Seat looking at the screen, starting at 1
        seat_number: usize,
        /// What the seat is shown
        view: RevealView,
        /// Countdown of the reveal window, for timed modes
        clock: Option<Clock>,
    },
    /// The group discussion
    Playing {
        /// Mode of the round
        mode: ModeInfo,
        /// Time spent, or left when timed
        clock: Clock,
    },
    /// The end of the round
    GameEnd(RoundSummary),
}

/// Partial updates of the current view
#[derive(Debug, Clone, Serialize)]
pub enum UpdateMessage {
    /// The clock of the current phase moved
    Tick(Clock),
    /// The round could not be started
    SetupError(setup::Error),
}

impl SyncMessage {
    /// Converts the view to a JSON string for transmission
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which the default JSON serializer never
    /// produces for these types.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl UpdateMessage {
    /// Converts the update to a JSON string for transmission
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which the default JSON serializer never
    /// produces for these types.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Renders `seconds` as `mm:ss`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Builds the title of the round summary
fn summary_headline(impostors: usize) -> String {
    format!(
        "The {} {}",
        pluralizer::pluralize("impostor", impostors as isize, false),
        if impostors == 1 { "was" } else { "were" }
    )
}

/// The state machine of a shared-device round
#[derive_where(Debug)]
pub struct Game<R> {
    /// Mode picked on the mode selection screen
    mode: GameMode,
    /// Session of the round in progress
    session: Option<GameSession>,
    /// Where the game stands within the round
    cursor: Cursor,
    /// Set once the round has ended
    end_reason: Option<EndReason>,
    /// The only timer whose alarms are honored
    active_timer: Option<TimerId>,
    /// Id handed to the next started timer
    next_timer: u64,
    /// Randomness for every session built by this game
    #[derive_where(skip)]
    rng: R,
}

impl Default for Game<fastrand::Rng> {
    fn default() -> Self {
        Self::new(rng::from_entropy())
    }
}

impl<R: RandomSource> Game<R> {
    /// Creates a game on the mode selection screen
    ///
    /// # Arguments
    ///
    /// * `rng` - Source of randomness for every session built by this game
    pub fn new(rng: R) -> Self {
        Self {
            mode: GameMode::default(),
            session: None,
            cursor: Cursor::default(),
            end_reason: None,
            active_timer: None,
            next_timer: 0,
            rng,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.cursor.phase
    }

    /// Current cursor
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Selected mode
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Session of the round in progress, if any
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Why the last round ended, once it has
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    fn timing(&self) -> Option<Timing> {
        self.session
            .as_ref()
            .and_then(|session| session.config().timing())
    }

    fn change_phase(&mut self, after: Phase) {
        let before = self.cursor.phase;
        self.cursor.phase = after;
        debug!(
            from = ?before,
            to = ?after,
            seat = self.cursor.current_seat_index,
            "Phase changed"
        );
    }

    fn start_timer<S: FnMut(AlarmMessage, web_time::Duration)>(&mut self, mut schedule_message: S) {
        let timer = TimerId(self.next_timer);
        self.next_timer += 1;
        self.active_timer = Some(timer);
        schedule_message(
            AlarmMessage::Tick { timer },
            web_time::Duration::from_secs(TICK_SECONDS),
        );
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.active_timer.take() {
            debug!(%timer, "Timer cancelled");
        }
    }

    /// Picks the mode of the next round and moves to the start screen
    ///
    /// Does nothing outside of the mode selection screen.
    pub fn select_mode<P: Presenter + ?Sized>(&mut self, mode: GameMode, presenter: &P) {
        if self.cursor.phase != Phase::ModeSelect {
            return;
        }

        self.mode = mode;
        self.change_phase(Phase::Start);
        self.sync(presenter);
    }

    /// Goes back from the start screen to the mode selection screen
    pub fn change_mode<P: Presenter + ?Sized>(&mut self, presenter: &P) {
        if self.cursor.phase != Phase::Start {
            return;
        }

        self.change_phase(Phase::ModeSelect);
        self.sync(presenter);
    }

    /// Builds a session and hands the device to the first seat
    ///
    /// Only honored on the start screen; in any other phase the request is
    /// ignored. On failure the game stays on the start screen.
    ///
    /// # Arguments
    ///
    /// * `request` - Counts, mode and card source of the round
    /// * `catalog` - Supplier of catalog cards
    /// * `store` - Storage of the custom cards
    /// * `presenter` - Receives the first pass view
    ///
    /// # Errors
    ///
    /// Returns the setup error when the counts are invalid, the card source
    /// fails, or the pool is too small for the mode.
    pub fn start_session<C, K, P>(
        &mut self,
        request: StartRequest,
        catalog: &C,
        store: &K,
        presenter: &P,
    ) -> Result<(), setup::Error>
    where
        C: CardCatalog + ?Sized,
        K: CustomCardStore + ?Sized,
        P: Presenter + ?Sized,
    {
        if self.cursor.phase != Phase::Start {
            debug!(phase = ?self.cursor.phase, "Ignoring start request");
            return Ok(());
        }

        let pool = setup::resolve_pool(request.card_source, catalog, store)?;
        let session = setup::build_session(
            &pool,
            request.players_count,
            request.impostors_count,
            request.mode,
            &mut self.rng,
        )?;

        self.cancel_timer();
        self.mode = request.mode;
        self.session = Some(session);
        self.end_reason = None;
        self.cursor = Cursor {
            phase: Phase::Start,
            current_seat_index: 0,
            elapsed_seconds: 0,
        };
        self.change_phase(Phase::Pass);
        self.sync(presenter);

        Ok(())
    }

    /// The seat holding the device starts its private reveal
    pub fn ready<P, S>(&mut self, schedule_message: S, presenter: &P)
    where
        P: Presenter + ?Sized,
        S: FnMut(AlarmMessage, web_time::Duration),
    {
        if self.cursor.phase != Phase::Pass {
            return;
        }

        self.cursor.elapsed_seconds = 0;
        if self.timing().is_some() {
            self.start_timer(schedule_message);
        }
        self.change_phase(Phase::Reveal);
        self.sync(presenter);
    }

    /// The seat holding the device is done looking at its card
    ///
    /// Accepted in timed modes as well, where it ends the reveal window early.
    pub fn seen<P, S>(&mut self, schedule_message: S, presenter: &P)
    where
        P: Presenter + ?Sized,
        S: FnMut(AlarmMessage, web_time::Duration),
    {
        if self.cursor.phase != Phase::Reveal {
            return;
        }

        self.advance_seat(schedule_message, presenter);
    }

    fn advance_seat<P, S>(&mut self, schedule_message: S, presenter: &P)
    where
        P: Presenter + ?Sized,
        S: FnMut(AlarmMessage, web_time::Duration),
    {
        self.cancel_timer();
        self.cursor.elapsed_seconds = 0;

        let players_count = self
            .session
            .as_ref()
            .map_or(0, GameSession::players_count);
        let next_index = self.cursor.current_seat_index + 1;

        if next_index < players_count {
            self.cursor.current_seat_index = next_index;
            self.change_phase(Phase::Pass);
        } else {
            self.start_timer(schedule_message);
            self.change_phase(Phase::Playing);
        }

        self.sync(presenter);
    }

    /// Ends the discussion and reveals the impostors
    ///
    /// Accepted in timed modes as well, before the countdown runs out.
    pub fn reveal_impostors<P: Presenter + ?Sized>(&mut self, presenter: &P) {
        if self.cursor.phase != Phase::Playing {
            return;
        }

        self.end_round(EndReason::ImpostorsRevealed, presenter);
    }

    fn end_round<P: Presenter + ?Sized>(&mut self, reason: EndReason, presenter: &P) {
        self.cancel_timer();
        self.end_reason = Some(reason);
        self.change_phase(Phase::GameEnd);
        info!(
            ?reason,
            mode = %self.mode,
            elapsed = self.cursor.elapsed_seconds,
            "Round ended"
        );
        self.sync(presenter);
    }

    /// Discards the round and goes back to mode selection
    ///
    /// Valid from any phase. The pending timer is invalidated so no alarm
    /// scheduled before the abort can move the game afterwards.
    pub fn abort<P: Presenter + ?Sized>(&mut self, presenter: &P) {
        self.cancel_timer();
        if self.session.take().is_some() {
            info!(phase = ?self.cursor.phase, "Round aborted");
        }
        self.mode = GameMode::default();
        self.end_reason = None;
        self.cursor = Cursor {
            phase: self.cursor.phase,
            ..Cursor::default()
        };
        self.change_phase(Phase::ModeSelect);
        self.sync(presenter);
    }

    /// Dispatches an action of the presentation layer
    ///
    /// Actions that do not apply to the current phase are ignored. Setup
    /// failures are reported to the presenter as
    /// [`UpdateMessage::SetupError`].
    ///
    /// # Arguments
    ///
    /// * `message` - The action to perform
    /// * `catalog` - Supplier of catalog cards, used when starting a round
    /// * `store` - Storage of the custom cards, used when starting a round
    /// * `schedule_message` - Function to schedule delayed alarms
    /// * `presenter` - Receives the resulting views
    pub fn receive_message<C, K, P, S>(
        &mut self,
        message: IncomingMessage,
        catalog: &C,
        store: &K,
        schedule_message: S,
        presenter: &P,
    ) where
        C: CardCatalog + ?Sized,
        K: CustomCardStore + ?Sized,
        P: Presenter + ?Sized,
        S: FnMut(AlarmMessage, web_time::Duration),
    {
        match message {
            IncomingMessage::SelectMode(mode) => self.select_mode(mode, presenter),
            IncomingMessage::ChangeMode => self.change_mode(presenter),
            IncomingMessage::StartSession(request) => {
                if let Err(e) = self.start_session(request, catalog, store, presenter) {
                    debug!(error = %e, "Failed to start session");
                    presenter.send_update(&UpdateMessage::SetupError(e));
                }
            }
            IncomingMessage::Ready => self.ready(schedule_message, presenter),
            IncomingMessage::Seen => self.seen(schedule_message, presenter),
            IncomingMessage::RevealImpostors => self.reveal_impostors(presenter),
            IncomingMessage::Abort => self.abort(presenter),
        }
    }

    /// Handles an alarm scheduled by the game
    ///
    /// Alarms of a timer that is no longer active are dropped. Otherwise the
    /// phase clock moves by one tick, and the phase ends once its window is
    /// over; if not, the next tick is scheduled.
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm being delivered
    /// * `schedule_message` - Function to schedule delayed alarms
    /// * `presenter` - Receives the clock update or the next view
    pub fn receive_alarm<P, S>(
        &mut self,
        message: AlarmMessage,
        mut schedule_message: S,
        presenter: &P,
    ) where
        P: Presenter + ?Sized,
        S: FnMut(AlarmMessage, web_time::Duration),
    {
        let AlarmMessage::Tick { timer } = message;

        if self.active_timer != Some(timer) {
            debug!(%timer, "Dropping stale timer alarm");
            return;
        }

        self.cursor.elapsed_seconds += TICK_SECONDS;
        let elapsed = self.cursor.elapsed_seconds;
        let timing = self.timing();

        match (self.cursor.phase, timing) {
            (Phase::Reveal, Some(timing)) if elapsed >= timing.reveal_seconds() => {
                self.advance_seat(schedule_message, presenter);
            }
            (Phase::Playing, Some(timing)) if elapsed >= timing.round_seconds() => {
                self.end_round(EndReason::TimeUp, presenter);
            }
            (Phase::Reveal | Phase::Playing, _) => {
                schedule_message(
                    AlarmMessage::Tick { timer },
                    web_time::Duration::from_secs(TICK_SECONDS),
                );
                if let Some(clock) = self.clock() {
                    presenter.send_update(&UpdateMessage::Tick(clock));
                }
            }
            _ => self.cancel_timer(),
        }
    }

    fn clock(&self) -> Option<Clock> {
        let limit = match self.cursor.phase {
            Phase::Reveal => self.timing()?.reveal_seconds(),
            Phase::Playing => {
                return Some(Clock::new(
                    self.cursor.elapsed_seconds,
                    self.timing().map(Timing::round_seconds),
                ));
            }
            _ => return None,
        };
        Some(Clock::new(self.cursor.elapsed_seconds, Some(limit)))
    }

    /// Pushes the view of the current phase to `presenter`
    pub fn sync<P: Presenter + ?Sized>(&self, presenter: &P) {
        if let Some(state) = self.state_message() {
            presenter.send_state(&state);
        }
    }

    /// Returns the view of the current phase
    ///
    /// The reveal view only ever describes the seat holding the device.
    /// Returns `None` if a round phase is reached without a session, which
    /// the game never does on its own.
    pub fn state_message(&self) -> Option<SyncMessage> {
        let seat_index = self.cursor.current_seat_index;

        Some(match self.cursor.phase {
            Phase::ModeSelect => SyncMessage::ModeSelect {
                modes: GameMode::ALL.into_iter().map(GameMode::info).collect_vec(),
            },
            Phase::Start => SyncMessage::Start {
                mode: self.mode.info(),
                card_sources: CardSource::ALL
                    .into_iter()
                    .map(CardSource::info)
                    .collect_vec(),
                min_players: MIN_PLAYERS,
                max_players: MAX_PLAYERS,
            },
            Phase::Pass => {
                let session = self.session.as_ref()?;
                SyncMessage::Pass {
                    seat_number: session.player_at(seat_index)?.seat_number(),
                    players_count: session.players_count(),
                }
            }
            Phase::Reveal => {
                let player = self.session.as_ref()?.player_at(seat_index)?;
                SyncMessage::Reveal {
                    seat_number: player.seat_number(),
                    view: player
                        .assigned_card()
                        .cloned()
                        .map_or(RevealView::Impostor, RevealView::Card),
                    clock: self.clock(),
                }
            }
            Phase::Playing => SyncMessage::Playing {
                mode: self.mode.info(),
                clock: self.clock()?,
            },
            Phase::GameEnd => {
                let session = self.session.as_ref()?;
                let impostor_seats = session.impostor_seats();
                SyncMessage::GameEnd(RoundSummary {
                    mode: session.mode().info(),
                    reason: self.end_reason?,
                    headline: summary_headline(impostor_seats.len()),
                    impostor_seats,
                    secret_card: session.secret_card().clone(),
                    secondary_card: session.secondary_card().cloned(),
                    elapsed_seconds: self.cursor.elapsed_seconds,
                })
            }
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        catalog::StaticCatalog,
        constants::relampago,
        custom::{KeyValueCardStore, MemoryStore},
        setup::Role,
    };

    #[derive(Debug, Clone, Default)]
    struct Recorder {
        states: Rc<RefCell<Vec<SyncMessage>>>,
        updates: Rc<RefCell<Vec<UpdateMessage>>>,
    }

    impl Presenter for Recorder {
        fn send_state(&self, state: &SyncMessage) {
            self.states.borrow_mut().push(state.clone());
        }

        fn send_update(&self, update: &UpdateMessage) {
            self.updates.borrow_mut().push(update.clone());
        }
    }

    impl Recorder {
        fn last_state(&self) -> Option<SyncMessage> {
            self.states.borrow().last().cloned()
        }
    }

    type TestGame = Game<fastrand::Rng>;

    fn catalog() -> StaticCatalog {
        StaticCatalog(vec![
            Card::catalog(1, "Knight", "https://cdn/knight.png"),
            Card::catalog(2, "Archers", "https://cdn/archers.png"),
            Card::catalog(3, "Giant", "https://cdn/giant.png"),
        ])
    }

    fn store() -> KeyValueCardStore<MemoryStore> {
        KeyValueCardStore::new(MemoryStore::default())
    }

    fn no_alarms() -> impl FnMut(AlarmMessage, web_time::Duration) {
        |_msg, _dur| {}
    }

    fn started(mode: GameMode, players: usize, impostors: usize, seed: u64) -> (TestGame, Recorder) {
        let presenter = Recorder::default();
        let mut game = Game::new(rng::seeded(seed));

        game.select_mode(mode, &presenter);
        game.start_session(
            StartRequest {
                players_count: players,
                impostors_count: impostors,
                mode,
                card_source: CardSource::Catalog,
            },
            &catalog(),
            &store(),
            &presenter,
        )
        .unwrap();

        (game, presenter)
    }

    /// Delivers every pending alarm, collecting the ones scheduled in turn
    fn fire(game: &mut TestGame, pending: &mut Vec<AlarmMessage>, presenter: &Recorder) {
        let due = std::mem::take(pending);
        for alarm in due {
            game.receive_alarm(alarm, |msg, _| pending.push(msg), presenter);
        }
    }

    #[test]
    fn test_mode_selection() {
        let presenter = Recorder::default();
        let mut game = Game::new(rng::seeded(0));

        assert_eq!(game.phase(), Phase::ModeSelect);
        game.select_mode(GameMode::Spy, &presenter);
        assert_eq!(game.phase(), Phase::Start);
        assert_eq!(game.mode(), GameMode::Spy);
        assert!(matches!(
            presenter.last_state(),
            Some(SyncMessage::Start { mode, .. }) if mode.mode == GameMode::Spy
        ));

        // selecting again outside the mode screen changes nothing
        game.select_mode(GameMode::Classic, &presenter);
        assert_eq!(game.mode(), GameMode::Spy);

        game.change_mode(&presenter);
        assert_eq!(game.phase(), Phase::ModeSelect);
        assert!(matches!(
            presenter.last_state(),
            Some(SyncMessage::ModeSelect { modes }) if modes.len() == 4
        ));
    }

    #[test]
    fn test_start_session_resets_cursor() {
        let (game, presenter) = started(GameMode::Classic, 5, 1, 3);

        assert_eq!(
            game.cursor(),
            Cursor {
                phase: Phase::Pass,
                current_seat_index: 0,
                elapsed_seconds: 0
            }
        );
        assert_eq!(game.session().unwrap().players_count(), 5);
        assert!(matches!(
            presenter.last_state(),
            Some(SyncMessage::Pass {
                seat_number: 1,
                players_count: 5
            })
        ));
    }

    #[test]
    fn test_every_seat_is_visited_once() {
        let (mut game, presenter) = started(GameMode::Classic, 6, 2, 11);
        let mut seats = Vec::new();

        for _ in 0..6 {
            assert_eq!(game.phase(), Phase::Pass);
            game.ready(no_alarms(), &presenter);
            assert_eq!(game.phase(), Phase::Reveal);
            if let Some(SyncMessage::Reveal { seat_number, .. }) = presenter.last_state() {
                seats.push(seat_number);
            }
            game.seen(no_alarms(), &presenter);
        }

        assert_eq!(seats, (1..=6).collect_vec());
        assert_eq!(game.phase(), Phase::Playing);

        // advancing past the last seat is a no-op
        game.seen(no_alarms(), &presenter);
        game.ready(no_alarms(), &presenter);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.cursor().current_seat_index, 5);
    }

    #[test]
    fn test_actions_out_of_phase_are_ignored() {
        let (mut game, presenter) = started(GameMode::Classic, 3, 1, 0);
        let before = game.cursor();

        game.seen(no_alarms(), &presenter);
        game.reveal_impostors(&presenter);
        game.select_mode(GameMode::Spy, &presenter);
        game.change_mode(&presenter);
        game.start_session(
            StartRequest {
                players_count: 4,
                impostors_count: 1,
                mode: GameMode::Classic,
                card_source: CardSource::Catalog,
            },
            &catalog(),
            &store(),
            &presenter,
        )
        .unwrap();

        assert_eq!(game.cursor(), before);
        assert_eq!(game.session().unwrap().players_count(), 3);
    }

    #[test]
    fn test_reveal_impostors_summary() {
        let (mut game, presenter) = started(GameMode::Spy, 5, 2, 21);
        for _ in 0..5 {
            game.ready(no_alarms(), &presenter);
            game.seen(no_alarms(), &presenter);
        }

        game.reveal_impostors(&presenter);
        assert_eq!(game.phase(), Phase::GameEnd);
        assert_eq!(game.end_reason(), Some(EndReason::ImpostorsRevealed));

        let session = game.session().unwrap();
        let Some(SyncMessage::GameEnd(summary)) = presenter.last_state() else {
            panic!("expected the round summary");
        };
        assert_eq!(summary.impostor_seats, session.impostor_seats());
        assert_eq!(summary.headline, "The impostors were");
        assert_eq!(summary.secret_card, *session.secret_card());
        assert!(summary.secondary_card.is_some());

        // the round is over, nothing advances any further
        game.reveal_impostors(&presenter);
        game.seen(no_alarms(), &presenter);
        assert_eq!(game.phase(), Phase::GameEnd);
    }

    #[test]
    fn test_summary_headline() {
        assert_eq!(summary_headline(1), "The impostor was");
        assert_eq!(summary_headline(3), "The impostors were");
    }

    #[test]
    fn test_classic_reveal_views() {
        let (mut game, presenter) = started(GameMode::Classic, 5, 2, 8);
        let roles = game
            .session()
            .unwrap()
            .players()
            .iter()
            .map(|player| player.role())
            .collect_vec();

        for role in roles {
            game.ready(no_alarms(), &presenter);
            let Some(SyncMessage::Reveal { view, clock, .. }) = presenter.last_state() else {
                panic!("expected a reveal view");
            };
            assert!(clock.is_none());
            match (role, view) {
                (Role::Impostor, RevealView::Impostor) => {}
                (Role::NotImpostor, RevealView::Card(card)) => {
                    assert_eq!(card, *game.session().unwrap().secret_card());
                }
                (role, view) => panic!("{role:?} was shown {view:?}"),
            }
            game.seen(no_alarms(), &presenter);
        }
    }

    #[test]
    fn test_spy_reveal_never_exposes_the_role() {
        let (mut game, presenter) = started(GameMode::Spy, 4, 1, 5);

        for _ in 0..4 {
            game.ready(no_alarms(), &presenter);
            let state = presenter.last_state().unwrap();
            assert!(matches!(
                state,
                SyncMessage::Reveal {
                    view: RevealView::Card(_),
                    ..
                }
            ));
            let json = serde_json::to_string(&state).unwrap();
            assert!(!json.to_lowercase().contains("impostor"));
            game.seen(no_alarms(), &presenter);
        }
    }

    #[test]
    fn test_abort_from_every_phase() {
        let presenter = Recorder::default();

        let mut game = Game::new(rng::seeded(1));
        game.abort(&presenter);
        assert_eq!(game.phase(), Phase::ModeSelect);

        game.select_mode(GameMode::Spy, &presenter);
        game.abort(&presenter);
        assert_eq!(game.phase(), Phase::ModeSelect);
        assert_eq!(game.mode(), GameMode::Classic);

        for steps in 0..=4 {
            let (mut game, presenter) = started(GameMode::DoubleTrouble, 3, 1, 2);
            let actions: [fn(&mut TestGame, &Recorder); 4] = [
                |game, presenter| game.ready(no_alarms(), presenter),
                |game, presenter| game.seen(no_alarms(), presenter),
                |game, presenter| {
                    for _ in 0..2 {
                        game.ready(no_alarms(), presenter);
                        game.seen(no_alarms(), presenter);
                    }
                },
                |game, presenter| game.reveal_impostors(presenter),
            ];
            for action in &actions[..steps] {
                action(&mut game, &presenter);
            }

            game.abort(&presenter);
            assert_eq!(game.cursor(), Cursor::default());
            assert!(game.session().is_none());
            assert!(game.end_reason().is_none());
            assert_eq!(game.mode(), GameMode::Classic);
            assert!(matches!(
                presenter.last_state(),
                Some(SyncMessage::ModeSelect { .. })
            ));
        }
    }

    #[test]
    fn test_abort_cancels_pending_timer() {
        let (mut game, presenter) = started(GameMode::Relampago, 3, 1, 4);
        let mut pending = Vec::new();

        game.ready(|msg, _| pending.push(msg), &presenter);
        assert_eq!(pending.len(), 1);

        game.abort(&presenter);
        for _ in 0..5 {
            fire(&mut game, &mut pending, &presenter);
        }

        assert!(pending.is_empty());
        assert_eq!(game.cursor(), Cursor::default());
        assert!(presenter.updates.borrow().is_empty());
    }

    #[test]
    fn test_timed_reveal_advances_after_three_ticks() {
        let (mut game, presenter) = started(GameMode::Relampago, 4, 1, 6);
        let mut pending = Vec::new();

        game.ready(|msg, _| pending.push(msg), &presenter);
        let Some(SyncMessage::Reveal { clock, .. }) = presenter.last_state() else {
            panic!("expected a reveal view");
        };
        assert_eq!(clock.unwrap().remaining_seconds, Some(relampago::REVEAL_SECONDS));

        fire(&mut game, &mut pending, &presenter);
        fire(&mut game, &mut pending, &presenter);
        assert_eq!(game.phase(), Phase::Reveal);
        assert_eq!(game.cursor().elapsed_seconds, 2);

        fire(&mut game, &mut pending, &presenter);
        assert_eq!(game.phase(), Phase::Pass);
        assert_eq!(game.cursor().current_seat_index, 1);
        assert_eq!(game.cursor().elapsed_seconds, 0);
        assert!(pending.is_empty());

        let ticks = presenter.updates.borrow();
        assert_eq!(ticks.len(), 2);
        assert!(matches!(
            &ticks[1],
            UpdateMessage::Tick(Clock { remaining_seconds: Some(1), display, .. }) if display == "00:01"
        ));
    }

    #[test]
    fn test_seen_ends_timed_reveal_early() {
        let (mut game, presenter) = started(GameMode::Relampago, 3, 1, 7);
        let mut pending = Vec::new();

        game.ready(|msg, _| pending.push(msg), &presenter);
        fire(&mut game, &mut pending, &presenter);
        game.seen(no_alarms(), &presenter);
        assert_eq!(game.phase(), Phase::Pass);

        // the reveal timer of the first seat is gone
        game.ready(no_alarms(), &presenter);
        fire(&mut game, &mut pending, &presenter);
        assert!(pending.is_empty());
        assert_eq!(game.phase(), Phase::Reveal);
        assert_eq!(game.cursor().current_seat_index, 1);
        assert_eq!(game.cursor().elapsed_seconds, 0);
    }

    #[test]
    fn test_timed_round_ends_after_ninety_ticks() {
        let (mut game, presenter) = started(GameMode::Relampago, 3, 1, 9);
        let mut pending = Vec::new();

        for _ in 0..3 {
            game.ready(no_alarms(), &presenter);
            game.seen(|msg, _| pending.push(msg), &presenter);
        }
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(pending.len(), 1);

        for _ in 0..(relampago::ROUND_SECONDS - 1) {
            fire(&mut game, &mut pending, &presenter);
        }
        assert_eq!(game.phase(), Phase::Playing);
        assert!(matches!(
            presenter.updates.borrow().last(),
            Some(UpdateMessage::Tick(Clock { remaining_seconds: Some(1), .. }))
        ));

        fire(&mut game, &mut pending, &presenter);
        assert_eq!(game.phase(), Phase::GameEnd);
        assert_eq!(game.end_reason(), Some(EndReason::TimeUp));
        assert!(pending.is_empty());

        let Some(SyncMessage::GameEnd(summary)) = presenter.last_state() else {
            panic!("expected the round summary");
        };
        assert_eq!(summary.reason, EndReason::TimeUp);
        assert_eq!(summary.headline, "The impostor was");
        assert_eq!(summary.elapsed_seconds, relampago::ROUND_SECONDS);
    }

    #[test]
    fn test_untimed_round_runs_a_stopwatch() {
        let (mut game, presenter) = started(GameMode::Classic, 3, 1, 10);
        let mut pending = Vec::new();

        for _ in 0..3 {
            game.ready(no_alarms(), &presenter);
            game.seen(|msg, _| pending.push(msg), &presenter);
        }

        for _ in 0..200 {
            fire(&mut game, &mut pending, &presenter);
        }

        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.cursor().elapsed_seconds, 200);
        assert!(matches!(
            presenter.updates.borrow().last(),
            Some(UpdateMessage::Tick(Clock { remaining_seconds: None, display, .. })) if display == "03:20"
        ));

        game.reveal_impostors(&presenter);
        fire(&mut game, &mut pending, &presenter);
        assert!(pending.is_empty());
        assert_eq!(game.cursor().elapsed_seconds, 200);
    }

    #[test]
    fn test_stale_alarm_from_previous_round_is_dropped() {
        let (mut game, presenter) = started(GameMode::Relampago, 3, 1, 12);
        let mut stale = Vec::new();
        game.ready(|msg, _| stale.push(msg), &presenter);

        game.abort(&presenter);
        game.select_mode(GameMode::Relampago, &presenter);
        game.start_session(
            StartRequest {
                players_count: 3,
                impostors_count: 1,
                mode: GameMode::Relampago,
                card_source: CardSource::Catalog,
            },
            &catalog(),
            &store(),
            &presenter,
        )
        .unwrap();
        let mut fresh = Vec::new();
        game.ready(|msg, _| fresh.push(msg), &presenter);

        fire(&mut game, &mut stale, &presenter);
        assert!(stale.is_empty());
        assert_eq!(game.cursor().elapsed_seconds, 0);

        fire(&mut game, &mut fresh, &presenter);
        assert_eq!(game.cursor().elapsed_seconds, 1);
    }

    #[test]
    fn test_receive_message_reports_setup_errors() {
        let presenter = Recorder::default();
        let mut game = Game::new(rng::seeded(13));

        game.receive_message(
            IncomingMessage::SelectMode(GameMode::Spy),
            &catalog(),
            &store(),
            no_alarms(),
            &presenter,
        );
        game.receive_message(
            IncomingMessage::StartSession(StartRequest {
                players_count: 4,
                impostors_count: 1,
                mode: GameMode::Spy,
                card_source: CardSource::Custom,
            }),
            &catalog(),
            &store(),
            no_alarms(),
            &presenter,
        );

        assert_eq!(game.phase(), Phase::Start);
        assert!(game.session().is_none());
        assert!(matches!(
            presenter.updates.borrow().last(),
            Some(UpdateMessage::SetupError(setup::Error::InsufficientCards {
                required: 2,
                available: 0,
                ..
            }))
        ));

        game.receive_message(
            IncomingMessage::StartSession(StartRequest {
                players_count: 4,
                impostors_count: 4,
                mode: GameMode::Spy,
                card_source: CardSource::Catalog,
            }),
            &catalog(),
            &store(),
            no_alarms(),
            &presenter,
        );
        assert!(matches!(
            presenter.updates.borrow().last(),
            Some(UpdateMessage::SetupError(setup::Error::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_receive_message_plays_a_round() {
        let presenter = Recorder::default();
        let mut game = Game::new(rng::seeded(14));
        let send = |game: &mut TestGame, message: IncomingMessage| {
            game.receive_message(message, &catalog(), &store(), no_alarms(), &presenter);
        };

        send(&mut game, IncomingMessage::SelectMode(GameMode::DoubleTrouble));
        send(
            &mut game,
            IncomingMessage::StartSession(
                StartRequest::new(4, 1, "double trouble", CardSource::Mixed).unwrap(),
            ),
        );
        for _ in 0..4 {
            send(&mut game, IncomingMessage::Ready);
            send(&mut game, IncomingMessage::Seen);
        }
        send(&mut game, IncomingMessage::RevealImpostors);

        assert_eq!(game.phase(), Phase::GameEnd);
        send(&mut game, IncomingMessage::Abort);
        assert_eq!(game.phase(), Phase::ModeSelect);
    }

    #[test]
    fn test_start_request_parses_mode() {
        let request = StartRequest::new(5, 1, "relampago", CardSource::Catalog).unwrap();
        assert_eq!(request.mode, GameMode::Relampago);

        assert!(matches!(
            StartRequest::new(5, 1, "hide and seek", CardSource::Catalog),
            Err(setup::Error::InvalidConfig(_))
        ));

        let request: StartRequest =
            serde_json::from_str(r#"{"playersCount":4,"impostorsCount":1,"mode":"SPY"}"#).unwrap();
        assert_eq!(request.card_source, CardSource::Catalog);
    }

    #[test]
    fn test_messages_to_json() {
        let (game, presenter) = started(GameMode::Classic, 3, 1, 15);
        let json = game.state_message().unwrap().to_message().unwrap();
        assert!(json.contains("Pass"));
        assert!(json.contains("\"seatNumber\":1"));
        assert!(json.contains("\"playersCount\":3"));
        assert!(!json.contains("seat_number"));

        let start = SyncMessage::Start {
            mode: GameMode::Spy.info(),
            card_sources: CardSource::ALL.into_iter().map(CardSource::info).collect(),
            min_players: 3,
            max_players: 10,
        };
        let json = serde_json::to_value(&start).unwrap();
        assert_eq!(json["Start"]["minPlayers"], 3);
        assert_eq!(json["Start"]["cardSources"].as_array().unwrap().len(), 3);

        let update = UpdateMessage::Tick(Clock::new(5, Some(90)));
        let json = update.to_message().unwrap();
        assert!(json.contains("\"remainingSeconds\":85"));
        assert!(json.contains("01:25"));

        let update = UpdateMessage::Tick(Clock::new(5, None));
        assert!(!update.to_message().unwrap().contains("remainingSeconds"));
        assert_eq!(presenter.states.borrow().len(), 2);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(90), "01:30");
        assert_eq!(format_clock(3_600), "60:00");
    }
}
