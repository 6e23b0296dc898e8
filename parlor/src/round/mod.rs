//! Round lifecycle: models, bet intake, and the state machine.
//!
//! A round moves `Betting -> Revealing -> Settled`, driven by elapsed time
//! against the room's configured durations. The stored phase only changes at
//! the two real events (outcome drawn, payouts applied); the lock window at
//! the end of betting is a *derived* state, computed by [`live_phase`]: the
//! one function every caller (bet intake, status API, scheduler) consults to
//! answer "what phase is this round in right now".
//!
//! Transition discipline: every stored-phase change is a conditional update
//! (`WHERE phase = <expected>`) executed under the room's exclusive
//! advisory lock, so each transition's side effects happen exactly once no
//! matter how many schedulers race. Bet intake takes the same advisory lock
//! in shared mode: wagers don't serialize each other, but no wager can be
//! in flight while a transition commits.

pub mod engine;
pub mod intake;
pub mod models;

pub use engine::RoundEngine;
pub use intake::BetIntake;
pub use models::{
    Bet, HistoryItem, LivePhase, Phase, RoomConfig, RoomId, RoomSettings, RoomState, Round,
    RoundError, RoundResult, RoundSummary, live_phase, round_summary,
};
