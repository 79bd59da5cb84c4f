//! Per-chat conversation state machine
//!
//! Elm-style: a pure transition from (state, intent) to a new state plus a
//! list of effects the dispatcher executes.

pub(crate) mod effect;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Outcome};
pub use state::{ChatContext, ChatId, ChatState, Mode, Phase};
pub use transition::{transition, TransitionError, TransitionResult};
