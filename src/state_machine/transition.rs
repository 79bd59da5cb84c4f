//! Pure state transition function
//!
//! Given the current chat state and a classified intent, decide the next
//! state and the effects to run. The only side input is the injected
//! randomness source.

use super::{ChatContext, ChatState, Effect, Outcome, Phase};
use crate::catalog::{CatalogError, PuzzleId};
use crate::intent::{Command, Intent};
use crate::reply::{render, OutgoingResponse};
use crate::selector::{choose, next_puzzle, RandomSource, Selection};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn replying(state: ChatState, reply: OutgoingResponse) -> Self {
        Self::new(state).with_effect(Effect::Reply(reply))
    }

    /// The reply produced by this transition
    #[allow(dead_code)] // Used in tests
    pub fn reply(&self) -> Option<&OutgoingResponse> {
        self.effects.iter().find_map(Effect::as_reply)
    }
}

/// Errors that can occur during transition. Both indicate a bug, not bad input.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Pure transition function
pub fn transition<R: RandomSource + ?Sized>(
    state: &ChatState,
    ctx: &ChatContext<'_>,
    intent: Intent,
    rng: &R,
) -> Result<TransitionResult, TransitionError> {
    let phrases = ctx.phrases;

    match (&state.phase, intent) {
        // ============================================================
        // Restart prompt (round exhausted)
        // ============================================================

        // AwaitingRestart + yes -> fresh round, issue a puzzle
        (Phase::AwaitingRestart, Intent::Affirmative) => {
            let base = TransitionResult::new(ChatState::default())
                .with_effect(Effect::RecordRoundRestarted);
            issue_puzzle(base, ctx, rng)
        }

        // Either prompt + no -> back to the menu
        (Phase::AwaitingRestart | Phase::AwaitingContinue, Intent::Negative) => {
            Ok(TransitionResult::replying(
                with_phase(state, Phase::Idle),
                OutgoingResponse::main(&phrases.back_to_menu),
            ))
        }

        (Phase::AwaitingRestart, _) => Ok(TransitionResult::replying(
            state.clone(),
            OutgoingResponse::yes_no(&phrases.restart_reprompt),
        )),

        // ============================================================
        // Continue prompt (after a correct answer)
        // ============================================================
        (Phase::AwaitingContinue, Intent::Affirmative) => {
            issue_puzzle(TransitionResult::new(with_phase(state, Phase::Idle)), ctx, rng)
        }

        (Phase::AwaitingContinue, _) => Ok(TransitionResult::replying(
            state.clone(),
            OutgoingResponse::yes_no(&phrases.continue_reprompt),
        )),

        // ============================================================
        // Active puzzle
        // ============================================================

        // Solving + skip -> reveal the answer, puzzle is used up
        (Phase::Solving { puzzle }, Intent::Skip) => {
            let answer = &ctx.catalog.lookup(puzzle)?.answer;
            let mut next = with_phase(state, Phase::Idle);
            mark_used(&mut next, puzzle)?;
            next.attempted += 1;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::outcome(puzzle, Outcome::Skipped))
                .with_effect(Effect::Reply(OutgoingResponse::main(render(
                    &phrases.skipped,
                    &[("answer", answer)],
                )))))
        }

        // Solving + text -> answer attempt
        (Phase::Solving { puzzle }, Intent::FreeText(text)) => {
            let expected = ctx.catalog.lookup(puzzle)?;
            let mut next = state.clone();
            next.attempted += 1;

            if expected.accepts(&text) {
                mark_used(&mut next, puzzle)?;
                next.correct += 1;
                next.phase = Phase::AwaitingContinue;
                let praise = one_of(rng, &phrases.correct, "correct")?;
                Ok(TransitionResult::new(next)
                    .with_effect(Effect::outcome(puzzle, Outcome::Correct))
                    .with_effect(Effect::Reply(OutgoingResponse::yes_no(praise))))
            } else {
                // Puzzle stays active so the chat can retry
                let nudge = one_of(rng, &phrases.incorrect, "incorrect")?;
                Ok(TransitionResult::new(next)
                    .with_effect(Effect::outcome(puzzle, Outcome::Incorrect))
                    .with_effect(Effect::Reply(OutgoingResponse::plain(nudge))))
            }
        }

        // The classifier only yields skip or text while a puzzle is active
        (Phase::Solving { puzzle }, intent) => Err(TransitionError::InvariantViolation(format!(
            "intent {} while solving {puzzle}",
            intent.label()
        ))),

        // ============================================================
        // Menu
        // ============================================================

        // Nothing left this round: whatever arrives leads to the restart prompt
        (Phase::Idle, _) if state.round_exhausted(ctx.catalog) => {
            issue_puzzle(TransitionResult::new(state.clone()), ctx, rng)
        }

        (Phase::Idle, Intent::Command(command)) => match command {
            Command::Start => Ok(TransitionResult::replying(
                state.clone(),
                OutgoingResponse::main(&phrases.greeting),
            )),
            Command::Help => Ok(TransitionResult::replying(
                state.clone(),
                OutgoingResponse::main(&phrases.help),
            )),
            Command::Stats => {
                let text = render(
                    &phrases.stats,
                    &[
                        ("correct", &state.correct.to_string()),
                        ("shown", &state.used.len().to_string()),
                        ("total", &ctx.catalog.size().to_string()),
                    ],
                );
                Ok(TransitionResult::replying(
                    state.clone(),
                    OutgoingResponse::main(text),
                ))
            }
            Command::Tip => {
                let tip = one_of(rng, &phrases.tips, "tips")?;
                Ok(TransitionResult::replying(
                    state.clone(),
                    OutgoingResponse::main(render(&phrases.tip, &[("tip", tip)])),
                ))
            }
            Command::Puzzle => issue_puzzle(TransitionResult::new(state.clone()), ctx, rng),
        },

        (
            Phase::Idle,
            Intent::Affirmative | Intent::Negative | Intent::Skip | Intent::FreeText(_),
        ) => {
            Ok(TransitionResult::replying(
                state.clone(),
                OutgoingResponse::main(&phrases.fallback),
            ))
        }
    }
}

// Helper functions

/// Select the next puzzle for `base.new_state`, or move to the restart prompt
fn issue_puzzle<R: RandomSource + ?Sized>(
    mut base: TransitionResult,
    ctx: &ChatContext<'_>,
    rng: &R,
) -> Result<TransitionResult, TransitionError> {
    if base.new_state.phase != Phase::Idle {
        return Err(TransitionError::InvariantViolation(format!(
            "issuing a puzzle from phase {}",
            base.new_state.phase.name()
        )));
    }

    match next_puzzle(ctx.catalog, &base.new_state.used, rng) {
        Selection::Exhausted => {
            let text = render(
                &ctx.phrases.congratulations,
                &[
                    ("correct", &base.new_state.correct.to_string()),
                    ("total", &ctx.catalog.size().to_string()),
                ],
            );
            base.new_state.phase = Phase::AwaitingRestart;
            Ok(base
                .with_effect(Effect::RecordRoundExhausted)
                .with_effect(Effect::Reply(OutgoingResponse::yes_no(text))))
        }
        Selection::Puzzle(id) => {
            let puzzle = ctx.catalog.lookup(&id)?;
            let text = render(&ctx.phrases.puzzle, &[("prompt", &puzzle.prompt)]);
            base.new_state.phase = Phase::Solving { puzzle: id.clone() };
            Ok(base
                .with_effect(Effect::outcome(&id, Outcome::Issued))
                .with_effect(Effect::Reply(OutgoingResponse::plain(text))))
        }
    }
}

fn with_phase(state: &ChatState, phase: Phase) -> ChatState {
    ChatState {
        phase,
        ..state.clone()
    }
}

fn mark_used(state: &mut ChatState, puzzle: &PuzzleId) -> Result<(), TransitionError> {
    if state.used.insert(puzzle.clone()) {
        Ok(())
    } else {
        Err(TransitionError::InvariantViolation(format!(
            "puzzle {puzzle} resolved twice in one round"
        )))
    }
}

fn one_of<'a, R: RandomSource + ?Sized>(
    rng: &R,
    variants: &'a [String],
    table: &str,
) -> Result<&'a str, TransitionError> {
    if variants.is_empty() {
        return Err(TransitionError::InvariantViolation(format!(
            "phrase table `{table}` is empty"
        )));
    }
    Ok(choose(rng, variants).as_str())
}
