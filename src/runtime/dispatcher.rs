//! Per-chat message dispatcher
//!
//! Classifies raw text against the chat's current phase, runs the pure
//! transition under the chat's lock, and executes the resulting effects.

use super::traits::AuditSink;
use crate::catalog::PuzzleCatalog;
use crate::db::{AuditEvent, AuditKind};
use crate::intent::{IntentClassifier, Vocabulary, VocabularyError};
use crate::reply::{OutgoingResponse, Phrasebook};
use crate::selector::RandomSource;
use crate::state_machine::{
    transition, ChatContext, ChatId, ChatState, Effect, TransitionError, TransitionResult,
};
use crate::store::{ChatRepository, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Dispatcher generic over chat storage, randomness, and audit destination
pub struct Dispatcher<S, R, A>
where
    S: ChatRepository,
    R: RandomSource,
    A: AuditSink,
{
    catalog: PuzzleCatalog,
    phrases: Phrasebook,
    classifier: IntentClassifier,
    store: S,
    rng: R,
    audit: A,
}

impl<S, R, A> Dispatcher<S, R, A>
where
    S: ChatRepository,
    R: RandomSource,
    A: AuditSink,
{
    /// Build a dispatcher with the default vocabulary and phrasebook
    pub fn new(
        catalog: PuzzleCatalog,
        store: S,
        rng: R,
        audit: A,
    ) -> Result<Self, VocabularyError> {
        Ok(Self {
            catalog,
            phrases: Phrasebook::default(),
            classifier: IntentClassifier::new(&Vocabulary::default())?,
            store,
            rng,
            audit,
        })
    }

    /// Replace the reply texts
    #[allow(dead_code)] // Used in tests
    pub fn with_phrases(mut self, phrases: Phrasebook) -> Self {
        self.phrases = phrases;
        self
    }

    /// Replace the yes/no/skip vocabularies
    #[allow(dead_code)] // Used in tests
    pub fn with_vocabulary(mut self, vocabulary: &Vocabulary) -> Result<Self, VocabularyError> {
        self.classifier = IntentClassifier::new(vocabulary)?;
        Ok(self)
    }

    pub fn catalog(&self) -> &PuzzleCatalog {
        &self.catalog
    }

    #[allow(dead_code)] // Used in tests
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one incoming message and produce exactly one reply.
    ///
    /// On error the chat's state is left exactly as it was.
    pub fn handle(
        &self,
        chat_id: ChatId,
        raw_text: &str,
    ) -> Result<OutgoingResponse, DispatchError> {
        let text = raw_text.trim();
        self.audit
            .record(AuditEvent::new(chat_id, AuditKind::Incoming, text));

        let outcome = self.store.mutate(chat_id, |state| self.step(chat_id, state, text))?;

        let effects = match outcome {
            Ok(effects) => effects,
            Err(e) => {
                tracing::error!(chat_id = %chat_id, error = %e, "Transition failed");
                self.audit
                    .record(AuditEvent::new(chat_id, AuditKind::Failure, e.to_string()));
                return Err(e.into());
            }
        };

        let mut reply = None;
        for effect in effects {
            if let Some(response) = self.execute_effect(chat_id, effect) {
                reply = Some(response);
            }
        }

        reply.ok_or_else(|| {
            let e = TransitionError::InvariantViolation("transition produced no reply".into());
            tracing::error!(chat_id = %chat_id, error = %e, "Transition failed");
            DispatchError::Transition(e)
        })
    }

    /// Copy of the chat's state, `None` if the chat has never written
    pub fn snapshot(&self, chat_id: ChatId) -> Result<Option<ChatState>, DispatchError> {
        Ok(self.store.snapshot(chat_id)?)
    }

    /// Classify and transition while the chat's lock is held
    fn step(
        &self,
        chat_id: ChatId,
        state: &mut ChatState,
        text: &str,
    ) -> Result<Vec<Effect>, TransitionError> {
        let intent = self.classifier.classify(text, state.phase.expecting());
        let from = state.phase.name();
        tracing::debug!(
            chat_id = %chat_id,
            phase = from,
            intent = intent.label(),
            "Classified message"
        );

        let ctx = ChatContext::new(chat_id, &self.catalog, &self.phrases);
        let TransitionResult { new_state, effects } = transition(state, &ctx, intent, &self.rng)?;
        new_state
            .check_invariants(&self.catalog)
            .map_err(TransitionError::InvariantViolation)?;

        if new_state.phase.name() != from {
            tracing::info!(
                chat_id = %chat_id,
                from,
                to = new_state.phase.name(),
                "Phase changed"
            );
        }
        *state = new_state;
        Ok(effects)
    }

    fn execute_effect(&self, chat_id: ChatId, effect: Effect) -> Option<OutgoingResponse> {
        match effect {
            Effect::Reply(response) => {
                self.audit.record(AuditEvent::new(
                    chat_id,
                    AuditKind::Outgoing,
                    response.text.clone(),
                ));
                Some(response)
            }
            Effect::RecordOutcome { puzzle, outcome } => {
                tracing::info!(
                    chat_id = %chat_id,
                    puzzle = %puzzle,
                    outcome = outcome.as_str(),
                    "Puzzle outcome"
                );
                self.audit.record(AuditEvent::new(
                    chat_id,
                    AuditKind::Outcome,
                    format!("{puzzle} {}", outcome.as_str()),
                ));
                None
            }
            Effect::RecordRoundExhausted => {
                tracing::info!(chat_id = %chat_id, "Round exhausted");
                self.audit
                    .record(AuditEvent::new(chat_id, AuditKind::Round, "exhausted"));
                None
            }
            Effect::RecordRoundRestarted => {
                tracing::info!(chat_id = %chat_id, "Round restarted");
                self.audit
                    .record(AuditEvent::new(chat_id, AuditKind::Round, "restarted"));
                None
            }
        }
    }
}
