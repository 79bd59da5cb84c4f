//! Test doubles for the runtime, plus dispatcher scenario tests
//!
//! These let the dispatcher run end to end without a database or real
//! randomness.

use super::dispatcher::Dispatcher;
use super::traits::AuditSink;
use crate::catalog::PuzzleCatalog;
use crate::db::{AuditEvent, AuditKind};
use crate::selector::RandomSource;
use crate::store::InMemoryChatStore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Audit Sink
// ============================================================================

/// Audit sink that keeps every event in memory
#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get recorded events
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Details of every recorded event of one kind, oldest first
    pub fn details(&self, kind: AuditKind) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.detail.clone())
            .collect()
    }
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// Scripted Randomness
// ============================================================================

/// Random source that replays queued picks, then always picks 0
#[derive(Default)]
pub struct ScriptedRandom {
    picks: Mutex<VecDeque<usize>>,
}

impl ScriptedRandom {
    /// Queue another pick
    pub fn push(&self, pick: usize) {
        self.picks.lock().unwrap().push_back(pick);
    }
}

impl RandomSource for ScriptedRandom {
    fn pick(&self, n: usize) -> usize {
        let next = self.picks.lock().unwrap().pop_front().unwrap_or(0);
        if n == 0 {
            0
        } else {
            next % n
        }
    }
}

/// Dispatcher wired to in-memory doubles
pub type TestDispatcher = Dispatcher<InMemoryChatStore, Arc<ScriptedRandom>, Arc<RecordingAudit>>;

/// Build a test dispatcher, returning handles to its doubles
pub fn test_dispatcher(
    catalog: PuzzleCatalog,
) -> (TestDispatcher, Arc<ScriptedRandom>, Arc<RecordingAudit>) {
    let rng = Arc::new(ScriptedRandom::default());
    let audit = Arc::new(RecordingAudit::new());
    let dispatcher = Dispatcher::new(
        catalog,
        InMemoryChatStore::new(),
        Arc::clone(&rng),
        Arc::clone(&audit),
    )
    .unwrap();
    (dispatcher, rng, audit)
}

// ============================================================================
// Dispatcher Scenario Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Puzzle, PuzzleId};
    use crate::intent::Vocabulary;
    use crate::reply::{KeyboardKind, Phrasebook};
    use crate::runtime::DispatchError;
    use crate::state_machine::{ChatId, Mode, Phase, TransitionError};
    use crate::store::ChatRepository;
    use std::collections::BTreeSet;
    use std::thread;

    fn two_puzzles() -> PuzzleCatalog {
        PuzzleCatalog::new([
            Puzzle::new("p1", "2 + 2 * 2?", "6"),
            Puzzle::new("p2", "Snake language?", "python"),
        ])
        .unwrap()
    }

    fn ids(list: &[&str]) -> BTreeSet<PuzzleId> {
        list.iter().map(|id| PuzzleId::new(*id)).collect()
    }

    #[test]
    fn test_two_puzzle_round_end_to_end() {
        let (dispatcher, _rng, audit) = test_dispatcher(two_puzzles());
        let chat = ChatId(42);

        let reply = dispatcher.handle(chat, "/puzzle").unwrap();
        assert!(reply.text.contains("2 + 2 * 2?"));
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.active_puzzle(), Some(&PuzzleId::new("p1")));

        let reply = dispatcher.handle(chat, "6").unwrap();
        assert_eq!(reply.keyboard, KeyboardKind::YesNo);
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.mode(), Mode::AwaitingContinue);
        assert_eq!((state.correct, state.attempted), (1, 1));
        assert_eq!(state.active_puzzle(), None);

        let reply = dispatcher.handle(chat, "Да").unwrap();
        assert!(reply.text.contains("Snake language?"));
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.active_puzzle(), Some(&PuzzleId::new("p2")));

        dispatcher.handle(chat, "java").unwrap();
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!((state.correct, state.attempted), (1, 2));
        assert_eq!(state.active_puzzle(), Some(&PuzzleId::new("p2")));

        let reply = dispatcher.handle(chat, "/skip").unwrap();
        assert!(reply.text.contains("python"));
        assert_eq!(reply.keyboard, KeyboardKind::Main);
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.used, ids(&["p1", "p2"]));
        assert_eq!(state.attempted, 3);
        assert_eq!(state.active_puzzle(), None);

        let reply = dispatcher.handle(chat, "/puzzle").unwrap();
        assert_eq!(reply.keyboard, KeyboardKind::YesNo);
        assert!(reply.text.contains("1 из 2"));
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.mode(), Mode::AwaitingRestart);
        assert_eq!(state.active_puzzle(), None);

        assert_eq!(
            audit.details(AuditKind::Outcome),
            vec![
                "p1 issued",
                "p1 correct",
                "p2 issued",
                "p2 incorrect",
                "p2 skipped",
            ]
        );
        assert_eq!(audit.details(AuditKind::Round), vec!["exhausted"]);
    }

    #[test]
    fn test_every_message_is_audited_with_its_reply() {
        let (dispatcher, _rng, audit) = test_dispatcher(two_puzzles());
        let chat = ChatId(1);

        for text in ["/start", "  /help  ", "что-то", "/stats"] {
            dispatcher.handle(chat, text).unwrap();
        }

        assert_eq!(
            audit.details(AuditKind::Incoming),
            vec!["/start", "/help", "что-то", "/stats"]
        );
        assert_eq!(audit.details(AuditKind::Outgoing).len(), 4);
        assert!(audit.events().iter().all(|e| e.chat_id == chat));
    }

    #[test]
    fn test_restart_after_round() {
        let (dispatcher, _rng, audit) = test_dispatcher(two_puzzles());
        let chat = ChatId(5);

        for text in ["/puzzle", "/skip", "/puzzle", "/skip", "anything"] {
            dispatcher.handle(chat, text).unwrap();
        }
        assert_eq!(
            dispatcher.snapshot(chat).unwrap().unwrap().mode(),
            Mode::AwaitingRestart
        );

        let reply = dispatcher.handle(chat, "окей").unwrap();
        assert!(reply.text.contains("2 + 2 * 2?"));
        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state.used, BTreeSet::new());
        assert_eq!((state.correct, state.attempted), (0, 0));
        assert_eq!(state.active_puzzle(), Some(&PuzzleId::new("p1")));
        assert_eq!(audit.details(AuditKind::Round), vec!["exhausted", "restarted"]);
    }

    #[test]
    fn test_scripted_picks_drive_selection() {
        let (dispatcher, rng, _audit) = test_dispatcher(two_puzzles());
        rng.push(1);

        let reply = dispatcher.handle(ChatId(3), "/puzzle").unwrap();
        assert!(reply.text.contains("Snake language?"));
    }

    #[test]
    fn test_failed_transition_leaves_state_untouched() {
        let (dispatcher, _rng, audit) = test_dispatcher(two_puzzles());
        let broken = ChatId(13);
        let healthy = ChatId(14);

        // A puzzle the catalog does not know about
        dispatcher
            .store()
            .mutate(broken, |s| {
                s.phase = Phase::Solving {
                    puzzle: PuzzleId::new("ghost"),
                };
            })
            .unwrap();
        let before = dispatcher.snapshot(broken).unwrap();

        let err = dispatcher.handle(broken, "42").unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transition(TransitionError::Catalog(_))
        ));
        assert_eq!(dispatcher.snapshot(broken).unwrap(), before);
        assert_eq!(audit.details(AuditKind::Failure).len(), 1);

        let reply = dispatcher.handle(healthy, "/puzzle").unwrap();
        assert!(reply.text.contains("2 + 2 * 2?"));
    }

    #[test]
    fn test_custom_phrases_and_vocabulary() {
        let (dispatcher, _rng, _audit) = test_dispatcher(two_puzzles());
        let phrases = Phrasebook {
            back_to_menu: "Back to the menu.".to_string(),
            ..Phrasebook::default()
        };
        let vocabulary = Vocabulary {
            negative: vec!["nope".to_string()],
            ..Vocabulary::default()
        };
        let dispatcher = dispatcher
            .with_phrases(phrases)
            .with_vocabulary(&vocabulary)
            .unwrap();
        let chat = ChatId(8);

        dispatcher.handle(chat, "/puzzle").unwrap();
        dispatcher.handle(chat, "6").unwrap();
        let reply = dispatcher.handle(chat, "Nope").unwrap();
        assert_eq!(reply.text, "Back to the menu.");
        assert_eq!(
            dispatcher.snapshot(chat).unwrap().unwrap().mode(),
            Mode::Normal
        );
    }

    #[test]
    fn test_skip_without_active_puzzle_gets_fallback() {
        let (dispatcher, _rng, audit) = test_dispatcher(PuzzleCatalog::builtin());
        let chat = ChatId(21);
        let fallback = Phrasebook::default().fallback;

        for text in ["/skip", "пропусти"] {
            let reply = dispatcher.handle(chat, text).unwrap();
            assert_eq!(reply.text, fallback);
            assert_eq!(reply.keyboard, KeyboardKind::Main);
        }

        let state = dispatcher.snapshot(chat).unwrap().unwrap();
        assert_eq!(state, crate::state_machine::ChatState::default());
        assert!(audit.details(AuditKind::Outcome).is_empty());
    }

    #[test]
    fn test_unseen_chat_has_no_snapshot() {
        let (dispatcher, _rng, _audit) = test_dispatcher(two_puzzles());
        assert!(dispatcher.snapshot(ChatId(99)).unwrap().is_none());
    }

    #[test]
    fn test_chats_progress_independently_across_threads() {
        let (dispatcher, _rng, _audit) = test_dispatcher(PuzzleCatalog::builtin());
        let dispatcher = Arc::new(dispatcher);

        let handles: Vec<_> = (0..8i64)
            .map(|n| {
                let dispatcher = Arc::clone(&dispatcher);
                thread::spawn(move || {
                    let chat = ChatId(n);
                    for _ in 0..3 {
                        dispatcher.handle(chat, "/puzzle").unwrap();
                        let state = dispatcher.snapshot(chat).unwrap().unwrap();
                        let puzzle = state.active_puzzle().unwrap();
                        let answer = dispatcher.catalog().lookup(puzzle).unwrap().answer.clone();
                        dispatcher.handle(chat, &answer).unwrap();
                        dispatcher.handle(chat, "нет").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for n in 0..8 {
            let state = dispatcher.snapshot(ChatId(n)).unwrap().unwrap();
            assert_eq!(state.used.len(), 3);
            assert_eq!((state.correct, state.attempted), (3, 3));
            assert_eq!(state.mode(), Mode::Normal);
        }
        assert_eq!(dispatcher.store().chat_count().unwrap(), 8);
    }
}
