use std::collections::HashSet;
use std::time::Instant;

use shared::wpm;

/// Lifecycle of one timed test. Transitions only move forward until
/// [`ScoringEngine::reset`] starts a fresh session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    Finished,
}

/// A keystroke after key-name classification.
///
/// Browser-style key names longer than one character ("Shift", "ArrowLeft")
/// are ignored, with backspace as the sole exception. Space is a regular
/// character; the embedding UI is expected to swallow its default scroll
/// behavior before handing it to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Ignored,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        if name == "Backspace" {
            return Key::Backspace;
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => Key::Ignored,
        }
    }
}

/// Metrics derived from the current session. Always recomputed, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedStats {
    pub wpm: u32,
    pub accuracy: u8,
    pub correct_chars: usize,
    pub error_chars: usize,
}

/// Per-keystroke scoring state machine for one timed typing test.
///
/// Owns the session exclusively: keystrokes arrive through [`handle_key`]
/// and the countdown advances through [`tick`], both called from the single
/// event-processing task. There is no I/O in here.
///
/// [`handle_key`]: ScoringEngine::handle_key
/// [`tick`]: ScoringEngine::tick
#[derive(Debug)]
pub struct ScoringEngine {
    target: Vec<char>,
    typed: Vec<char>,
    errors: HashSet<usize>,
    status: Status,
    duration_secs: u32,
    remaining_secs: u32,
    started_at: Option<Instant>,
}

impl ScoringEngine {
    pub fn new(target: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            target: target.into().chars().collect(),
            typed: Vec::new(),
            errors: HashSet::new(),
            status: Status::Idle,
            duration_secs,
            remaining_secs: duration_secs,
            started_at: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn target(&self) -> String {
        self.target.iter().collect()
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    /// Indices into the target where a mismatch is currently recorded.
    pub fn error_positions(&self) -> &HashSet<usize> {
        &self.errors
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration_secs - self.remaining_secs
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Share of the target typed so far, 0-100.
    pub fn progress_percent(&self) -> f64 {
        wpm::progress_percent(self.typed.len(), self.target.len())
    }

    /// Process one classified keystroke.
    pub fn handle_key(&mut self, key: Key) {
        if self.status == Status::Finished || self.target.is_empty() {
            return;
        }
        if key == Key::Ignored {
            return;
        }

        // The countdown starts at the first accepted key, not before.
        if self.status == Status::Idle {
            self.status = Status::Running;
            self.started_at = Some(Instant::now());
        }

        match key {
            Key::Backspace => {
                if self.typed.pop().is_some() {
                    self.errors.remove(&self.typed.len());
                }
            }
            Key::Char(c) => {
                if self.typed.len() >= self.target.len() {
                    return;
                }
                let idx = self.typed.len();
                self.typed.push(c);
                if c != self.target[idx] {
                    self.errors.insert(idx);
                }
                // Completing the text ends the session even with time left.
                if self.typed.len() == self.target.len() {
                    self.status = Status::Finished;
                }
            }
            Key::Ignored => (),
        }
    }

    /// Advance the countdown by one second. A tick against an idle,
    /// finished, or superseded session is a no-op.
    pub fn tick(&mut self) {
        if self.status != Status::Running {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.status = Status::Finished;
        }
    }

    /// Discard the session and start over with a new target and duration.
    /// Legal in any state.
    pub fn reset(&mut self, target: impl Into<String>, duration_secs: u32) {
        *self = ScoringEngine::new(target, duration_secs);
    }

    pub fn stats(&self) -> DerivedStats {
        let total = self.typed.len();
        let error_chars = self.errors.len();
        let correct_chars = total - error_chars;
        DerivedStats {
            wpm: wpm::rounded_wpm(total, self.elapsed_secs() as f64),
            accuracy: wpm::accuracy(correct_chars, total),
            correct_chars,
            error_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(engine: &mut ScoringEngine, s: &str) {
        for c in s.chars() {
            engine.handle_key(Key::Char(c));
        }
    }

    #[test]
    fn key_name_classification() {
        assert_eq!(Key::from_name("a"), Key::Char('a'));
        assert_eq!(Key::from_name(" "), Key::Char(' '));
        assert_eq!(Key::from_name("Backspace"), Key::Backspace);
        assert_eq!(Key::from_name("Shift"), Key::Ignored);
        assert_eq!(Key::from_name("ArrowLeft"), Key::Ignored);
        assert_eq!(Key::from_name(""), Key::Ignored);
    }

    #[test]
    fn first_key_starts_the_run() {
        let mut engine = ScoringEngine::new("cat", 30);
        assert_eq!(engine.status(), Status::Idle);
        assert!(engine.started_at().is_none());

        engine.handle_key(Key::Char('c'));
        assert_eq!(engine.status(), Status::Running);
        assert!(engine.started_at().is_some());
    }

    #[test]
    fn ignored_keys_do_not_start_or_mutate() {
        let mut engine = ScoringEngine::new("cat", 30);
        engine.handle_key(Key::Ignored);
        assert_eq!(engine.status(), Status::Idle);
        assert_eq!(engine.typed_len(), 0);
    }

    #[test]
    fn empty_target_is_inert() {
        let mut engine = ScoringEngine::new("", 30);
        engine.handle_key(Key::Char('a'));
        assert_eq!(engine.status(), Status::Idle);
        assert_eq!(engine.typed_len(), 0);
    }

    #[test]
    fn typed_never_exceeds_target() {
        let mut engine = ScoringEngine::new("ab", 30);
        type_str(&mut engine, "abcdef");
        assert_eq!(engine.typed_len(), 2);
    }

    #[test]
    fn mismatch_records_error_at_its_index() {
        let mut engine = ScoringEngine::new("cat", 30);
        type_str(&mut engine, "cx");
        assert!(engine.error_positions().contains(&1));
        assert!(!engine.error_positions().contains(&0));
        assert_eq!(engine.stats().error_chars, 1);
        assert_eq!(engine.stats().correct_chars, 1);
    }

    #[test]
    fn backspace_clears_the_error_it_removes() {
        let mut engine = ScoringEngine::new("cat", 30);
        type_str(&mut engine, "cx");
        engine.handle_key(Key::Backspace);
        assert!(engine.error_positions().is_empty());
        assert_eq!(engine.typed(), "c");
        // accuracy recovers to 100 with one correct char remaining
        assert_eq!(engine.stats().accuracy, 100);
    }

    #[test]
    fn backspace_on_empty_input_is_a_noop() {
        let mut engine = ScoringEngine::new("cat", 30);
        engine.handle_key(Key::Backspace);
        assert_eq!(engine.typed_len(), 0);
        // it still counts as the first accepted key
        assert_eq!(engine.status(), Status::Running);
    }

    #[test]
    fn completing_the_text_finishes_with_time_left() {
        let mut engine = ScoringEngine::new("cat", 30);
        type_str(&mut engine, "ca");
        let remaining_before = engine.remaining_secs();
        engine.handle_key(Key::Char('t'));
        assert_eq!(engine.status(), Status::Finished);
        assert_eq!(engine.remaining_secs(), remaining_before);
    }

    #[test]
    fn keys_after_finish_are_dropped() {
        let mut engine = ScoringEngine::new("hi", 30);
        type_str(&mut engine, "hi");
        assert_eq!(engine.status(), Status::Finished);
        engine.handle_key(Key::Char('x'));
        engine.handle_key(Key::Backspace);
        assert_eq!(engine.typed(), "hi");
    }

    #[test]
    fn countdown_reaching_zero_finishes() {
        let mut engine = ScoringEngine::new("some long target", 3);
        engine.handle_key(Key::Char('s'));
        engine.tick();
        engine.tick();
        assert_eq!(engine.status(), Status::Running);
        engine.tick();
        assert_eq!(engine.status(), Status::Finished);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.elapsed_secs(), 3);
    }

    #[test]
    fn tick_is_inert_outside_running() {
        let mut engine = ScoringEngine::new("cat", 30);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 30);

        type_str(&mut engine, "cat");
        let remaining = engine.remaining_secs();
        engine.tick();
        assert_eq!(engine.remaining_secs(), remaining);
    }

    #[test]
    fn wpm_counts_all_keystrokes_over_elapsed_time() {
        // "cat dog" (7 chars) typed perfectly in exactly 6 elapsed seconds
        let mut engine = ScoringEngine::new("cat dog", 30);
        engine.handle_key(Key::Char('c'));
        for _ in 0..6 {
            engine.tick();
        }
        type_str(&mut engine, "at dog");
        assert_eq!(engine.status(), Status::Finished);
        assert_eq!(engine.stats().wpm, 14);
        assert_eq!(engine.stats().accuracy, 100);
    }

    #[test]
    fn wpm_is_zero_before_any_time_elapses() {
        let mut engine = ScoringEngine::new("cat dog", 30);
        type_str(&mut engine, "cat");
        assert_eq!(engine.stats().wpm, 0);
    }

    #[test]
    fn accuracy_is_100_with_nothing_typed() {
        let engine = ScoringEngine::new("cat", 30);
        assert_eq!(engine.stats().accuracy, 100);
    }

    #[test]
    fn reset_discards_everything() {
        let mut engine = ScoringEngine::new("cat", 30);
        type_str(&mut engine, "cxt");
        assert_eq!(engine.status(), Status::Finished);

        engine.reset("dog house", 60);
        assert_eq!(engine.status(), Status::Idle);
        assert_eq!(engine.typed_len(), 0);
        assert!(engine.error_positions().is_empty());
        assert_eq!(engine.remaining_secs(), 60);
        assert_eq!(engine.target(), "dog house");
    }

    #[test]
    fn progress_tracks_typed_share() {
        let mut engine = ScoringEngine::new("abcd", 30);
        assert_eq!(engine.progress_percent(), 0.0);
        type_str(&mut engine, "ab");
        assert_eq!(engine.progress_percent(), 50.0);
        type_str(&mut engine, "cd");
        assert_eq!(engine.progress_percent(), 100.0);
    }
}
