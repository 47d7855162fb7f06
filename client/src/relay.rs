use shared::fsm::GamePhase;
use shared::protocol::ClientEvent;

use crate::engine::{ScoringEngine, Status};
use crate::room::RoomSync;

/// Glue between the scoring engine and the room synchronizer.
///
/// Called after every keystroke and countdown tick; while the race is on it
/// turns engine state into throttled `player_update` emissions and exactly
/// one `player_finished`.
#[derive(Debug, Default)]
pub struct ProgressRelay {
    finish_sent: bool,
    last_sent: Option<(u64, u32)>,
}

impl ProgressRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the per-race guards. Called when a new race begins (on
    /// `game_start`) and when the engine is reset.
    pub fn reset(&mut self) {
        self.finish_sent = false;
        self.last_sent = None;
    }

    /// Sample the engine and produce the outbound events this change calls
    /// for. Outside the racing phase nothing is emitted.
    pub fn sample(&mut self, engine: &ScoringEngine, sync: &mut RoomSync) -> Vec<ClientEvent> {
        let mut out = Vec::new();
        if sync.phase() != Some(GamePhase::Racing) {
            return out;
        }

        let progress = engine.progress_percent();
        let wpm = engine.stats().wpm;
        // Identical consecutive samples carry no information.
        let sample = (progress.to_bits(), wpm);
        if self.last_sent != Some(sample) {
            if let Some(event) = sync.send_progress(progress, wpm) {
                self.last_sent = Some(sample);
                out.push(event);
            }
        }

        if engine.status() == Status::Finished
            && !self.finish_sent
            && sync.current_player().is_some_and(|p| !p.is_finished)
        {
            if let Some(event) = sync.mark_finished() {
                self.finish_sent = true;
                out.push(event);
            }
        }
        out
    }
}
