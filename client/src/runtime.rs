use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::warn;

use shared::fsm::GamePhase;
use shared::protocol::{ClientEvent, Player, ServerEvent};

use crate::channel::{ChannelEvent, RaceChannel};
use crate::config::ClientConfig;
use crate::engine::{DerivedStats, Key, ScoringEngine, Status};
use crate::relay::ProgressRelay;
use crate::results::TestRecord;
use crate::room::{Pending, RoomSync};
use crate::timer::CountdownTimer;

const DEFAULT_DURATION_SECS: u32 = 30;

/// The assembled racing client: scoring engine, countdown, room view,
/// progress relay and the broker channel, all driven from one task.
///
/// Keystrokes and local actions are synchronous mutations; [`step`] awaits
/// the next suspension point (inbound event, countdown second, or the
/// 3-second racing deadline) and applies it. Handlers stay short and never
/// re-enter each other, which is what makes the single-writer ownership of
/// the session and the room sound without locks.
///
/// [`step`]: RaceClient::step
#[derive(Debug)]
pub struct RaceClient {
    engine: ScoringEngine,
    sync: RoomSync,
    relay: ProgressRelay,
    channel: RaceChannel,
    timer: CountdownTimer,
    race_countdown: Duration,
    /// Deadline for the countdown-to-racing transition, tagged with the
    /// room generation it was scheduled under.
    racing_deadline: Option<(u64, Instant)>,
    connected: bool,
}

impl RaceClient {
    pub fn new(config: &ClientConfig, channel: RaceChannel) -> Self {
        Self {
            engine: ScoringEngine::new("", DEFAULT_DURATION_SECS),
            sync: RoomSync::new(
                config.player_id.clone(),
                config.username.clone(),
                config.avatar_url.clone(),
            ),
            relay: ProgressRelay::new(),
            channel,
            timer: CountdownTimer::new(),
            race_countdown: config.race_countdown,
            racing_deadline: None,
            connected: true,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn stats(&self) -> DerivedStats {
        self.engine.stats()
    }

    pub fn phase(&self) -> Option<GamePhase> {
        self.sync.phase()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.sync.current_player()
    }

    pub fn standings(&self) -> Vec<&Player> {
        self.sync.standings()
    }

    pub fn is_in_room(&self) -> bool {
        self.sync.room().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Feed one classified keystroke through the engine and relay the
    /// resulting progress.
    pub fn handle_key(&mut self, key: Key) {
        let was_idle = self.engine.status() == Status::Idle;
        self.engine.handle_key(key);
        // The countdown counts from the keystroke that started the run;
        // without the re-anchor the free-running interval could deduct its
        // first second almost immediately.
        if was_idle && self.engine.status() == Status::Running {
            self.timer.reset();
        }
        self.flush_relay();
    }

    /// Start a fresh session over a new target text.
    pub fn reset(&mut self, target: impl Into<String>, duration_secs: u32) {
        self.engine.reset(target, duration_secs);
        self.relay.reset();
        self.timer.reset();
    }

    pub fn join_room(&mut self, room_id: impl Into<String>) {
        let event = self.sync.join_room(room_id);
        self.emit(event);
    }

    pub fn leave_room(&mut self) {
        self.racing_deadline = None;
        if let Some(event) = self.sync.leave_room() {
            self.emit(event);
        }
    }

    /// Snapshot of a finished session for persistence, or `None` while the
    /// test is still going.
    pub fn finished_record(&self, mode: impl Into<String>) -> Option<TestRecord> {
        if self.engine.status() != Status::Finished {
            return None;
        }
        Some(TestRecord::from_stats(
            self.sync_username(),
            self.stats(),
            mode,
            self.engine.duration_secs(),
        ))
    }

    /// Wait for and apply the next event. Returns `false` once the channel
    /// has shut down for good; the room view is cleared and the user must
    /// rejoin manually.
    pub async fn step(&mut self) -> bool {
        let deadline = self.racing_deadline;
        let wakeup = {
            let channel = &mut self.channel;
            let timer = &mut self.timer;
            tokio::select! {
                event = channel.recv() => Wakeup::Channel(event),
                _ = timer.tick() => Wakeup::CountdownTick,
                _ = until(deadline), if deadline.is_some() => Wakeup::RacingDeadline,
            }
        };

        match wakeup {
            Wakeup::Channel(Some(event)) => {
                self.on_channel_event(event);
                true
            }
            Wakeup::Channel(None) => {
                self.connected = false;
                self.racing_deadline = None;
                self.sync.handle_disconnect();
                false
            }
            Wakeup::CountdownTick => {
                if self.engine.status() == Status::Running {
                    self.engine.tick();
                    self.flush_relay();
                }
                true
            }
            Wakeup::RacingDeadline => {
                if let Some((generation, _)) = self.racing_deadline.take() {
                    self.sync.begin_racing(generation);
                    self.flush_relay();
                }
                true
            }
        }
    }

    fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => self.connected = true,
            ChannelEvent::Disconnected => self.connected = false,
            ChannelEvent::Server(event) => {
                // A new race re-arms the one-shot finish guard.
                if matches!(event, ServerEvent::GameStart { .. }) {
                    self.relay.reset();
                }
                if let Some(Pending::BeginRacing { generation }) = self.sync.apply(event) {
                    self.racing_deadline =
                        Some((generation, Instant::now() + self.race_countdown));
                }
            }
        }
    }

    fn flush_relay(&mut self) {
        for event in self.relay.sample(&self.engine, &mut self.sync) {
            self.emit(event);
        }
    }

    fn emit(&mut self, event: ClientEvent) {
        if !self.channel.emit(event) {
            warn!("channel gone, dropping outbound event");
            self.connected = false;
        }
    }

    fn sync_username(&self) -> String {
        self.sync.username().to_string()
    }
}

/// What woke the event loop up.
enum Wakeup {
    Channel(Option<ChannelEvent>),
    CountdownTick,
    RacingDeadline,
}

/// Sleep until the scheduled racing transition; pends forever when none is
/// scheduled (the select arm is guarded off in that case).
async fn until(deadline: Option<(u64, Instant)>) {
    match deadline {
        Some((_, at)) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
