use rust_fsm::StateMachineImpl;
use shared::fsm::{GamePhase, PhaseInput, PhaseMachine};
use shared::protocol::{ClientEvent, Player, ServerEvent};
use tracing::{debug, info, warn};

/// This client's view of the room it currently races in.
#[derive(Clone, Debug)]
pub struct Room {
    pub room_id: String,
    pub phase: GamePhase,
    /// Set once, on the transition into countdown.
    pub start_timestamp: Option<u64>,
    players: Vec<Player>,
}

impl Room {
    /// Members in join order. Uniqueness is by player id.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }
}

/// Work the runtime must schedule after an event was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    /// Move countdown -> racing 3 seconds after `game_start` was received.
    /// Carries the room generation so a timer that outlives the room fires
    /// into nothing.
    BeginRacing { generation: u64 },
}

/// Client-side reducer over room membership and game phase.
///
/// Inbound broker events go through [`apply`]; local intent goes through
/// the action methods, which hand back the outbound [`ClientEvent`] to emit.
/// Nothing in here performs I/O, and nothing outside mutates the room.
///
/// [`apply`]: RoomSync::apply
#[derive(Debug)]
pub struct RoomSync {
    player_id: String,
    username: String,
    avatar_url: Option<String>,
    /// Locally-cached self entry, mutated optimistically ahead of the
    /// broker echo and overwritten (never merged) when the echo arrives.
    current: Option<Player>,
    room: Option<Room>,
    /// Bumped on every room create and destroy; pending timers carry the
    /// generation they were scheduled under.
    generation: u64,
}

impl RoomSync {
    pub fn new(player_id: impl Into<String>, username: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            player_id: player_id.into(),
            username: username.into(),
            avatar_url,
            current: None,
            room: None,
            generation: 0,
        }
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current.as_ref()
    }

    pub fn phase(&self) -> Option<GamePhase> {
        self.room.as_ref().map(|r| r.phase)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Players sorted by progress descending for display. The sort is
    /// stable, so ties keep their original join order; a player's rank is
    /// its 1-based index here.
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self
            .room
            .as_ref()
            .map(|r| r.players.iter().collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| {
            b.progress
                .partial_cmp(&a.progress)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Apply one inbound broker event. Unknown players and rooms are
    /// tolerated as no-ops; this reducer never panics on protocol noise.
    pub fn apply(&mut self, event: ServerEvent) -> Option<Pending> {
        match event {
            ServerEvent::RoomJoined { room_id, players } => {
                // A snapshot while already in a room is an authoritative
                // re-snapshot; the generation bump cancels old timers.
                info!("joined room {} with {} players", room_id, players.len());
                self.current = players.iter().find(|p| p.id == self.player_id).cloned();
                self.generation += 1;
                self.room = Some(Room {
                    room_id,
                    phase: GamePhase::Waiting,
                    start_timestamp: None,
                    players,
                });
                None
            }
            ServerEvent::RoomLeft {} => {
                info!("left room");
                self.clear_room();
                None
            }
            ServerEvent::PlayerJoined { player } => {
                if let Some(room) = self.room.as_mut() {
                    match room.player_mut(&player.id) {
                        // Same id again is a refreshed snapshot, not an error.
                        Some(existing) => *existing = player,
                        None => {
                            info!("player {} joined", player.username);
                            room.players.push(player);
                        }
                    }
                }
                None
            }
            ServerEvent::PlayerLeft { player_id } => {
                if let Some(room) = self.room.as_mut() {
                    // Absent id is a silent no-op.
                    room.players.retain(|p| p.id != player_id);
                }
                None
            }
            ServerEvent::GameStart { start_timestamp } => {
                let room = self.room.as_mut()?;
                match PhaseMachine::transition(&room.phase, &PhaseInput::GameStart) {
                    Some(next) => {
                        room.phase = next;
                        room.start_timestamp = Some(start_timestamp);
                        info!("race countdown started");
                        Some(Pending::BeginRacing {
                            generation: self.generation,
                        })
                    }
                    None => {
                        warn!("game_start ignored in phase {:?}", room.phase);
                        None
                    }
                }
            }
            ServerEvent::PlayerUpdate {
                player_id,
                progress,
                wpm,
            } => {
                let progress = progress.clamp(0.0, 100.0);
                match self.room.as_mut().and_then(|r| r.player_mut(&player_id)) {
                    Some(p) => {
                        p.progress = progress;
                        p.wpm = wpm;
                    }
                    None => debug!("player_update for unknown player {}", player_id),
                }
                // The broker echo is authoritative for the self cache too.
                if let Some(me) = self.current.as_mut().filter(|c| c.id == player_id) {
                    me.progress = progress;
                    me.wpm = wpm;
                }
                None
            }
            ServerEvent::PlayerFinished {
                player_id,
                wpm,
                position,
            } => {
                // Position is informational only; it is not stored.
                info!("player {} finished in position {}", player_id, position);
                if let Some(p) = self.room.as_mut().and_then(|r| r.player_mut(&player_id)) {
                    p.is_finished = true;
                    p.progress = 100.0;
                    p.wpm = wpm;
                }
                if let Some(me) = self.current.as_mut().filter(|c| c.id == player_id) {
                    me.is_finished = true;
                    me.progress = 100.0;
                    me.wpm = wpm;
                }
                None
            }
            ServerEvent::GameOver {
                winner,
                final_results,
            } => {
                let room = self.room.as_mut()?;
                if let Some(next) = PhaseMachine::transition(&room.phase, &PhaseInput::GameOver) {
                    room.phase = next;
                }
                info!("game over, winner: {}", winner.username);
                // The broker's final snapshot replaces, never merges.
                if let Some(me) = final_results.iter().find(|p| p.id == self.player_id) {
                    self.current = Some(me.clone());
                }
                room.players = final_results;
                None
            }
        }
    }

    /// Complete the countdown scheduled under `generation`. Fires into
    /// nothing if the room was destroyed or superseded in the meantime.
    pub fn begin_racing(&mut self, generation: u64) {
        if generation != self.generation {
            debug!("stale racing timer ignored");
            return;
        }
        if let Some(room) = self.room.as_mut() {
            if let Some(next) = PhaseMachine::transition(&room.phase, &PhaseInput::CountdownElapsed) {
                room.phase = next;
                info!("race started");
            }
        }
    }

    /// Ask the broker to put this client into `room_id`. The local room is
    /// only created once the `room_joined` snapshot arrives.
    pub fn join_room(&self, room_id: impl Into<String>) -> ClientEvent {
        ClientEvent::JoinRoom {
            room_id: room_id.into(),
            player: Player::joining(
                self.player_id.clone(),
                self.username.clone(),
                self.avatar_url.clone(),
            ),
        }
    }

    /// Emit a leave request and tear the local room down optimistically.
    pub fn leave_room(&mut self) -> Option<ClientEvent> {
        let room = self.room.as_ref()?;
        let event = ClientEvent::LeaveRoom {
            room_id: room.room_id.clone(),
            player_id: self.player_id.clone(),
        };
        self.clear_room();
        Some(event)
    }

    /// Report own progress. The self cache is updated immediately for input
    /// responsiveness; the later broker echo overwrites it wholesale.
    pub fn send_progress(&mut self, progress: f64, wpm: u32) -> Option<ClientEvent> {
        let room = self.room.as_ref()?;
        let progress = progress.clamp(0.0, 100.0);
        let event = ClientEvent::PlayerUpdate {
            room_id: room.room_id.clone(),
            player_id: self.player_id.clone(),
            progress,
            wpm,
        };
        if let Some(me) = self.current.as_mut() {
            me.progress = progress;
            me.wpm = wpm;
        }
        Some(event)
    }

    /// Report own finish using the last known wpm.
    pub fn mark_finished(&mut self) -> Option<ClientEvent> {
        let room = self.room.as_ref()?;
        let me = self.current.as_mut()?;
        let event = ClientEvent::PlayerFinished {
            room_id: room.room_id.clone(),
            player_id: self.player_id.clone(),
            wpm: me.wpm,
        };
        me.is_finished = true;
        me.progress = 100.0;
        Some(event)
    }

    /// Channel teardown after exhausted reconnection: the room view is
    /// cleared and the user has to rejoin manually.
    pub fn handle_disconnect(&mut self) {
        if self.room.is_some() {
            warn!("connection lost, clearing room view");
            self.clear_room();
        }
    }

    fn clear_room(&mut self) {
        self.room = None;
        self.current = None;
        self.generation += 1;
    }
}
