use serde::{Deserialize, Serialize};

/// A race participant as seen by every client in the room.
///
/// `id` is assigned by the joining client and stays stable for the whole
/// membership. Field names follow the broker's camelCase wire format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Percentage of the target text typed, 0-100.
    pub progress: f64,
    /// Latest reported words per minute; may fluctuate between updates.
    pub wpm: u32,
    /// One-way false -> true for the lifetime of a race.
    pub is_finished: bool,
}

impl Player {
    /// Fresh descriptor for a client about to join a room.
    pub fn joining(
        id: impl Into<String>,
        username: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar_url,
            progress: 0.0,
            wpm: 0,
            is_finished: false,
        }
    }
}

/// Events emitted by a client toward the room broker.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, player: Player },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String, player_id: String },
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        room_id: String,
        player_id: String,
        progress: f64,
        wpm: u32,
    },
    #[serde(rename_all = "camelCase")]
    PlayerFinished {
        room_id: String,
        player_id: String,
        wpm: u32,
    },
}

/// Events relayed by the broker to every client in a room.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: String,
        players: Vec<Player>,
    },
    RoomLeft {},
    PlayerJoined { player: Player },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: String },
    #[serde(rename_all = "camelCase")]
    GameStart { start_timestamp: u64 },
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        player_id: String,
        progress: f64,
        wpm: u32,
    },
    #[serde(rename_all = "camelCase")]
    PlayerFinished {
        player_id: String,
        wpm: u32,
        position: u32,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        winner: Player,
        final_results: Vec<Player>,
    },
}
