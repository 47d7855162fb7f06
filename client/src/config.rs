use std::env;
use std::time::Duration;

use uuid::Uuid;

const DEFAULT_SERVER_URL: &str = "ws://localhost:3001/ws";
const DEFAULT_USERNAME: &str = "Anonymous";

/// Settings for one racing client.
///
/// Constructed explicitly by the composing application; [`from_env`] offers
/// the usual env-var overrides after loading `.env` via dotenvy.
///
/// [`from_env`]: ClientConfig::from_env
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// WebSocket URL of the room broker.
    pub server_url: String,
    /// Stable id this client assigns itself when joining rooms.
    pub player_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    /// Bounded reconnection: how many times the channel retries before the
    /// room view is cleared for good.
    pub reconnect_attempts: u32,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay: Duration,
    /// Client-local delay between `game_start` receipt and racing.
    pub race_countdown: Duration,
    /// Postgres connection string for result persistence, if any.
    pub database_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            player_id: Uuid::new_v4().to_string(),
            username: DEFAULT_USERNAME.to_string(),
            avatar_url: None,
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(1),
            race_countdown: Duration::from_secs(3),
            database_url: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `KEYSPRINT_SERVER_URL`, `KEYSPRINT_USERNAME`
    /// and `DATABASE_URL`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(url) = env::var("KEYSPRINT_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(name) = env::var("KEYSPRINT_USERNAME") {
            config.username = name;
        }
        config.database_url = env::var("DATABASE_URL").ok();
        config
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_broker_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.reconnect_attempts, 5);
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.race_countdown, Duration::from_secs(3));
        assert!(!config.player_id.is_empty());
    }

    #[test]
    fn distinct_clients_get_distinct_ids() {
        assert_ne!(
            ClientConfig::default().player_id,
            ClientConfig::default().player_id
        );
    }

    #[test]
    fn builder_setters() {
        let config = ClientConfig::default()
            .with_username("bob")
            .with_server_url("ws://example:9000/ws")
            .with_avatar_url("http://a/b.png");
        assert_eq!(config.username, "bob");
        assert_eq!(config.server_url, "ws://example:9000/ws");
        assert_eq!(config.avatar_url.as_deref(), Some("http://a/b.png"));
    }
}
