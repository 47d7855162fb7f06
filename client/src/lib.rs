pub mod channel;
pub mod config;
pub mod engine;
pub mod relay;
pub mod results;
pub mod room;
pub mod runtime;
pub mod timer;

pub use channel::{ChannelEvent, ChannelPeer, RaceChannel};
pub use config::ClientConfig;
pub use engine::{DerivedStats, Key, ScoringEngine, Status};
pub use room::RoomSync;
pub use runtime::RaceClient;
