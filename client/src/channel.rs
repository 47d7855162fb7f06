use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use shared::protocol::{ClientEvent, ServerEvent};

use crate::config::ClientConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the transport delivers to the runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Server(ServerEvent),
}

/// Bidirectional event channel to the room broker.
///
/// An explicitly constructed, explicitly dropped resource: [`connect`]
/// spawns one background transport task that owns the socket; dropping the
/// handle tears it down. [`pair`] builds the same handle over in-process
/// queues so tests and local brokers can stand in for the wire.
///
/// [`connect`]: RaceChannel::connect
/// [`pair`]: RaceChannel::pair
#[derive(Debug)]
pub struct RaceChannel {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<ChannelEvent>,
    task: Option<JoinHandle<()>>,
}

/// The far side of a [`RaceChannel::pair`], playing the broker.
#[derive(Debug)]
pub struct ChannelPeer {
    /// Events the client emitted.
    pub outbound: mpsc::UnboundedReceiver<ClientEvent>,
    /// Feed for events toward the client.
    pub inbound: mpsc::UnboundedSender<ChannelEvent>,
}

impl RaceChannel {
    /// Open the WebSocket connection to the broker. Fails only if the very
    /// first connect is refused; later drops go through bounded
    /// reconnection (fixed delay) and surface as [`ChannelEvent`]s.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let url = config.server_url.clone();
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("connecting to {url}"))?;
        info!("connected to {url}");

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();
        let _ = ev_tx.send(ChannelEvent::Connected);

        let attempts = config.reconnect_attempts;
        let delay = config.reconnect_delay;
        let task = tokio::spawn(async move {
            transport_loop(socket, url, attempts, delay, out_rx, ev_tx).await;
        });

        Ok(Self {
            outbound: out_tx,
            inbound: ev_rx,
            task: Some(task),
        })
    }

    /// In-process channel for tests and scripted brokers. No task, no
    /// socket, no reconnection.
    pub fn pair() -> (Self, ChannelPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: out_tx,
                inbound: ev_rx,
                task: None,
            },
            ChannelPeer {
                outbound: out_rx,
                inbound: ev_tx,
            },
        )
    }

    /// Fire-and-forget emission. Returns false once the transport is gone;
    /// in-flight events are not replayed.
    pub fn emit(&self, event: ClientEvent) -> bool {
        self.outbound.send(event).is_ok()
    }

    /// Next inbound event, or `None` once the transport has shut down for
    /// good (reconnection exhausted or the channel dropped).
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        self.inbound.recv().await
    }

    /// Tear the transport down now instead of at drop. Already-buffered
    /// events still drain through [`recv`], which then returns `None`.
    ///
    /// [`recv`]: RaceChannel::recv
    pub fn disconnect(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.inbound.close();
    }
}

impl Drop for RaceChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Owns the socket until either side shuts the channel down, reconnecting
/// through drops until the attempt budget runs out.
async fn transport_loop(
    first: WsStream,
    url: String,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let mut socket = first;
    loop {
        if pump_socket(socket, &mut outbound, &events).await {
            // local shutdown
            return;
        }
        let _ = events.send(ChannelEvent::Disconnected);
        match reconnect(&url, reconnect_attempts, reconnect_delay).await {
            Some(fresh) => {
                socket = fresh;
                let _ = events.send(ChannelEvent::Connected);
            }
            None => {
                warn!("reconnection attempts exhausted, closing channel");
                return;
            }
        }
    }
}

/// Run one socket until it drops (returns false) or the client side shuts
/// down (returns true).
async fn pump_socket(
    socket: WsStream,
    outbound: &mut mpsc::UnboundedReceiver<ClientEvent>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> bool {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return false;
                        }
                    }
                    Err(e) => warn!("failed to encode outbound event: {e}"),
                },
                None => {
                    let _ = sink.close().await;
                    return true;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if events.send(ChannelEvent::Server(event)).is_err() {
                                return true;
                            }
                        }
                        // Protocol noise is skipped, never fatal.
                        Err(e) => debug!("skipping malformed frame: {e}"),
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return false,
                Some(Ok(_)) => {}
            }
        }
    }
}

async fn reconnect(url: &str, attempts: u32, delay: Duration) -> Option<WsStream> {
    for attempt in 1..=attempts {
        tokio::time::sleep(delay).await;
        info!("reconnect attempt {attempt}/{attempts}");
        match connect_async(url).await {
            Ok((socket, _)) => return Some(socket),
            Err(e) => warn!("reconnect failed: {e}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::Player;

    #[tokio::test]
    async fn pair_routes_both_directions() {
        let (mut channel, mut peer) = RaceChannel::pair();

        assert!(channel.emit(ClientEvent::LeaveRoom {
            room_id: "main".into(),
            player_id: "me".into(),
        }));
        match peer.outbound.recv().await {
            Some(ClientEvent::LeaveRoom { room_id, .. }) => assert_eq!(room_id, "main"),
            other => panic!("unexpected {other:?}"),
        }

        peer.inbound
            .send(ChannelEvent::Server(ServerEvent::PlayerJoined {
                player: Player::joining("p2", "bob", None),
            }))
            .unwrap();
        match channel.recv().await {
            Some(ChannelEvent::Server(ServerEvent::PlayerJoined { player })) => {
                assert_eq!(player.id, "p2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn recv_ends_when_the_peer_goes_away() {
        let (mut channel, peer) = RaceChannel::pair();
        drop(peer);
        assert_eq!(channel.recv().await, None);
    }

    #[tokio::test]
    async fn disconnect_drains_buffered_events_then_ends_the_stream() {
        let (mut channel, peer) = RaceChannel::pair();
        peer.inbound.send(ChannelEvent::Connected).unwrap();

        channel.disconnect();
        assert_eq!(channel.recv().await, Some(ChannelEvent::Connected));
        assert_eq!(channel.recv().await, None);
    }

    #[tokio::test]
    async fn emit_fails_once_the_peer_is_gone() {
        let (channel, peer) = RaceChannel::pair();
        drop(peer);
        assert!(!channel.emit(ClientEvent::LeaveRoom {
            room_id: "main".into(),
            player_id: "me".into(),
        }));
    }
}
