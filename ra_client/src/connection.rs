use std::fmt;
use std::time::Duration;

use ra::{ClientMessage, GameRef, Level};
use rand::Rng;
use tracing::{debug, info};

use crate::channel::Channel;
use crate::config::ReconnectConfig;
use crate::notice::{NoticeId, Notices};
use crate::session::SessionRecord;

/// Why the connection went down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the connection on purpose. It will not come back on
    /// its own, the client has to re-open it.
    ServerInitiated,
    /// This client closed the connection.
    ClientInitiated,
    PingTimeout,
    TransportClose,
    TransportError,
    Other(String),
}

impl DisconnectReason {
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "io server disconnect" => DisconnectReason::ServerInitiated,
            "io client disconnect" => DisconnectReason::ClientInitiated,
            "ping timeout" => DisconnectReason::PingTimeout,
            "transport close" => DisconnectReason::TransportClose,
            "transport error" => DisconnectReason::TransportError,
            other => DisconnectReason::Other(String::from(other)),
        }
    }

    pub fn is_forced(&self) -> bool {
        *self == DisconnectReason::ServerInitiated
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ServerInitiated => write!(f, "io server disconnect"),
            DisconnectReason::ClientInitiated => write!(f, "io client disconnect"),
            DisconnectReason::PingTimeout => write!(f, "ping timeout"),
            DisconnectReason::TransportClose => write!(f, "transport close"),
            DisconnectReason::TransportError => write!(f, "transport error"),
            DisconnectReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// What the event loop should do after a disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Re-open the channel right away.
    ReopenNow,
    /// Retry with backoff, see [`ConnectionManager::next_retry`].
    Automatic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    /// Reconnecting was given up.
    Lost,
}

/// Owns the channel and tracks the lifecycle of the connection.
pub struct ConnectionManager<C> {
    channel: C,
    status: ConnectionStatus,
    config: ReconnectConfig,
    failed_attempts: u32,
    disconnected_notice: Option<NoticeId>,
}

impl<C: Channel> ConnectionManager<C> {
    pub fn new(channel: C, config: ReconnectConfig) -> Self {
        Self {
            channel,
            status: ConnectionStatus::Connecting,
            config,
            failed_attempts: 0,
            disconnected_notice: None,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Handles a (re)established connection. If there is a session to resume,
    /// joins its room again so the server resumes pushing its updates.
    ///
    /// Returns true if a join was sent.
    pub fn on_connect(&mut self, session: Option<&SessionRecord>, notices: &mut Notices) -> bool {
        info!("Connected");
        self.status = ConnectionStatus::Connected;
        self.failed_attempts = 0;
        if let Some(id) = self.disconnected_notice.take() {
            notices.dismiss(id);
        }
        let Some(record) = session else {
            return false;
        };
        let msg = ClientMessage::Join(GameRef {
            game_id: record.game_id.clone(),
        });
        match self.channel.send(&msg) {
            Ok(()) => {
                debug!(game_id = %record.game_id, "Rejoining game");
                true
            }
            Err(err) => {
                notices.push(Level::Error, format!("Failed to rejoin game: {:#}", err));
                false
            }
        }
    }

    pub fn on_disconnect(
        &mut self,
        reason: &DisconnectReason,
        notices: &mut Notices,
    ) -> ReconnectAction {
        info!(%reason, "Disconnected");
        self.status = ConnectionStatus::Disconnected;
        if self.disconnected_notice.is_none() {
            self.disconnected_notice = Some(notices.push_persistent(Level::Error, "Disconnected"));
        }
        if reason.is_forced() {
            ReconnectAction::ReopenNow
        } else {
            ReconnectAction::Automatic
        }
    }

    /// How long to wait before the next connection attempt, or `None` once
    /// the configured number of attempts is used up.
    ///
    /// The delay doubles with every failed attempt up to the configured cap,
    /// plus up to one base delay of random jitter.
    pub fn next_retry<R: Rng>(&mut self, rng: &mut R) -> Option<Duration> {
        if self.failed_attempts >= self.config.max_attempts {
            return None;
        }
        let shift = self.failed_attempts.min(8);
        self.failed_attempts += 1;
        let base_ms = self.config.base_delay_ms.max(1);
        let backoff_ms = base_ms
            .saturating_mul(1u64 << shift)
            .min(self.config.max_delay_ms);
        let jitter_ms = rng.gen_range(0..base_ms);
        Some(Duration::from_millis(backoff_ms + jitter_ms))
    }

    /// Gives up on reconnecting.
    pub fn give_up(&mut self, notices: &mut Notices) {
        self.status = ConnectionStatus::Lost;
        notices.push(Level::Error, "Could not reconnect to the server.");
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::channel::RecordingChannel;

    fn manager() -> ConnectionManager<RecordingChannel> {
        ConnectionManager::new(RecordingChannel::default(), ReconnectConfig::default())
    }

    #[test]
    fn connect_rejoins_the_saved_game() {
        let mut conn = manager();
        let mut notices = Notices::new();
        let record = SessionRecord {
            game_id: String::from("g1"),
            player_name: String::from("Bob"),
        };
        assert!(conn.on_connect(Some(&record), &mut notices));
        assert_eq!(
            conn.channel_mut().take(),
            [ClientMessage::Join(GameRef {
                game_id: String::from("g1")
            })]
        );
        assert!(!conn.on_connect(None, &mut notices));
        assert!(conn.channel().sent.is_empty());
    }

    #[test]
    fn disconnected_notice_lasts_until_reconnect() {
        let mut conn = manager();
        let mut notices = Notices::new();
        let action = conn.on_disconnect(&DisconnectReason::TransportClose, &mut notices);
        assert_eq!(action, ReconnectAction::Automatic);
        conn.on_disconnect(&DisconnectReason::PingTimeout, &mut notices);
        let shown = notices.drain();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].persistent);
        assert!(notices.is_active(shown[0].id));

        conn.on_connect(None, &mut notices);
        assert!(!notices.is_active(shown[0].id));
        assert!(conn.is_connected());
    }

    #[test]
    fn forced_disconnect_reopens_now() {
        let mut conn = manager();
        let mut notices = Notices::new();
        let reason = DisconnectReason::from_wire("io server disconnect");
        assert_eq!(
            conn.on_disconnect(&reason, &mut notices),
            ReconnectAction::ReopenNow
        );
    }

    #[test]
    fn retries_back_off_and_run_out() {
        let config = ReconnectConfig {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            max_attempts: 6,
        };
        let mut conn = ConnectionManager::new(RecordingChannel::default(), config);
        let mut rng = StdRng::seed_from_u64(7);
        let delays: Vec<Duration> = std::iter::from_fn(|| conn.next_retry(&mut rng)).collect();
        assert_eq!(delays.len(), 6);
        for (attempt, delay) in delays.iter().enumerate() {
            let backoff = (100u64 << attempt).min(1_000);
            assert!(*delay >= Duration::from_millis(backoff));
            assert!(*delay < Duration::from_millis(backoff + 100));
        }

        let mut notices = Notices::new();
        conn.on_connect(None, &mut notices);
        assert!(conn.next_retry(&mut rng).is_some());
    }
}
