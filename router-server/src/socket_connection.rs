//! The per-connection socket driver.
//!
//! One `SocketConnection` is created per accepted TCP stream (plain or
//! TLS) and implements `router_core::ClientConnection` so a `Session`
//! can push events to it without knowing about sockets at all. A
//! background task owns the actual `AsyncWrite` half and drains an
//! outbound queue sized to roughly one OS send-buffer's worth of
//! lines, so a session queueing output never blocks waiting on a slow
//! client.

use crate::ack_window::AckWindow;
use crate::ansi::render_line;
use crate::commands::{parse_post_auth, parse_pre_auth, AuthAttempts, PostAuthCommand, PreAuthCommand};
use crate::error::ConnectionError;
use crate::framing::LineCodec;
use router_core::config::RouterConfig;
use router_core::connection::{ClientConnection, SendReturnCode};
use router_core::event::{Event, EventPayload};
use router_core::ids::MessageSerialId;
use router_core::router::Router;
use router_core::session::Session;
use router_core::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use futures::{SinkExt, StreamExt};

/// The name the application's control-command channel is expected to
/// use. Input lines beginning with `!` that aren't `!help`/`!color`
/// are forwarded here verbatim.
pub const SESSION_AGENT_CHANNEL_NAME: &str = "Session Agent";

/// Name prefix for puppet channels, which are reaped after
/// `puppet_idle_secs` of inactivity.
pub const PUPPET_CHANNEL_PREFIX: &str = "Puppet ";

/// Number of queued outbound lines before the per-connection channel
/// applies back-pressure to the session. Intended to roughly track a
/// typical OS socket send buffer (~64KiB at ~100 bytes/line).
const OUTBOUND_QUEUE_CAPACITY: usize = 512;

struct OutboundLine {
    serial_id: MessageSerialId,
    text: String,
}

/// Live state for one connected client, shared between the
/// `ClientConnection` impl (called from the router/session threads)
/// and the connection's own read/write tasks.
pub struct SocketConnection {
    outbound: mpsc::Sender<OutboundLine>,
    connected: AtomicBool,
    blocked: AtomicBool,
    color_enabled: AtomicBool,
    ack_window: Mutex<AckWindow>,
}

impl SocketConnection {
    fn new(outbound: mpsc::Sender<OutboundLine>, target_ack_bytes: usize) -> Arc<Self> {
        Arc::new(SocketConnection {
            outbound,
            connected: AtomicBool::new(true),
            blocked: AtomicBool::new(false),
            color_enabled: AtomicBool::new(true),
            ack_window: Mutex::new(AckWindow::new(target_ack_bytes)),
        })
    }

    fn set_color_enabled(&self, enabled: bool) {
        self.color_enabled.store(enabled, Ordering::Relaxed);
    }

    fn render(&self, event: &Event) -> String {
        match &event.payload {
            EventPayload::Text(segments) => render_line(segments, self.color_enabled.load(Ordering::Relaxed)),
            EventPayload::Structured(_) => String::new(),
            EventPayload::ChannelStatus(change) => format!("-- {:?} --", change),
            EventPayload::Empty => String::new(),
        }
    }
}

impl ClientConnection for SocketConnection {
    fn send_event(&self, serial_id: MessageSerialId, event: &Event) -> SendReturnCode {
        if !self.connected.load(Ordering::Relaxed) {
            return SendReturnCode::Disconnected;
        }
        if matches!(event.payload, EventPayload::Structured(_)) {
            return SendReturnCode::NotSupported;
        }

        let text = self.render(event);
        let request_ack = {
            let mut window = self.ack_window.lock();
            window.record_sent(serial_id, text.len())
        };

        match self.outbound.try_send(OutboundLine { serial_id, text }) {
            Ok(()) => {
                if self.blocked.load(Ordering::Relaxed) {
                    SendReturnCode::OkBlocked
                } else if request_ack {
                    log::trace!(target: "window", "requesting ack at serial {}", serial_id);
                    SendReturnCode::Ok
                } else {
                    SendReturnCode::Ok
                }
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.blocked.store(true, Ordering::Relaxed);
                SendReturnCode::Blocked
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.connected.store(false, Ordering::Relaxed);
                SendReturnCode::Disconnected
            }
        }
    }

    fn request_disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Drives one accepted connection end to end: pre-auth handshake,
/// authentication against the router, then the post-auth read loop.
///
/// Generic over the transport so the same logic serves plain TCP and
/// TLS streams (both implement `AsyncRead + AsyncWrite`).
pub async fn serve_connection<S>(
    stream: S,
    config: Arc<RouterConfig>,
    router: Arc<Router>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut framed_in = FramedRead::new(read_half, LineCodec::new(config.max_input_line_len));
    let mut framed_out = FramedWrite::new(write_half, LineCodec::new(config.max_input_line_len));

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<OutboundLine>(OUTBOUND_QUEUE_CAPACITY);
    let connection = SocketConnection::new(outbound_tx, config.target_pending_ack_bytes);

    let writer_task = tokio::spawn(async move {
        while let Some(line) = outbound_rx.recv().await {
            if framed_out.send(line.text).await.is_err() {
                break;
            }
        }
    });

    let session = match authenticate(&mut framed_in, &router, config.as_ref()).await {
        Some(session) => session,
        None => {
            writer_task.abort();
            return Ok(());
        }
    };

    session.set_connection(connection.clone());

    while let Some(frame) = framed_in.next().await {
        let line = frame?;
        match parse_post_auth(&line) {
            PostAuthCommand::Help => {
                let _ = connection.outbound.try_send(OutboundLine {
                    serial_id: MessageSerialId::NONE,
                    text: "Commands: !help, !color on|off, !<agent command>".to_string(),
                });
            }
            PostAuthCommand::Color(enabled) => connection.set_color_enabled(enabled),
            PostAuthCommand::Agent(rest) => {
                if let Some(agent_channel) = find_channel_by_name(&session, SESSION_AGENT_CHANNEL_NAME) {
                    let _ = session.client_data(agent_channel, rest);
                }
            }
            PostAuthCommand::ChannelInput(text) => {
                if let Some(top) = current_input_channel(&session) {
                    let _ = session.client_data(top, text);
                }
            }
        }
    }

    session.connection_dropped();
    writer_task.abort();
    Ok(())
}

async fn authenticate<R>(
    framed_in: &mut FramedRead<R, LineCodec>,
    router: &Arc<Router>,
    config: &RouterConfig,
) -> Option<Arc<Session>>
where
    R: AsyncRead + Unpin,
{
    let mut attempts = AuthAttempts::new(0);
    let deadline = Duration::from_secs(config.pre_auth_timeout_secs);
    loop {
        let frame = match tokio::time::timeout(deadline, framed_in.next()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(_) => {
                log::debug!(target: "driver", "pre-auth timed out before authentication completed");
                return None;
            }
        };
        let line = match frame {
            Ok(line) => line,
            Err(_) => return None,
        };
        match parse_pre_auth(&line) {
            PreAuthCommand::Connect { site_id, name, password } => {
                match router.authorize_client(site_id, &name, &password) {
                    Ok(session) => return Some(session),
                    Err(_) => {
                        if attempts.record_failure() {
                            return None;
                        }
                    }
                }
            }
            PreAuthCommand::Unrecognized => {
                if attempts.record_failure() {
                    return None;
                }
            }
        }
    }
}

fn find_channel_by_name(session: &Session, name: &str) -> Option<router_core::ids::ChannelId> {
    session.get_channel_info().into_iter().find(|c| c.name == name).map(|c| c.id)
}

/// Picks the channel that should receive the next line of ordinary
/// (non-`!`) client input: the most recently added text channel that
/// isn't the session agent, mirroring a simple focus stack where
/// "push a puppet" means "the newest puppet channel wins".
fn current_input_channel(session: &Session) -> Option<router_core::ids::ChannelId> {
    session
        .get_channel_info()
        .into_iter()
        .filter(|c| c.name != SESSION_AGENT_CHANNEL_NAME && matches!(c.kind, router_core::stats::ChannelInfoKind::Text))
        .last()
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_agent_name_is_stable_for_command_routing() {
        assert_eq!(SESSION_AGENT_CHANNEL_NAME, "Session Agent");
    }
}
