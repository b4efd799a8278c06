use std::io::{BufRead, BufReader, Read};
use std::net::TcpStream;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use anyhow::Context;
use ra::{ClientMessage, ServerEvent};
use tracing::{debug, trace, warn};

use crate::channel::{Channel, JsonLinesChannel};
use crate::connection::DisconnectReason;

/// What the reader thread of a connection reports.
#[derive(Debug)]
pub enum TransportEvent {
    Frame {
        connection: u64,
        event: ServerEvent,
    },
    Closed {
        connection: u64,
        reason: DisconnectReason,
    },
}

/// The sending half of a TCP connection that can be swapped out on reconnect.
#[derive(Default)]
pub struct TcpChannel {
    writer: Option<JsonLinesChannel<TcpStream>>,
}

impl TcpChannel {
    pub fn attach(&mut self, stream: TcpStream) {
        self.writer = Some(JsonLinesChannel::new(stream));
    }

    pub fn detach(&mut self) {
        if let Some(writer) = self.writer.take() {
            let _ = writer.into_inner().shutdown(std::net::Shutdown::Both);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.writer.is_some()
    }
}

impl Channel for TcpChannel {
    fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        match &mut self.writer {
            Some(writer) => writer.send(msg),
            None => anyhow::bail!("Not connected"),
        }
    }
}

pub fn connect(server: &str) -> anyhow::Result<TcpStream> {
    let stream = TcpStream::connect(server)
        .with_context(|| format!("Could not connect to '{}'", server))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Reads frames from `reader` until the connection ends and forwards them.
///
/// A `disconnect` frame is remembered so that the close that follows is
/// reported as initiated by the server. Frames that do not decode are
/// skipped.
pub fn read_frames<R, T>(reader: R, connection: u64, tx: &Sender<T>)
where
    R: Read,
    T: From<TransportEvent>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = String::new();
    let mut announced: Option<String> = None;
    let reason = loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => {
                break announced
                    .as_deref()
                    .map(DisconnectReason::from_wire)
                    .unwrap_or(DisconnectReason::TransportClose)
            }
            Ok(_) => {}
            Err(err) => {
                debug!(connection, "Read failed: {}", err);
                break DisconnectReason::TransportError;
            }
        }
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        trace!(name: "Received frame", connection, frame = %line);
        let event = match serde_json::from_str::<ServerEvent>(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(connection, "Skipping undecodable frame: {}", err);
                continue;
            }
        };
        if let ServerEvent::Disconnect { reason } = &event {
            announced = Some(reason.clone());
        }
        if tx.send(TransportEvent::Frame { connection, event }.into()).is_err() {
            // Nobody is listening anymore.
            return;
        }
    };
    let _ = tx.send(TransportEvent::Closed { connection, reason }.into());
}

/// Spawns a thread that reads frames from the stream.
pub fn spawn_reader<T>(stream: TcpStream, connection: u64, tx: Sender<T>) -> JoinHandle<()>
where
    T: From<TransportEvent> + Send + 'static,
{
    std::thread::spawn(move || read_frames(stream, connection, &tx))
}
