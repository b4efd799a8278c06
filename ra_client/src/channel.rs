use std::io::Write;

use ra::ClientMessage;
use tracing::trace;

/// The outbound half of the connection to the server.
///
/// Sending never waits for a reply: the effects of a message arrive later as
/// server events.
pub trait Channel {
    fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()>;
}

/// Writes every message as one line of JSON.
pub struct JsonLinesChannel<W> {
    writer: W,
    // A re-usable buffer for serialization.
    // Should always be empty before and after send().
    buf: Vec<u8>,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Channel for JsonLinesChannel<W> {
    fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, msg)?;
        trace!(name: "Sending frame", frame = %String::from_utf8_lossy(&self.buf));
        self.buf.push(b'\n');
        let result = self
            .writer
            .write_all(&self.buf)
            .and_then(|()| self.writer.flush());
        self.buf.clear();
        Ok(result?)
    }
}

/// Keeps every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub sent: Vec<ClientMessage>,
}

impl RecordingChannel {
    pub fn take(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.sent)
    }
}

impl Channel for RecordingChannel {
    fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        self.sent.push(msg.clone());
        Ok(())
    }
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        (**self).send(msg)
    }
}
