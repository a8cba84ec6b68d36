//! Client connections and input multiplexing.
//!
//! Input is only ever read if it is already there. Bytes are collected on
//! the [`Connection`] until a full line has arrived, so a client that sends
//! half a command never holds up the task serving it. Waiting for more input
//! goes through [`Watch`] handles, which need no access to the connection
//! itself and can be awaited after every lock has been released.

use futures_util::future::select_all;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Longest line kept, in bytes. The rest of a longer line is discarded.
pub const MAX_LINE_LEN: usize = 1024;

/// How long a write may wait for a client that is not reading.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 512;

/// Process-unique identifier of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A complete line without its line ending.
    Line(String),
    /// The client closed the connection or it failed.
    Closed,
}

/// What a command found for its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Given on the command line or on an already received next line.
    Present(String),
    /// Nothing given and nothing waiting.
    Missing,
    /// The client hung up before sending one.
    Disconnected,
}

/// One client socket.
///
/// A connection has exactly one owner at a time: the lobby registry or a
/// seat in one game. Handing it over is a move.
pub struct Connection {
    id: ConnId,
    peer: SocketAddr,
    stream: Arc<TcpStream>,
    /// Received bytes not yet handed out as lines.
    received: Vec<u8>,
    /// Dropping the tail of an overlong line until its newline arrives.
    skipping: bool,
    closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Connection {
            id: ConnId::next(),
            peer,
            stream: Arc::new(stream),
            received: Vec::new(),
            skipping: false,
            closed: false,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Writes `text` to the client.
    ///
    /// Failures are only logged. A client that stops reading for
    /// `SEND_TIMEOUT` is treated as gone.
    pub async fn send(&mut self, text: &str) {
        self.send_bytes(text.as_bytes()).await;
    }

    pub async fn send_bytes(&mut self, bytes: &[u8]) {
        match tokio::time::timeout(SEND_TIMEOUT, write_all(&self.stream, bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Write to {} ({}) failed: {}", self.id, self.peer, e),
            Err(_) => {
                tracing::debug!("Write to {} ({}) timed out", self.id, self.peer);
                self.closed = true;
            }
        }
    }

    /// Reads whatever the socket already holds, up to the end of the next
    /// line. Never waits.
    pub fn fill(&mut self) {
        let mut chunk = [0u8; READ_CHUNK];
        while !self.closed && !self.has_line() {
            match self.stream.try_read(&mut chunk) {
                Ok(0) => self.close_input(),
                Ok(n) => self.absorb(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::debug!("Read from {} ({}) failed: {}", self.id, self.peer, e);
                    self.close_input();
                }
            }
        }
    }

    /// True if [`next_input`](Self::next_input) has something to return.
    pub fn has_input(&self) -> bool {
        self.closed || self.has_line()
    }

    /// The next complete line, or `Closed` once the client is gone and every
    /// line before that has been handed out. `None` while a line is still
    /// incomplete.
    pub fn next_input(&mut self) -> Option<Input> {
        self.fill();
        if let Some(line) = self.take_line() {
            return Some(Input::Line(line));
        }
        if self.closed {
            return Some(Input::Closed);
        }
        None
    }

    /// Resolves a command argument: the inline text if there is any,
    /// otherwise the next line if it has already arrived.
    pub fn argument(&mut self, inline: &str) -> Argument {
        let inline = inline.trim();
        if !inline.is_empty() {
            return Argument::Present(inline.to_string());
        }
        match self.next_input() {
            Some(Input::Line(line)) => Argument::Present(line.trim().to_string()),
            Some(Input::Closed) => Argument::Disconnected,
            None => Argument::Missing,
        }
    }

    /// A handle that can wait for this client's socket to become readable.
    pub fn watch(&self) -> Watch {
        Watch {
            stream: Arc::clone(&self.stream),
        }
    }

    /// Shuts down the write side and drops the socket.
    pub async fn close(self) {
        match Arc::try_unwrap(self.stream) {
            Ok(mut stream) => {
                if let Err(e) = stream.shutdown().await {
                    tracing::debug!("Shutdown of {} failed: {}", self.id, e);
                }
            }
            // A watch still shares the socket; it closes when that is dropped.
            Err(_) => tracing::debug!("Closing {} while it is being watched", self.id),
        }
    }

    fn has_line(&self) -> bool {
        self.received.contains(&b'\n')
    }

    fn absorb(&mut self, mut data: &[u8]) {
        if self.skipping {
            match data.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.skipping = false;
                    self.received.push(b'\n');
                    data = &data[end + 1..];
                }
                None => return,
            }
        }
        self.received.extend_from_slice(data);
        if !self.has_line() && self.received.len() > MAX_LINE_LEN {
            self.received.truncate(MAX_LINE_LEN);
            self.skipping = true;
        }
    }

    /// End of input. An unterminated last line still counts as a line.
    fn close_input(&mut self) {
        if !self.received.is_empty() && !self.has_line() {
            self.received.push(b'\n');
        }
        self.skipping = false;
        self.closed = true;
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.received.iter().position(|&b| b == b'\n')?;
        let rest = self.received.split_off(end + 1);
        let mut line = std::mem::replace(&mut self.received, rest);
        line.truncate(end);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        line.truncate(MAX_LINE_LEN);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("buffered", &self.received.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Shared handle on a connection's socket, used only to wait for input.
#[derive(Debug, Clone)]
pub struct Watch {
    stream: Arc<TcpStream>,
}

impl Watch {
    async fn readable(self) {
        if let Err(e) = self.stream.readable().await {
            tracing::debug!("Readiness wait failed: {}", e);
        }
    }
}

/// Waits up to `timeout` for any watched socket to become readable.
///
/// Returns false if the wait timed out. With nothing to watch this simply
/// sleeps for `timeout`. Readiness only means bytes arrived; the caller
/// still checks each connection for a complete line.
pub async fn wait_readable(watches: Vec<Watch>, timeout: Duration) -> bool {
    if watches.is_empty() {
        tokio::time::sleep(timeout).await;
        return false;
    }

    let waits = watches.into_iter().map(|w| Box::pin(w.readable()));
    tokio::time::timeout(timeout, select_all(waits)).await.is_ok()
}

async fn write_all(stream: &TcpStream, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        stream.writable().await?;
        match stream.try_write(bytes) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
