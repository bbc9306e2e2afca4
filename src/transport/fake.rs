//! In-memory transport for tests and dry runs.
//!
//! A [`FakeConnector`] hands out streams that record every write and answer
//! with scripted replies. Keep a [`FakeHandle`] to inspect the traffic after
//! the engine that owns the connector has finished.

use super::{ByteStream, Connector, take_match};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct FakeState {
    replies: Vec<(Vec<u8>, String)>,
    inbound: String,
    writes: Vec<Vec<u8>>,
    opened: Vec<(String, u32)>,
    open_error: Option<String>,
    opens_closed: bool,
    open: bool,
    timeout: Option<Duration>,
    closes: usize,
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scriptable [`Connector`] backed by shared in-memory state.
#[derive(Clone, Default)]
pub struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` as inbound text whenever exactly `trigger` is written.
    pub fn reply_to(self, trigger: impl AsRef<[u8]>, reply: impl Into<String>) -> Self {
        lock(&self.state)
            .replies
            .push((trigger.as_ref().to_vec(), reply.into()));
        self
    }

    /// Make `text` readable before anything has been written.
    pub fn with_inbound(self, text: impl Into<String>) -> Self {
        lock(&self.state).inbound.push_str(&text.into());
        self
    }

    /// Make every `open` call fail with `message`.
    pub fn fail_open(self, message: impl Into<String>) -> Self {
        lock(&self.state).open_error = Some(message.into());
        self
    }

    /// Make `open` succeed but hand back a stream that is already closed.
    pub fn open_closed(self) -> Self {
        lock(&self.state).opens_closed = true;
        self
    }

    pub fn handle(&self) -> FakeHandle {
        FakeHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Connector for FakeConnector {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        response_timeout: Duration,
        _open_timeout: Duration,
    ) -> Result<Box<dyn ByteStream>> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.open_error {
            bail!("{message}");
        }
        state.opened.push((port.to_string(), baud_rate));
        state.open = !state.opens_closed;
        state.timeout = Some(response_timeout);
        Ok(Box::new(FakeStream {
            state: Arc::clone(&self.state),
            open: state.open,
        }))
    }
}

/// Read-only view of the traffic seen by a [`FakeConnector`].
#[derive(Clone)]
pub struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl FakeHandle {
    /// Every write, in order, one entry per `write` call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    /// `(port, baud)` for every successful open.
    pub fn opened(&self) -> Vec<(String, u32)> {
        lock(&self.state).opened.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// The live response timeout of the most recently opened stream.
    pub fn timeout(&self) -> Option<Duration> {
        lock(&self.state).timeout
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).closes
    }
}

struct FakeStream {
    state: Arc<Mutex<FakeState>>,
    open: bool,
}

#[async_trait(?Send)]
impl ByteStream for FakeStream {
    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            let mut state = lock(&self.state);
            state.open = false;
            state.closes += 1;
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        lock(&self.state).timeout = Some(timeout);
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            bail!("Fake stream is closed");
        }
        let mut state = lock(&self.state);
        state.writes.push(data.to_vec());
        let replies: Vec<String> = state
            .replies
            .iter()
            .filter(|(trigger, _)| trigger.as_slice() == data)
            .map(|(_, reply)| reply.clone())
            .collect();
        for reply in replies {
            state.inbound.push_str(&reply);
        }
        Ok(())
    }

    async fn read_until(&mut self, expected: &str, timeout: Duration) -> Result<String> {
        if !self.open {
            bail!("Fake stream is closed");
        }
        if let Some(found) = take_match(&mut lock(&self.state).inbound, expected) {
            return Ok(found);
        }
        // Nothing else can arrive while the run is suspended here.
        tokio::time::sleep(timeout).await;
        Ok(String::new())
    }
}
