//! Byte-stream transports that scripts drive.
//!
//! A [`Connector`] opens a [`ByteStream`] for a port name and baud rate. The
//! interpreter only ever talks to these two traits, so the serial backend in
//! [`serial`] and the in-memory [`fake`] are interchangeable.

pub mod fake;
pub mod serial;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use fake::{FakeConnector, FakeHandle};
pub use serial::SerialConnector;

/// An open, bidirectional byte stream such as a serial port.
#[async_trait(?Send)]
pub trait ByteStream {
    /// Whether the underlying device is still open.
    fn is_open(&self) -> bool;

    /// Release the underlying device. Closing twice is a no-op.
    fn close(&mut self);

    /// Update the live response timeout of the stream.
    fn set_timeout(&mut self, timeout: Duration);

    /// Write all of `data` to the stream.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `expected` appears in the received text or `timeout` elapses.
    ///
    /// Returns everything received up to and including the match. On timeout
    /// the result is an empty string; received text stays buffered so a later
    /// read can still match it.
    async fn read_until(&mut self, expected: &str, timeout: Duration) -> Result<String>;
}

/// Opens [`ByteStream`]s on demand for the `CONNECT` directive.
pub trait Connector {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        response_timeout: Duration,
        open_timeout: Duration,
    ) -> Result<Box<dyn ByteStream>>;
}

/// Find `expected` in `buffer`, returning the matched prefix and draining it.
pub(crate) fn take_match(buffer: &mut String, expected: &str) -> Option<String> {
    let idx = buffer.find(expected)?;
    let end = idx + expected.len();
    Some(buffer.drain(..end).collect())
}
