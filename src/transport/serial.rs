use super::{ByteStream, Connector};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Upper bound on a single blocking read while waiting for a response.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Unmatched received bytes kept between reads before the oldest are dropped.
const MAX_PENDING: usize = 10000;

/// Opens real serial ports through the `serialport` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        _response_timeout: Duration,
        open_timeout: Duration,
    ) -> Result<Box<dyn ByteStream>> {
        let handle = serialport::new(port, baud_rate)
            .timeout(open_timeout)
            .open()
            .with_context(|| format!("Failed to open serial port {port} at {baud_rate} bauds"))?;
        debug!(port, baud_rate, "serial port opened");
        Ok(Box::new(SerialStream::new(port, handle, open_timeout)))
    }
}

/// A serial port opened by [`SerialConnector`].
///
/// Received bytes are matched as bytes, so a multi-byte character split
/// across two reads still matches.
pub struct SerialStream {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    write_timeout: Duration,
    pending: Vec<u8>,
}

impl SerialStream {
    pub(crate) fn new(name: &str, port: Box<dyn SerialPort>, write_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            port: Some(port),
            write_timeout,
            pending: Vec::new(),
        }
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .with_context(|| format!("Serial port {} is closed", self.name))
    }

    /// Drop the oldest unmatched bytes once the buffer exceeds [`MAX_PENDING`],
    /// keeping enough of the tail for a match that straddles the next read.
    fn trim_pending(&mut self, expected: &[u8]) {
        if self.pending.len() > MAX_PENDING {
            let keep = (MAX_PENDING / 2).max(expected.len().saturating_sub(1));
            let cut = self.pending.len() - keep;
            self.pending.drain(..cut);
        }
    }
}

/// Find `expected` in `buffer`, returning the matched prefix and draining it.
fn take_match_bytes(buffer: &mut Vec<u8>, expected: &[u8]) -> Option<Vec<u8>> {
    if expected.is_empty() {
        return Some(Vec::new());
    }
    let idx = buffer
        .windows(expected.len())
        .position(|window| window == expected)?;
    Some(buffer.drain(..idx + expected.len()).collect())
}

#[async_trait(?Send)]
impl ByteStream for SerialStream {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "serial port closed");
        }
    }

    /// Reads are bounded by the deadline passed to `read_until`, so the serial
    /// backend has no separate live timeout to update.
    fn set_timeout(&mut self, _timeout: Duration) {}

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let write_timeout = self.write_timeout;
        let name = self.name.clone();
        let port = self.port_mut()?;
        port.set_timeout(write_timeout)?;
        trace!(port = %name, data = %String::from_utf8_lossy(data).escape_default(), "write");
        port.write_all(data)
            .with_context(|| format!("Failed to write to serial port {name}"))?;
        port.flush()?;
        Ok(())
    }

    async fn read_until(&mut self, expected: &str, timeout: Duration) -> Result<String> {
        let expected = expected.as_bytes();
        if let Some(found) = take_match_bytes(&mut self.pending, expected) {
            return Ok(String::from_utf8_lossy(&found).into_owned());
        }

        let deadline = tokio::time::Instant::now() + timeout;
        let mut chunk = [0u8; 1024];
        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                self.trim_pending(expected);
                return Ok(String::new());
            }
            let poll = (deadline - now).min(READ_POLL_INTERVAL);

            let port = self.port_mut()?;
            port.set_timeout(poll)?;
            match port.read(&mut chunk) {
                Ok(0) => {}
                Ok(n) => {
                    trace!(
                        port = %self.name,
                        data = %String::from_utf8_lossy(&chunk[..n]).escape_default(),
                        "read"
                    );
                    self.pending.extend_from_slice(&chunk[..n]);
                    if let Some(found) = take_match_bytes(&mut self.pending, expected) {
                        return Ok(String::from_utf8_lossy(&found).into_owned());
                    }
                    self.trim_pending(expected);
                }
                Err(err) if err.kind() == ErrorKind::TimedOut => {}
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to read from serial port {}", self.name));
                }
            }
            // Let other tasks (signal handling) run between polls.
            tokio::task::yield_now().await;
        }
    }
}

impl Drop for SerialStream {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails() {
        let err = SerialConnector
            .open(
                "/dev/sercmd-no-such-port",
                9600,
                Duration::from_secs(1),
                Duration::from_secs(1),
            )
            .err()
            .unwrap()
            .to_string();
        assert!(err.contains("/dev/sercmd-no-such-port"), "got: {err}");
    }

    #[test]
    fn test_take_match_bytes() {
        let mut buffer = b"boot\r\nOK\r\nmore".to_vec();
        assert_eq!(take_match_bytes(&mut buffer, b"OK").unwrap(), b"boot\r\nOK");
        assert_eq!(buffer, b"\r\nmore");
        assert!(take_match_bytes(&mut buffer, b"OK").is_none());
        assert_eq!(buffer, b"\r\nmore");
    }

    #[cfg(unix)]
    mod pty {
        use super::*;
        use serialport::{SerialPort, TTYPort};
        use std::io::{Read, Write};
        use std::time::Instant;

        /// A stream on one end of a pseudo-terminal pair, plus the other end.
        fn stream_pair() -> (SerialStream, TTYPort) {
            let (local, mut remote) = TTYPort::pair().unwrap();
            remote.set_timeout(Duration::from_secs(1)).unwrap();
            let stream = SerialStream::new("pty", Box::new(local), Duration::from_secs(1));
            (stream, remote)
        }

        #[tokio::test]
        async fn test_write_reaches_remote() {
            let (mut stream, mut remote) = stream_pair();
            stream.write(b"ping\r").await.unwrap();

            let mut buf = [0u8; 5];
            remote.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"ping\r");
        }

        #[tokio::test]
        async fn test_match_spans_two_reads() {
            let (mut stream, mut remote) = stream_pair();
            let writer = std::thread::spawn(move || {
                remote.write_all(b"...O").unwrap();
                std::thread::sleep(Duration::from_millis(80));
                remote.write_all(b"K\r\n").unwrap();
                remote
            });

            let found = stream
                .read_until("OK", Duration::from_secs(2))
                .await
                .unwrap();
            assert_eq!(found, "...OK");
            drop(writer.join().unwrap());
        }

        #[tokio::test]
        async fn test_multibyte_character_split_across_reads() {
            let (mut stream, mut remote) = stream_pair();
            let bytes = "température".as_bytes().to_vec();
            let split = "temp".len() + 1;
            let writer = std::thread::spawn(move || {
                remote.write_all(&bytes[..split]).unwrap();
                std::thread::sleep(Duration::from_millis(80));
                remote.write_all(&bytes[split..]).unwrap();
                remote
            });

            let found = stream
                .read_until("température", Duration::from_secs(2))
                .await
                .unwrap();
            assert_eq!(found, "température");
            drop(writer.join().unwrap());
        }

        #[tokio::test]
        async fn test_timeout_returns_empty_after_deadline() {
            let (mut stream, _remote) = stream_pair();

            let start = Instant::now();
            let found = stream
                .read_until("never", Duration::from_millis(100))
                .await
                .unwrap();
            assert_eq!(found, "");
            assert!(start.elapsed() >= Duration::from_millis(100));
            assert!(start.elapsed() < Duration::from_secs(2));
        }

        #[tokio::test]
        async fn test_read_deadline_ignores_live_timeout() {
            let (mut stream, _remote) = stream_pair();
            stream.set_timeout(Duration::from_secs(5));

            let start = Instant::now();
            let found = stream
                .read_until("never", Duration::from_millis(50))
                .await
                .unwrap();
            assert_eq!(found, "");
            assert!(start.elapsed() < Duration::from_secs(2));
        }

        #[tokio::test]
        async fn test_text_after_match_kept_for_next_read() {
            let (mut stream, mut remote) = stream_pair();
            remote.write_all(b"one\r\ntwo\r\n").unwrap();

            let first = stream
                .read_until("one", Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(first, "one");
            let second = stream
                .read_until("two", Duration::from_millis(200))
                .await
                .unwrap();
            assert_eq!(second, "\r\ntwo");
        }

        #[tokio::test]
        async fn test_unmatched_bytes_are_capped() {
            let (mut stream, mut remote) = stream_pair();
            let noise = vec![b'x'; 2000];
            for _ in 0..20 {
                remote.write_all(&noise).unwrap();
                let found = stream
                    .read_until("OK", Duration::from_millis(50))
                    .await
                    .unwrap();
                assert_eq!(found, "");
                assert!(stream.pending.len() <= MAX_PENDING);
            }

            remote.write_all(b"O").unwrap();
            assert_eq!(
                stream
                    .read_until("OK", Duration::from_millis(50))
                    .await
                    .unwrap(),
                ""
            );
            remote.write_all(b"K").unwrap();
            let found = stream
                .read_until("OK", Duration::from_millis(500))
                .await
                .unwrap();
            assert!(found.ends_with("OK"), "got: {found}");
            assert!(stream.pending.is_empty());
        }

        #[tokio::test]
        async fn test_closed_stream_rejects_io() {
            let (mut stream, _remote) = stream_pair();
            stream.close();
            assert!(!stream.is_open());
            assert!(stream.write(b"x").await.is_err());
            assert!(stream.read_until("x", Duration::from_millis(10)).await.is_err());
        }
    }
}
