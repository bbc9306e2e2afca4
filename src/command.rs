//! The [`ScriptCommand`] trait and the [`Session`] state commands run against.

use crate::transport::{ByteStream, Connector};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Response timeout used until a script runs `CFGRESTIMEOUT`.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout handed to the connector when `CONNECT` opens a port.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(1);

/// End-of-line sequence appended to commands and sent by `EOL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eol {
    #[default]
    Cr,
    Lf,
    CrLf,
}

impl Eol {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Eol::Cr => b"\r",
            Eol::Lf => b"\n",
            Eol::CrLf => b"\r\n",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Eol::Cr => "CR",
            Eol::Lf => "LF",
            Eol::CrLf => "CRLF",
        }
    }
}

impl FromStr for Eol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CR" => Ok(Eol::Cr),
            "LF" => Ok(Eol::Lf),
            "CRLF" => Ok(Eol::CrLf),
            _ => Err(anyhow!("Invalid EOL value '{s}' (expected CR, LF or CRLF)")),
        }
    }
}

impl fmt::Display for Eol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpreter state shared by every command of a run.
///
/// Holds the current end-of-line convention, the response timeout used by
/// `RES`, and the byte stream opened by `CONNECT`, if any.
pub struct Session {
    pub(crate) eol: Eol,
    pub(crate) response_timeout: Duration,
    pub(crate) stream: Option<Box<dyn ByteStream>>,
    connector: Box<dyn Connector>,
}

impl Session {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            eol: Eol::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            stream: None,
            connector: Box::new(connector),
        }
    }

    pub fn eol(&self) -> Eol {
        self.eol
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Whether a stream is present and still open.
    pub fn is_connected(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| stream.is_open())
    }

    /// Open a new stream, closing the current one first.
    pub(crate) fn connect(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        self.disconnect();
        let stream =
            self.connector
                .open(port, baud_rate, self.response_timeout, OPEN_TIMEOUT)?;
        if !stream.is_open() {
            bail!("Serial port {port} did not stay open");
        }
        self.stream = Some(stream);
        Ok(())
    }

    /// Close the current stream. Returns whether one was open.
    pub(crate) fn disconnect(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                let was_open = stream.is_open();
                stream.close();
                was_open
            }
            None => false,
        }
    }

    /// The open stream, or a "not connected" error naming `directive`.
    pub(crate) fn stream_mut(&mut self, directive: &str) -> Result<&mut Box<dyn ByteStream>> {
        match self.stream.as_mut() {
            Some(stream) if stream.is_open() => Ok(stream),
            _ => Err(anyhow!("{directive}: not connected (missing CONNECT?)")),
        }
    }
}

/// A single cmdscript directive.
///
/// Arguments are validated in [`parse`](ScriptCommand::parse) at dispatch
/// time, right before [`execute`](ScriptCommand::execute). To add a directive:
///
/// 1. Define `pub const NAME: &'static str` on your struct, the script keyword.
/// 2. Re-export the struct from `src/commands/mod.rs`.
/// 3. Add a variant to [`crate::parser::DirectiveKind`] and map it to
///    `MyCmd::parse_boxed` in `DirectiveKind::parse_fn`.
#[async_trait(?Send)]
pub trait ScriptCommand: 'static {
    /// The directive keyword, accessible at runtime through a trait object.
    fn name(&self) -> &'static str;

    /// Validate the argument tokens that followed the keyword.
    fn parse(args: &[String]) -> Result<Self>
    where
        Self: Sized;

    /// Parse and box this command; the function-pointer type used for dispatch.
    fn parse_boxed(args: &[String]) -> Result<Box<dyn ScriptCommand>>
    where
        Self: Sized,
    {
        Ok(Box::new(Self::parse(args)?))
    }

    async fn execute(&self, session: &mut Session) -> Result<()>;
}

/// Fail unless at least `min` argument tokens were given.
pub(crate) fn require_args(name: &str, args: &[String], min: usize) -> Result<()> {
    if args.len() < min {
        bail!("{name} command without required arguments");
    }
    Ok(())
}

/// Why an argument failed [`parse_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntError {
    /// Not digits with an optional sign.
    NotAnInteger,
    /// Digits, but too large for an `i64`.
    OutOfRange,
}

/// Parse an integer made of ASCII digits with an optional leading sign.
///
/// Anything else (empty, whitespace, decimals, hex) is rejected.
pub fn parse_int(s: &str) -> Result<i64, IntError> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IntError::NotAnInteger);
    }
    s.parse().map_err(|_| IntError::OutOfRange)
}

/// Parse a non-negative integer argument for `name`, describing it as `what`.
pub(crate) fn parse_count(name: &str, what: &str, arg: &str) -> Result<u64> {
    match parse_int(arg) {
        Ok(value) if value >= 0 => Ok(value as u64),
        Ok(_) => Err(anyhow!("{name} {what} must not be negative, got '{arg}'")),
        Err(IntError::OutOfRange) => Err(anyhow!("{name} {what} out of range, got '{arg}'")),
        Err(IntError::NotAnInteger) => Err(anyhow!(
            "{name} command without correct {what} (integer), got '{arg}'"
        )),
    }
}
