//! Parser for the cmdscript language.
//!
//! The top-level entry points are [`parse_str`] and [`parse_file`]. Parsing
//! only filters lines; argument validation happens when each directive is
//! dispatched.

use crate::command::ScriptCommand;
use crate::commands::{
    CfgEol, CfgResTimeout, Connect, Delay, DelayMs, Disconnect, ExpectResponse, SendCommand,
    SendEol,
};
use anyhow::{Context as _, Result, anyhow};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// The fixed directive vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Connect,
    Disconnect,
    CfgEol,
    CfgResTimeout,
    Delay,
    DelayMs,
    Eol,
    Cmd,
    Res,
}

pub(crate) type ParseFn = fn(&[String]) -> Result<Box<dyn ScriptCommand>>;

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 9] = [
        DirectiveKind::Connect,
        DirectiveKind::Disconnect,
        DirectiveKind::CfgEol,
        DirectiveKind::CfgResTimeout,
        DirectiveKind::Delay,
        DirectiveKind::DelayMs,
        DirectiveKind::Eol,
        DirectiveKind::Cmd,
        DirectiveKind::Res,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Connect => Connect::NAME,
            DirectiveKind::Disconnect => Disconnect::NAME,
            DirectiveKind::CfgEol => CfgEol::NAME,
            DirectiveKind::CfgResTimeout => CfgResTimeout::NAME,
            DirectiveKind::Delay => Delay::NAME,
            DirectiveKind::DelayMs => DelayMs::NAME,
            DirectiveKind::Eol => SendEol::NAME,
            DirectiveKind::Cmd => SendCommand::NAME,
            DirectiveKind::Res => ExpectResponse::NAME,
        }
    }

    /// The argument parser that builds this directive's handler.
    pub(crate) fn parse_fn(self) -> ParseFn {
        match self {
            DirectiveKind::Connect => Connect::parse_boxed,
            DirectiveKind::Disconnect => Disconnect::parse_boxed,
            DirectiveKind::CfgEol => CfgEol::parse_boxed,
            DirectiveKind::CfgResTimeout => CfgResTimeout::parse_boxed,
            DirectiveKind::Delay => Delay::parse_boxed,
            DirectiveKind::DelayMs => DelayMs::parse_boxed,
            DirectiveKind::Eol => SendEol::parse_boxed,
            DirectiveKind::Cmd => SendCommand::parse_boxed,
            DirectiveKind::Res => ExpectResponse::parse_boxed,
        }
    }
}

impl FromStr for DirectiveKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        DirectiveKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown directive: {s}"))
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted script line, kept as raw text until dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source text.
    pub number: usize,
    pub text: String,
}

impl ScriptLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Split into the leading keyword and the remaining whitespace-separated
    /// argument tokens.
    pub fn split(&self) -> (&str, Vec<String>) {
        let mut tokens = self.text.split_whitespace();
        let keyword = tokens.next().unwrap_or("");
        (keyword, tokens.map(str::to_string).collect())
    }
}

/// Parse a cmdscript from a string slice and return the accepted lines in order.
///
/// `\r\n` line endings are normalized first. Empty lines and lines starting
/// with `#` are dropped silently; lines whose first token is not a known
/// directive are dropped with a warning. Parsing never fails.
///
/// # Example
///
/// ```
/// use sercmd::parse_str;
///
/// let lines = parse_str("# setup\r\nCFGEOL LF\r\nPING\r\nCMD status\r\n");
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[1].text, "CMD status");
/// ```
pub fn parse_str(content: &str) -> Vec<ScriptLine> {
    let normalized = content.replace("\r\n", "\n");
    let mut lines = Vec::new();
    for (idx, line) in normalized.split('\n').enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let keyword = line.split_whitespace().next().unwrap_or("");
        if keyword.parse::<DirectiveKind>().is_err() {
            warn!("Ignoring unknown command found in cmdscript: {line}");
            continue;
        }
        lines.push(ScriptLine::new(idx + 1, line));
    }
    debug!(accepted = lines.len(), "cmdscript parsed");
    lines
}

/// Read a cmdscript from a file and parse it with [`parse_str`].
///
/// # Errors
///
/// Returns an error only if the file cannot be read.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<ScriptLine>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script file: {}", path.display()))?;
    Ok(parse_str(&content))
}
