//! [`ExpectResponse`] directive: blocks until a response appears on the stream.
//!
//! Script syntax: `RES <token> [<token> ...]`
//!
//! The wait is bounded by the session's response timeout, set with
//! `CFGRESTIMEOUT` (1 s by default).

use crate::command::{ScriptCommand, Session, require_args};
use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::{debug, info};

/// Reads from the open stream until `pattern` is received or the response
/// timeout elapses.
///
/// Received text is consumed up to and including the match, so a following
/// `RES` will not match the same occurrence again.
pub struct ExpectResponse {
    pub pattern: String,
}

impl ExpectResponse {
    pub const NAME: &'static str = "RES";

    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for ExpectResponse {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        Ok(Self::new(args.join(" ")))
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        let timeout = session.response_timeout();
        let received = session
            .stream_mut(Self::NAME)?
            .read_until(&self.pattern, timeout)
            .await?;
        if received.is_empty() {
            bail!(
                "RES Fail to receive expected response within {}ms: {}",
                timeout.as_millis(),
                self.pattern
            );
        }
        debug!(received = %received.escape_default(), "RES raw response");
        info!("RES Received expected response: {}", self.pattern);
        Ok(())
    }
}
