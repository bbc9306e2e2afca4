//! [`CfgResTimeout`] directive: sets how long `RES` waits for a response.
//!
//! Script syntax: `CFGRESTIMEOUT <milliseconds>`

use crate::command::{ScriptCommand, Session, parse_count, require_args};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Sets the session response timeout and, when a stream is open, its live
/// timeout as well.
pub struct CfgResTimeout {
    pub timeout: Duration,
}

impl CfgResTimeout {
    pub const NAME: &'static str = "CFGRESTIMEOUT";
}

#[async_trait(?Send)]
impl ScriptCommand for CfgResTimeout {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        let millis = parse_count(Self::NAME, "time value", &args[0])?;
        Ok(Self {
            timeout: Duration::from_millis(millis),
        })
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        session.response_timeout = self.timeout;
        if let Some(stream) = session.stream.as_mut() {
            stream.set_timeout(self.timeout);
        }
        info!(
            "CFGRESTIMEOUT Response timeout set to {}ms",
            self.timeout.as_millis()
        );
        Ok(())
    }
}
