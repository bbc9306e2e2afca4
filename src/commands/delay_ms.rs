//! [`DelayMs`] directive: pauses execution for milliseconds.
//!
//! Script syntax: `DELAYMS <milliseconds>`

use crate::command::{ScriptCommand, Session, parse_count, require_args};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

pub struct DelayMs {
    pub duration: Duration,
}

impl DelayMs {
    pub const NAME: &'static str = "DELAYMS";
}

#[async_trait(?Send)]
impl ScriptCommand for DelayMs {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        let millis = parse_count(Self::NAME, "time value", &args[0])?;
        Ok(Self {
            duration: Duration::from_millis(millis),
        })
    }

    async fn execute(&self, _session: &mut Session) -> Result<()> {
        info!("DELAYMS Waiting for {}ms...", self.duration.as_millis());
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}
