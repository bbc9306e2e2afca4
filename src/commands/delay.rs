//! [`Delay`] directive: pauses execution for whole seconds.
//!
//! Script syntax: `DELAY <seconds>`

use crate::command::{ScriptCommand, Session, parse_count, require_args};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Pauses the run for a fixed number of seconds before the next directive.
pub struct Delay {
    pub duration: Duration,
}

impl Delay {
    pub const NAME: &'static str = "DELAY";
}

#[async_trait(?Send)]
impl ScriptCommand for Delay {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        let secs = parse_count(Self::NAME, "time value", &args[0])?;
        Ok(Self {
            duration: Duration::from_secs(secs),
        })
    }

    async fn execute(&self, _session: &mut Session) -> Result<()> {
        info!("DELAY Waiting for {}s...", self.duration.as_secs());
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(arg: &str) -> Result<Delay> {
        Delay::parse(&[arg.to_string()])
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse("2").unwrap().duration, Duration::from_secs(2));
        assert_eq!(parse("+1").unwrap().duration, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("notanumber").is_err());
        assert!(parse("1.5").is_err());
        assert!(parse("-1").is_err());
        assert!(Delay::parse(&[]).is_err());
    }
}
