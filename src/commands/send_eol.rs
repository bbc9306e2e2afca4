//! [`SendEol`] directive: writes the end-of-line sequence on its own.
//!
//! Script syntax: `EOL`

use crate::command::{ScriptCommand, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

pub struct SendEol;

impl SendEol {
    pub const NAME: &'static str = "EOL";
}

#[async_trait(?Send)]
impl ScriptCommand for SendEol {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(_args: &[String]) -> Result<Self> {
        Ok(Self)
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        let eol = session.eol();
        session
            .stream_mut(Self::NAME)?
            .write(eol.as_bytes())
            .await
            .context("EOL Fail to send End Of Line")?;
        info!("EOL Send End Of Line ({eol})");
        Ok(())
    }
}
