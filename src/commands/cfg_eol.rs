//! [`CfgEol`] directive: selects the end-of-line sequence.
//!
//! Script syntax: `CFGEOL CR|LF|CRLF`

use crate::command::{Eol, ScriptCommand, Session, require_args};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

pub struct CfgEol {
    pub eol: Eol,
}

impl CfgEol {
    pub const NAME: &'static str = "CFGEOL";
}

#[async_trait(?Send)]
impl ScriptCommand for CfgEol {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        let eol = args[0]
            .parse()
            .context("CFGEOL command without correct EOL value")?;
        Ok(Self { eol })
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        session.eol = self.eol;
        info!("CFGEOL End Of Line set to {}", self.eol);
        Ok(())
    }
}
