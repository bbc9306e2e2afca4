//! [`Connect`] directive: opens the byte stream the rest of the script uses.
//!
//! Script syntax: `CONNECT <port> <baudrate>`

use crate::command::{IntError, ScriptCommand, Session, parse_int, require_args};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tracing::{info, warn};

/// Baud rates most serial devices support. Others are allowed but flagged.
pub const COMMON_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400, 460800, 500000, 576000, 921600,
];

/// Opens `port` at `baud_rate` using the session's current response timeout.
///
/// A stream left open by an earlier `CONNECT` is closed first.
pub struct Connect {
    pub port: String,
    pub baud_rate: u32,
}

impl Connect {
    pub const NAME: &'static str = "CONNECT";
}

#[async_trait(?Send)]
impl ScriptCommand for Connect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 2)?;
        let baud_rate = match parse_int(&args[1]) {
            Ok(value) => u32::try_from(value)
                .map_err(|_| anyhow!("CONNECT baudrate out of range: '{}'", args[1]))?,
            Err(IntError::OutOfRange) => bail!("CONNECT baudrate out of range: '{}'", args[1]),
            Err(IntError::NotAnInteger) => {
                bail!("CONNECT command without valid baudrate: '{}'", args[1])
            }
        };
        Ok(Self {
            port: args[0].clone(),
            baud_rate,
        })
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        if !COMMON_BAUD_RATES.contains(&self.baud_rate) {
            warn!(
                "CONNECT {} bauds is not a common serial baud rate",
                self.baud_rate
            );
        }
        info!(
            "CONNECT Opening Serial port {} at {} bauds...",
            self.port, self.baud_rate
        );
        session
            .connect(&self.port, self.baud_rate)
            .context("CONNECT Can't open Serial port")?;
        info!("CONNECT Serial port open.");
        Ok(())
    }
}
