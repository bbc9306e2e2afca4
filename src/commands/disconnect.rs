//! [`Disconnect`] directive: closes the open byte stream.
//!
//! Script syntax: `DISCONNECT <port>`

use crate::command::{ScriptCommand, Session, require_args};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Closes the current stream. Succeeds even when nothing is connected.
///
/// Only one stream exists per session, so `port` is used for logging only.
pub struct Disconnect {
    pub port: String,
}

impl Disconnect {
    pub const NAME: &'static str = "DISCONNECT";
}

#[async_trait(?Send)]
impl ScriptCommand for Disconnect {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        Ok(Self {
            port: args[0].clone(),
        })
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        if !session.disconnect() {
            debug!(port = %self.port, "DISCONNECT with no open port");
        }
        info!("DISCONNECT Serial port {} close.", self.port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeConnector;

    #[test]
    fn test_parse_requires_port() {
        assert!(Disconnect::parse(&[]).is_err());
        assert_eq!(
            Disconnect::parse(&["COM3".to_string()]).unwrap().port,
            "COM3"
        );
    }

    #[tokio::test]
    async fn test_closes_open_stream() {
        let connector = FakeConnector::new();
        let handle = connector.handle();
        let mut session = Session::new(connector);
        session.connect("COM3", 9600).unwrap();

        let cmd = Disconnect {
            port: "COM3".into(),
        };
        cmd.execute(&mut session).await.unwrap();
        assert!(!session.is_connected());
        assert!(!handle.is_open());
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_without_connection_succeeds() {
        let mut session = Session::new(FakeConnector::new());
        let cmd = Disconnect {
            port: "COM3".into(),
        };
        assert!(cmd.execute(&mut session).await.is_ok());
    }
}
