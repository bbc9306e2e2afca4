//! [`SendCommand`] directive: writes a command line to the open stream.
//!
//! Script syntax: `CMD <token> [<token> ...]`

use crate::command::{ScriptCommand, Session, require_args};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Sends the argument tokens, joined by single spaces, followed by the
/// session's current end-of-line sequence in a single write.
pub struct SendCommand {
    pub text: String,
}

impl SendCommand {
    pub const NAME: &'static str = "CMD";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait(?Send)]
impl ScriptCommand for SendCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(args: &[String]) -> Result<Self> {
        require_args(Self::NAME, args, 1)?;
        Ok(Self::new(args.join(" ")))
    }

    async fn execute(&self, session: &mut Session) -> Result<()> {
        let mut data = self.text.clone().into_bytes();
        data.extend_from_slice(session.eol().as_bytes());
        session
            .stream_mut(Self::NAME)?
            .write(&data)
            .await
            .with_context(|| format!("CMD Fail to send command: {}", self.text))?;
        info!("CMD Send command: {}", self.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Eol;
    use crate::transport::FakeConnector;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_parse_joins_tokens() {
        let cmd = SendCommand::parse(&args(&["AT+CFUN=1", "now"])).unwrap();
        assert_eq!(cmd.text, "AT+CFUN=1 now");
    }

    #[test]
    fn test_parse_requires_argument() {
        assert!(SendCommand::parse(&[]).is_err());
    }

    #[tokio::test]
    async fn test_appends_current_eol() {
        let connector = FakeConnector::new();
        let handle = connector.handle();
        let mut session = Session::new(connector);
        session.connect("COM3", 9600).unwrap();
        session.eol = Eol::CrLf;

        SendCommand::new("reboot").execute(&mut session).await.unwrap();
        assert_eq!(handle.writes(), vec![b"reboot\r\n".to_vec()]);
    }

    #[tokio::test]
    async fn test_not_connected() {
        let mut session = Session::new(FakeConnector::new());
        let err = SendCommand::new("hello")
            .execute(&mut session)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("not connected"), "got: {err}");
    }
}
