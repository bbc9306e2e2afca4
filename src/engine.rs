use crate::command::Session;
use crate::parser::{DirectiveKind, ScriptLine};
use crate::transport::{Connector, SerialConnector};
use anyhow::Result;
use tracing::{debug, error, info, warn};

/// Runs parsed cmdscripts against a [`Session`].
///
/// Directives execute strictly in order; the first failure halts the run.
/// Any stream still open is closed by [`shutdown`](Engine::shutdown), which
/// also runs when the engine is dropped.
pub struct Engine {
    session: Session,
}

impl Engine {
    /// Create an engine whose `CONNECT` opens streams through `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Engine {
            session: Session::new(connector),
        }
    }

    /// Create an engine that talks to real serial ports.
    pub fn serial() -> Self {
        Self::new(SerialConnector)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute a sequence of script lines, stopping at the first failure.
    pub async fn execute(&mut self, lines: &[ScriptLine]) -> Result<()> {
        for line in lines {
            if let Err(err) = self.execute_line(line).await {
                error!("line {}: {}: {err:#}", line.number, line.text);
                return Err(err.context(format!("line {}: {}", line.number, line.text)));
            }
        }
        info!(directives = lines.len(), "cmdscript completed");
        Ok(())
    }

    /// Validate and run a single line.
    async fn execute_line(&mut self, line: &ScriptLine) -> Result<()> {
        let (keyword, args) = line.split();
        let Ok(kind) = keyword.parse::<DirectiveKind>() else {
            warn!("Ignoring invalid cmdscript command: {}", line.text);
            return Ok(());
        };
        debug!(line = line.number, directive = %kind, "dispatch");
        let command = (kind.parse_fn())(&args)?;
        command.execute(&mut self.session).await
    }

    /// Close any open stream.
    pub fn shutdown(&mut self) {
        if self.session.disconnect() {
            info!("Serial port closed on exit");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Eol;
    use crate::parser::parse_str;
    use crate::transport::FakeConnector;

    #[tokio::test]
    async fn test_halts_on_first_failure() {
        let connector = FakeConnector::new();
        let handle = connector.handle();
        let mut engine = Engine::new(connector);

        let script = parse_str("CONNECT COM3 9600\nCMD one\nDELAY notanumber\nCMD two\n");
        let err = engine.execute(&script).await.unwrap_err();
        assert!(err.to_string().contains("line 3"), "got: {err}");
        assert_eq!(handle.writes(), vec![b"one\r".to_vec()]);
        // Earlier effects are not rolled back.
        assert!(engine.session().is_connected());
    }

    #[tokio::test]
    async fn test_skips_hand_built_unknown_lines() {
        let mut engine = Engine::new(FakeConnector::new());
        let script = vec![
            ScriptLine::new(1, "NOPE 1 2"),
            ScriptLine::new(2, ""),
            ScriptLine::new(3, "CFGEOL LF"),
        ];
        engine.execute(&script).await.unwrap();
        assert_eq!(engine.session().eol(), Eol::Lf);
    }

    #[tokio::test]
    async fn test_empty_script_succeeds() {
        let mut engine = Engine::new(FakeConnector::new());
        engine.execute(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_stream() {
        let connector = FakeConnector::new();
        let handle = connector.handle();
        let mut engine = Engine::new(connector);
        engine
            .execute(&parse_str("CONNECT COM3 9600\n"))
            .await
            .unwrap();
        assert!(handle.is_open());

        engine.shutdown();
        assert!(!handle.is_open());
        engine.shutdown();
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_closes_stream() {
        let connector = FakeConnector::new();
        let handle = connector.handle();
        {
            let mut engine = Engine::new(connector);
            engine
                .execute(&parse_str("CONNECT COM3 9600\n"))
                .await
                .unwrap();
        }
        assert!(!handle.is_open());
    }
}
