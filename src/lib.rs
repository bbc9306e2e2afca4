//! # sercmd
//!
//! A cmdscript interpreter for automating line-oriented command interfaces
//! exposed over a serial port.
//!
//! A cmdscript is a plain text file with one directive per line. Scripts open
//! a port, configure the line ending and response timeout, send commands and
//! wait for expected responses. Execution is strictly sequential and stops at
//! the first directive that fails.
//!
//! ## Quick start
//!
//! ```no_run
//! use sercmd::{Engine, parse_str};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let script = "\
//! CONNECT /dev/ttyUSB0 115200
//! CFGEOL CRLF
//! CMD AT
//! RES OK
//! DISCONNECT /dev/ttyUSB0
//! ";
//!
//!     let lines = parse_str(script);
//!     let mut engine = Engine::serial();
//!     engine.execute(&lines).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Script syntax
//!
//! | Directive | Description |
//! |-----------|-------------|
//! | `CONNECT <port> <baud>` | Open a serial port |
//! | `DISCONNECT <port>` | Close the open port (no-op when none is open) |
//! | `CFGEOL CR\|LF\|CRLF` | Select the end-of-line sequence (default `CR`) |
//! | `CFGRESTIMEOUT <ms>` | Set the `RES` timeout (default 1000 ms) |
//! | `DELAY <s>` | Pause for whole seconds |
//! | `DELAYMS <ms>` | Pause for milliseconds |
//! | `EOL` | Send the end-of-line sequence alone |
//! | `CMD <text...>` | Send text followed by the end-of-line sequence |
//! | `RES <text...>` | Wait until the text is received |
//! | `# comment` | Full-line comment |
//!
//! Lines starting with an unknown keyword are dropped with a warning.
//!
//! ## Testing without hardware
//!
//! [`transport::FakeConnector`] records writes and answers with scripted
//! replies:
//!
//! ```
//! use sercmd::{Engine, parse_str, transport::FakeConnector};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let connector = FakeConnector::new().reply_to("ping\n", "pong\n");
//! let traffic = connector.handle();
//!
//! let mut engine = Engine::new(connector);
//! engine
//!     .execute(&parse_str("CONNECT COM3 9600\nCFGEOL LF\nCMD ping\nRES pong\n"))
//!     .await?;
//! assert_eq!(traffic.writes(), vec![b"ping\n".to_vec()]);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod commands;
pub mod engine;
pub mod parser;
pub mod transport;

pub use command::{Eol, ScriptCommand, Session};
pub use engine::Engine;
pub use parser::{DirectiveKind, ScriptLine, parse_file, parse_str};
