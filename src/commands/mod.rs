mod cfg_eol;
mod cfg_res_timeout;
mod connect;
mod delay;
mod delay_ms;
mod disconnect;
mod expect_response;
mod send_command;
mod send_eol;

pub use cfg_eol::CfgEol;
pub use cfg_res_timeout::CfgResTimeout;
pub use connect::{COMMON_BAUD_RATES, Connect};
pub use delay::Delay;
pub use delay_ms::DelayMs;
pub use disconnect::Disconnect;
pub use expect_response::ExpectResponse;
pub use send_command::SendCommand;
pub use send_eol::SendEol;
