pub mod client;
pub mod error;
pub mod mock;
pub mod runner;
pub mod status;

pub use client::TicClient;
pub use error::{InvocationError, TicError};
pub use mock::MockTic;
pub use runner::{CommandRunner, ProcessRunner};
pub use status::{ParseError, Status, parse_bool, parse_status};
