//! Serial access to a board's console.
//!
//! Provides the `ConsolePort` trait with a real implementation backed by the
//! `serialport` crate and a scripted mock for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::MockConsole;
pub use sync_port::SerialConsole;
pub use traits::*;
