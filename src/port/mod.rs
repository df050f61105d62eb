//! UART abstraction layer.
//!
//! The bridge only needs raw send/receive/flush on an open device plus a way
//! to open one; both sit behind traits so tests run against mocks.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::{SyncSerialPort, SystemPortOpener};
pub use traits::*;
