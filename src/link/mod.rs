//! Physical link management: opening the device and supervising its
//! one-time startup.

pub mod initializer;
pub mod supervisor;

pub use initializer::{open_port, open_port_with_retry, PortHandle, RetryPolicy, MAX_RETRY_COUNT};
pub use supervisor::{banner, write_version_stamp, LinkState, LinkSupervisor};
