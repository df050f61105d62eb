//! Hardware integration tests.
//!
//! These need a real VDP and are ignored by default. Run with:
//! `VDP_TEST_DEVICE=/dev/ttyACM0 cargo test --features hardware-tests -- --ignored`

#![cfg(feature = "hardware-tests")]

#[path = "hardware/mod.rs"]
mod hardware;

pub use hardware::*;
