//! Mock peer implementation for testing and development.
//!
//! This module provides an in-memory capture peer that can be driven
//! programmatically without the SDK or any hardware.

pub mod peer;

pub use peer::{MockCall, MockDevice, MockOp, MockPeer, MockPeerHandle};
