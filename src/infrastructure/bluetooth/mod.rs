//! Bluetooth Module
//!
//! Provides BLE communication with LEGO hubs, WeDo 2.0 and fischertechnik
//! controllers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │  (Main coordinator - public API for the application)     │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │  Scanner  │  │  Session   │  │ Protocol │
//! │           │  │            │  │          │
//! │ - Identity│  │ - Ports    │  │ - UUIDs  │
//! │   filters │  │ - Queue    │  │ - Encode │
//! │           │  │            │  │ - Decode │
//! └─────┬─────┘  └─────┬──────┘  └──────────┘
//!       │              │
//!       ▼              ▼
//! ┌─────────────────────────────┐
//! │ BleTransport (WinRT, tests) │
//! └─────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Per-family codecs, characteristic tables and frame layouts
//! - [`queue`] - One-write-in-flight output queue
//! - [`scanner`] - Discovery and identity filtering
//! - [`session`] - Connected device state machine
//! - [`transport`] - BLE backend abstraction and its events
//! - [`service`] - Main service coordinator

pub mod error;
pub mod protocol;
pub mod queue;
pub mod scanner;
pub mod service;
pub mod session;
pub mod transport;
#[cfg(windows)]
pub mod winrt;

// Re-export main service for convenience
pub use service::{BluetoothService, HubHandle, StartMode};
