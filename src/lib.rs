//! Monitoring and control of BLE toy controllers: LEGO Boost / Powered Up
//! hubs, LEGO WeDo 2.0 and fischertechnik BT Smart Controller / Control
//! Receiver.

pub mod domain;
pub mod infrastructure;
