pub mod catalog;
pub mod commands;
pub mod events;
pub mod models;
pub mod ports;
pub mod settings;
