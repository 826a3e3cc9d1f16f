pub mod bank;
pub mod config;
pub mod consts;
pub mod gate;
pub mod handler;
pub mod helpers;
pub mod homeassistant;
pub mod quirks;
pub mod store;
pub mod trigger;
pub mod zcl;
