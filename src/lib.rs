//! sensorframe firmware library.
//!
//! Channel scheduling, reduction, touch classification and the serial frame
//! codec build and test on the host.  Hardware adapters are guarded by
//! `#[cfg(target_os = "espidf")]` inside `drivers` and `tasks`.

#![deny(unused_must_use)]

pub mod channel;
pub mod clock;
pub mod command;
pub mod config;
pub mod debounce;
pub mod drivers;
pub mod events;
pub mod frame;
pub mod reduce;
pub mod source;
pub mod tasks;
pub mod touch;
pub mod window;
