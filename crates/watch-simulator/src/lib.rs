//! Desktop host for watch applications.
//!
//! Implements every firmware service behind the SDK's function table and
//! drives an application's callbacks the way the watch does, rendering the
//! e-ink panel into an `embedded-graphics-simulator` display.

pub mod clock;
pub mod config;
pub mod dialog;
pub mod files;
pub mod framebuffer;
pub mod host;
pub mod runner;

pub use config::SimConfig;
pub use runner::{SimError, Simulator};
