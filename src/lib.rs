//! Application SDK for the e-ink smart watch.
//!
//! A watch application is a position-dependent blob that the firmware loads
//! and drives through three callbacks (draw, update, key). It is never linked
//! against the firmware: instead the firmware hands it a table of function
//! addresses at load time and every host service is reached through that
//! table by a fixed ordinal.
//!
//! This crate provides:
//!
//! - the type catalog shared with the firmware ([`types`]),
//! - the function table and its ordinals ([`table`]),
//! - the startup routine that prepares the data segments ([`startup`]),
//! - one typed wrapper per host service ([`display`], [`fs`], [`rtc`],
//!   [`system`], [`dialog`], [`mem`]),
//! - the application entry glue ([`entry`], [`watch_app!`]),
//! - a safe convenience layer on top: an `embedded-graphics` draw target,
//!   a `log` backend, a global allocator, and `postcard` settings files.
//!
//! It is `#![no_std]` so it builds for the watch and for desktop hosts (the
//! simulator and tests).

#![no_std]

#[macro_use]
mod macros;

pub mod dialog;
pub mod display;
pub mod entry;
pub mod error;
pub mod fs;
pub mod heap;
pub mod logger;
pub mod mem;
pub mod panic;
pub mod path;
pub mod rtc;
pub mod settings;
pub mod startup;
pub mod system;
pub mod table;
pub mod types;

pub use entry::{AppCell, WatchApp};
pub use error::*;
pub use table::{FuncTable, Tag};
pub use types::*;
