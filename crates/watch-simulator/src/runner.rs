//! Drives an application the way the firmware does.
//!
//! Boots it through its `app_init`, then delivers update ticks and key
//! presses one at a time, redrawing according to the `UpdateType` each
//! callback returns. Dialog and network callbacks run between those calls,
//! never inside them.

use std::ffi::c_int;
use std::mem::transmute;
use std::sync::OnceLock;

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use log::{debug, info};
use thiserror_no_std::Error;
use watch_sdk::{ButtonType, FuncTable, Rotate, UpdateType};

use crate::dialog::KeyOutcome;
use crate::host::{self, HostState};

/// Signature of an application's `app_init`.
pub type AppInit = unsafe extern "C" fn(*mut isize, *mut isize, *mut isize, *const isize);

type DrawFn = extern "C" fn();
type EventFn = extern "C" fn(c_int) -> UpdateType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("app_init did not publish its {0} callback")]
    MissingCallback(&'static str),
}

pub struct Simulator {
    draw: DrawFn,
    on_key: EventFn,
    on_update: EventFn,
}

impl Simulator {
    /// Install `state` as the firmware and start the application.
    pub fn boot(state: HostState, init: AppInit) -> Result<Self, SimError> {
        host::install(state);
        static TABLE: OnceLock<FuncTable> = OnceLock::new();
        let table = TABLE.get_or_init(host::build_table);

        let (mut draw, mut key, mut update) = (0isize, 0isize, 0isize);
        // SAFETY: out-parameters are writable and the table is complete and
        // lives for the rest of the process.
        unsafe { init(&mut draw, &mut key, &mut update, table.as_ptr()) };

        for (addr, name) in [(draw, "draw"), (key, "key"), (update, "update")] {
            if addr == 0 {
                return Err(SimError::MissingCallback(name));
            }
        }

        // SAFETY: non-null addresses published by `app_init` with these
        // signatures.
        let mut sim = unsafe {
            Self {
                draw: transmute::<isize, DrawFn>(draw),
                on_key: transmute::<isize, EventFn>(key),
                on_update: transmute::<isize, EventFn>(update),
            }
        };
        info!("application started, update interval {} ms", sim.interval_ms());
        sim.render(UpdateType::Full);
        Ok(sim)
    }

    /// Redraw after a callback reported `update`.
    fn render(&mut self, update: UpdateType) {
        if update == UpdateType::None {
            return;
        }
        (self.draw)();
        host::with(|s| {
            if let Some(dialog) = &s.dialog {
                dialog.render(&mut s.fb);
            }
            if update == UpdateType::Full {
                s.fb.invalidate();
            }
        });
    }

    /// Advance the clock by `delta_ms` and deliver an update tick.
    pub fn tick(&mut self, delta_ms: u32) -> UpdateType {
        host::with(|s| s.clock.advance_ms(delta_ms.into()));
        let update = (self.on_update)(delta_ms.min(i32::MAX as u32) as c_int);
        self.render(update);
        self.pump();
        update
    }

    /// Press `key`. An open dialog takes the key before the application.
    pub fn press(&mut self, key: ButtonType) {
        debug!("key {:?}", key);
        let outcome = host::with(|s| s.dialog.as_mut().map(|d| d.on_key(key))).flatten();

        match outcome {
            Some(KeyOutcome::Moved) => self.render(UpdateType::Part),
            Some(KeyOutcome::Answer(submit, value)) => {
                host::with(|s| s.dialog = None);
                submit(value);
                self.render(UpdateType::Full);
            }
            Some(KeyOutcome::Dismissed) => {
                host::with(|s| s.dialog = None);
                self.render(UpdateType::Full);
            }
            Some(KeyOutcome::Ignored) => {}
            None => {
                let update = (self.on_key)(key as c_int);
                if self.dialog_open() && update == UpdateType::None {
                    self.render(UpdateType::Part);
                } else {
                    self.render(update);
                }
            }
        }
        self.pump();
    }

    /// Deliver queued network responses.
    pub fn pump(&mut self) {
        while let Some(reply) = host::with(|s| s.http.pop_front()).flatten() {
            let mut body = reply.body.into_bytes_with_nul();
            (reply.callback)(body.as_mut_ptr().cast());
        }
    }

    pub fn dialog_open(&self) -> bool {
        host::with(|s| s.dialog.is_some()).unwrap_or(false)
    }

    pub fn exit_requested(&self) -> bool {
        host::with(|s| s.exit_requested).unwrap_or(true)
    }

    pub fn interval_ms(&self) -> u32 {
        host::with(|s| s.interval_ms).unwrap_or(host::DEFAULT_INTERVAL_MS)
    }

    pub fn rotation(&self) -> Rotate {
        host::with(|s| s.fb.rotate()).unwrap_or_default()
    }

    /// Push pending panel changes to `display`.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Gray8>,
    {
        host::with(|s| s.fb.flush(display)).unwrap_or(Ok(()))
    }
}
