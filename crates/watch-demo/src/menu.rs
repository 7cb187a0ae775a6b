//! Menu, dialogs and network callbacks.
//!
//! The host calls these back from its own event loop after a dialog closes
//! or a request completes, never while another face callback runs, so each
//! one can take the face out of [`APP`].

use core::ffi::{CStr, c_char};

use log::{info, warn};
use watch_sdk::dialog::{self, MenuItem};
use watch_sdk::{display, system};

use crate::APP;
use crate::face::{SyncState, WatchFace};
use crate::prefs::{INTERVALS, Prefs};

/// Weather endpoint queried by "Sync weather".
pub const WEATHER_URL: &CStr = c"http://api.example.com/weather?days=3";

static ITEMS: [MenuItem; 4] = [
    MenuItem::new(c"Rotate"),
    MenuItem::new(c"Refresh interval"),
    MenuItem::new(c"Sync weather"),
    MenuItem::new(c"Reset settings"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Rotate,
    Interval,
    Sync,
    Reset,
}

impl Choice {
    fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Rotate),
            1 => Some(Self::Interval),
            2 => Some(Self::Sync),
            3 => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Run `f` on the face if the app is up.
fn with_face(f: impl FnOnce(&mut WatchFace)) {
    // SAFETY: host callbacks never overlap.
    if unsafe { APP.with(f) }.is_none() {
        warn!("callback before app_init");
    }
}

/// Show the main menu.
pub fn open() {
    dialog::show_menu(c"Watch face", &ITEMS, on_menu);
}

/// Ask before closing the face.
pub fn confirm_exit() {
    dialog::show_message(c"Exit", c"Close the watch face?", on_exit);
}

/// Turn the canvas a quarter clockwise and remember it.
pub fn rotate(face: &mut WatchFace) {
    face.prefs.rotate = face.prefs.rotate.next();
    display::set_rotate(face.prefs.rotate);
    face.prefs.save();
    face.mark_dirty();
}

fn start_sync(face: &mut WatchFace) {
    if face.sync == SyncState::Pending {
        info!("weather sync already running");
        return;
    }
    face.sync = SyncState::Pending;
    face.mark_dirty();
    // SAFETY: static NUL-terminated URL.
    unsafe { system::http_request(WEATHER_URL.as_ptr(), on_weather) };
}

extern "C" fn on_menu(idx: u8) {
    let Some(choice) = Choice::from_index(idx) else {
        warn!("menu returned unknown entry {}", idx);
        return;
    };
    info!("menu: {:?}", choice);

    match choice {
        Choice::Rotate => with_face(rotate),
        Choice::Interval => with_face(|face| {
            dialog::show_picker(face.prefs.interval_secs, &INTERVALS, on_interval);
        }),
        Choice::Sync => with_face(start_sync),
        Choice::Reset => {
            dialog::show_message(c"Reset", c"Restore default settings?", on_reset)
        }
    }
}

extern "C" fn on_interval(secs: u8) {
    if !INTERVALS.contains(&secs) {
        warn!("picker returned unsupported interval {}", secs);
        return;
    }
    with_face(|face| {
        face.prefs.interval_secs = secs;
        system::set_update_interval(face.prefs.interval_ms());
        face.prefs.save();
        face.mark_dirty();
    });
}

extern "C" fn on_reset(ok: u8) {
    if ok == 0 {
        return;
    }
    with_face(|face| {
        face.prefs = Prefs::reset();
        face.apply_prefs();
        face.mark_dirty();
    });
}

extern "C" fn on_exit(ok: u8) {
    if ok != 0 {
        info!("leaving watch face");
        with_face(|face| face.prefs.save());
        system::exit();
    }
}

extern "C" fn on_weather(body: *mut c_char) {
    let len = if body.is_null() {
        0
    } else {
        // SAFETY: the host passes a NUL-terminated response body.
        unsafe { CStr::from_ptr(body) }.count_bytes()
    };
    info!("weather response: {} bytes", len);
    with_face(|face| {
        face.sync = SyncState::Done(len);
        face.mark_dirty();
    });
}
