//! `log` backend that writes to the firmware log.
//!
//! Call [`init`] once from `WatchApp::init`; afterwards `log::info!` and
//! friends anywhere in the application end up in the firmware log through
//! the host `log` service.

use core::fmt::{self, Write};

use heapless::Vec;
use log::{LevelFilter, Log, Metadata, Record};

use crate::system;

/// Bytes per forwarded line, including the NUL terminator.
pub const LINE_CAP: usize = 128;

/// Line buffer that silently drops whatever does not fit.
///
/// Text is cut on a character boundary and one byte is always kept free for
/// the terminator.
struct LineBuf {
    bytes: Vec<u8, LINE_CAP>,
}

impl LineBuf {
    const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// NUL-terminate and return the raw line.
    fn finish(&mut self) -> *mut u8 {
        // Capacity for this byte is reserved by `write_str`.
        let _ = self.bytes.push(0);
        self.bytes.as_mut_ptr()
    }
}

impl Write for LineBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_CAP - 1 - self.bytes.len();
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        // Cannot fail: `take` fits the remaining room.
        let _ = self.bytes.extend_from_slice(&s.as_bytes()[..take]);
        Ok(())
    }
}

/// Forwards records to the host log service.
pub struct WatchLogger {
    level: LevelFilter,
}

impl WatchLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for WatchLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line = LineBuf::new();
        let _ = write!(line, "{} {}: {}", record.level(), record.target(), record.args());
        // SAFETY: `finish` NUL-terminates the buffer, which outlives the call.
        unsafe { system::log(line.finish().cast()) };
    }

    fn flush(&self) {}
}

static LOGGER: WatchLogger = WatchLogger::new(LevelFilter::Trace);

/// Install the firmware logger with `level` as the maximum level.
///
/// Later calls only adjust the level.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
