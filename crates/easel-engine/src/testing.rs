//! Test-only helpers.
//!
//! `capture_logs` installs a process-wide logger once and collects the records
//! emitted on the calling thread, so parallel tests do not see each other.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static RECORDS: RefCell<Option<Vec<(Level, String)>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.with(|r| {
            if let Some(records) = r.borrow_mut().as_mut() {
                records.push((record.level(), record.args().to_string()));
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns its result with the log records it produced.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    RECORDS.with(|r| *r.borrow_mut() = Some(Vec::new()));
    let out = f();
    let records = RECORDS.with(|r| r.borrow_mut().take()).unwrap_or_default();
    (out, records)
}

pub(crate) fn error_count(records: &[(Level, String)]) -> usize {
    records.iter().filter(|(level, _)| *level == Level::Error).count()
}
