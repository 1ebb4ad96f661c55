//! Бэкенд для `log` / Backend for the `log` facade
//!
//! Пишет через signal-safe stderr, поэтому `log::trace!` из резолвера
//! безопасен внутри обработчика fault'а.
//! Writes through the signal-safe stderr, so `log::trace!` from the
//! resolver is safe inside the fault handler.

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::sprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// 0 → info, 1 → debug, 2+ → trace
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Установить логгер. Повторный вызов только меняет уровень.
/// Install the logger. A repeated call only changes the level.
pub fn init(level: LevelFilter) {
    log::set_logger(&LOGGER).ok();
    log::set_max_level(level);
}
