use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;

static LOGGER: Logger = Logger;

/// Writes log records to standard error, one line each, tagged with a level marker.
pub struct Logger;

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut stderr = std::io::stderr().lock();
            // Nowhere left to report a failed write to stderr.
            let _ = writeln!(stderr, "{}", format_record(record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn marker(level: Level) -> char {
    match level {
        Level::Info => '*',
        Level::Warn => 'W',
        Level::Error => 'E',
        Level::Debug => 'D',
        Level::Trace => 'T',
    }
}

fn format_record(record: &Record) -> String {
    format!(
        "[{}] {}: {}",
        marker(record.level()),
        record.target(),
        record.args()
    )
}
