use defmt::Display2Format;

/// Forwards records of the `log` facade to defmt.
struct DefmtLogger;

impl log::Log for DefmtLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let msg = Display2Format(record.args());
        match record.level() {
            log::Level::Error => defmt::error!("{}", msg),
            log::Level::Warn => defmt::warn!("{}", msg),
            log::Level::Info => defmt::info!("{}", msg),
            log::Level::Debug => defmt::debug!("{}", msg),
            log::Level::Trace => defmt::trace!("{}", msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: DefmtLogger = DefmtLogger;

pub(crate) fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}
