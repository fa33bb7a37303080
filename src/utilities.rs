//! Utilities.
use log::LevelFilter;

/// Configure the global logger with the given minimum level.
pub fn configure_logger(level: LevelFilter) {
    env_logger::builder()
        .filter_level(level)
        .format_timestamp_micros()
        .init();
}
