use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// `QR_DEBUG` is set in the environment
pub fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| std::env::var("QR_DEBUG").is_ok())
}

/// Log filter for the CLI: `QR_DEBUG` forces debug, otherwise each `-v` raises the level
pub fn log_filter(verbosity: u8) -> log::LevelFilter {
    if debug_enabled() {
        return log::LevelFilter::Debug;
    }
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        if debug_enabled() {
            assert_eq!(log_filter(0), log::LevelFilter::Debug);
            return;
        }
        assert_eq!(log_filter(0), log::LevelFilter::Warn);
        assert_eq!(log_filter(1), log::LevelFilter::Info);
        assert_eq!(log_filter(5), log::LevelFilter::Trace);
    }
}
