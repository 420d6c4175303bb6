//! Logging utilities and the fatal-error path

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring a logger that is already installed
///
/// Tests and binaries that may initialise more than once use this variant.
pub fn try_init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}

/// Terminate on an unrecoverable condition
///
/// Logs the diagnostic at `error`, flushes the logger and panics. Used for
/// resource exhaustion and broken engine invariants; configuration errors
/// are returned as `Result` instead.
#[track_caller]
pub fn fatal(message: impl std::fmt::Display) -> ! {
    let message = message.to_string();
    log::error!("fatal: {message}");
    log::logger().flush();
    panic!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "engine invariant broken")]
    fn test_fatal_panics_with_message() {
        try_init();
        fatal("engine invariant broken");
    }
}
