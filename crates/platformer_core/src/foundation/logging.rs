//! Logging support
//!
//! The library only emits through the `log` facade. Binaries call [`init`]
//! once at startup; `RUST_LOG` controls filtering.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system, defaulting to `info` when `RUST_LOG` is unset
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

/// Initialize logging for tests; safe to call more than once
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_for_tests_is_repeatable() {
        init_for_tests();
        init_for_tests();
        info!("Logger initialized twice without panicking");
    }
}
