use env_logger::Env;

/// Install the `env_logger` backend, honouring `RUST_LOG` and defaulting to
/// `info`. Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Same as [`init`] but captured by the test harness
pub fn init_for_tests() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_for_tests();
        init();
        log::debug!("logger installed");
    }
}
