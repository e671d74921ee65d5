//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// slipstream::core::logging::init();
/// log::info!("Flight server started");
/// ```
pub fn init() {
    // Tolerates repeated calls (tests, embedding hosts)
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
