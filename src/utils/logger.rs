use env_logger::Env;

/// Initialize logging for the whole application. `RUST_LOG` overrides the
/// default `info` level.
pub fn setup_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
