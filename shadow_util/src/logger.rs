use env_logger::{Builder, Env};

/// Intercept messages using the `log` crate and print them to STDERR, defaulting to `info` unless
/// `RUST_LOG` says otherwise. Safe to call more than once; only the first call takes effect.
pub fn setup() {
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
