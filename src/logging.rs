//! Logging setup (§4.11), grounded on the teacher's direct use of the `log`
//! facade (`log::warn!`/`log::error!` called straight from engine code, no
//! context object threaded through) plus `env_logger` as the binary's
//! installed backend.
//!
//! Every subsystem logs through `log`'s global macros; this module's only
//! job is installing the backend once, at the CLI entry point. Library code
//! (including tests) must never call [`init`] itself.

use std::io::Write;

/// Installs `env_logger` as the global logger, honoring `RUST_LOG` if set
/// and otherwise defaulting to `info`. Safe to call more than once; the
/// second and later calls are no-ops (`env_logger::Builder::try_init`
/// returns `Err` if a logger is already installed, which this silently
/// ignores rather than panicking, since that only happens in test binaries
/// linking against each other).
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
        })
        .try_init();
}
