// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber and describes the metric set.
///
/// `RUST_LOG` wins when set. Otherwise every `suitebridge*` target logs at
/// `log_level` and everything else at `warn`.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    // An embedding application may already own the global subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();

    suitebridge_core::traits::register_metrics();
}

// Target directives match by prefix, so this covers every workspace crate.
fn default_directives(log_level: &str) -> String {
    format!("suitebridge={log_level},warn")
}
