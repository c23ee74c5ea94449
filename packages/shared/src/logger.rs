//! Logging setup for the chat relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the server library crate, this crate, and the binary.
/// It can be overridden with the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kotatsu_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kotatsu_shared::logger::setup_logger;
///
/// setup_logger("kotatsu_server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let binary_target = binary_name.replace('-', "_");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(&binary_target, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(binary_target: &str, level: &str) -> String {
    format!(
        "kotatsu_server={level},{shared}={level},{binary_target}={level},tower_http={level}",
        shared = env!("CARGO_PKG_NAME").replace('-', "_"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_lists_every_target() {
        // テスト項目: デフォルトのフィルタに全ターゲットが含まれる
        // given (前提条件):
        let binary_target = "kotatsu_server";

        // when (操作):
        let filter = default_filter(binary_target, "debug");

        // then (期待する結果):
        assert!(filter.contains("kotatsu_server=debug"));
        assert!(filter.contains("kotatsu_shared=debug"));
        assert!(filter.contains("tower_http=debug"));
    }
}
