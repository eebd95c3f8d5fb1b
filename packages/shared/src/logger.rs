//! Logging setup utilities for the Kairo binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose logs are enabled at the default level.
const WORKSPACE_CRATES: [&str; 4] = ["kairo_shared", "kairo_server", "kairo_client", "tower_http"];

/// Build the default filter directives for `binary_name` at `default_log_level`.
fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_target.as_str()))
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logging is enabled for the workspace crates and the binary itself.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "kairo-server", "kairo-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kairo_shared::logger::setup_logger;
///
/// setup_logger("kairo-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_and_binary() {
        // テスト項目: ワークスペースのクレートとバイナリ両方にレベルが設定される
        // given (前提条件):
        let binary_name = "kairo-server";

        // when (操作):
        let directives = default_directives(binary_name, "debug");

        // then (期待する結果):
        assert!(directives.contains("kairo_server=debug"));
        assert!(directives.contains("kairo_shared=debug"));
        assert!(directives.contains("tower_http=debug"));
        assert!(!directives.contains('-'));
    }
}
