//! Diagnostics go to stderr through `tracing`; stdout carries only the report.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Configured directives first, then `RUST_LOG`, then [`DEFAULT_DIRECTIVE`].
pub fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(directives: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(directives))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_directives_win() {
        let f = filter(Some("ulpbench=debug"));
        assert!(f.to_string().contains("ulpbench=debug"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(Some("off"));
        init(Some("off"));
    }
}
