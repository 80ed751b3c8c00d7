use pitr_core::constants::{PITR_LOG_VAR, PITR_OP};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Default filter when neither `PITR_LOG` nor `RUST_LOG` is set
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing system
///
/// The filter is read from `PITR_LOG`, then `RUST_LOG`, falling back to
/// `info`. Events go to stderr in the compact format. Calling this twice
/// returns an error rather than replacing the installed subscriber.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Build the filter from the environment
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(PITR_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Span covering one replica set's archiving worker
pub fn pitr_span(replset: &str) -> Span {
    span!(Level::INFO, "pitr", op = PITR_OP, rs = %replset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        // another test binary thread may have installed one already
        let _ = init();
        assert!(init().is_err());
    }

    #[test]
    fn test_span_metadata() {
        let span = pitr_span("rs0");
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "pitr");
            assert!(meta.fields().field("rs").is_some());
        }
    }
}
