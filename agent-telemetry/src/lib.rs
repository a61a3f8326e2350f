//! Observability setup shared by toolbridge binaries.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support {
    //! Structured tracing helpers.

    use thiserror::Error;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Filter applied when `RUST_LOG` is unset.
    pub const DEFAULT_DIRECTIVES: &str = "toolbridge=info,agent_kernel=info,agent_tools=info";

    /// Failure to install the global subscriber.
    #[derive(Debug, Error)]
    #[error("failed to install tracing subscriber: {reason}")]
    pub struct TelemetryError {
        reason: String,
    }

    /// Builds the filter: `RUST_LOG` if set and valid, else `fallback`.
    #[must_use]
    pub fn env_filter(fallback: &str) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    }

    /// Installs a formatted subscriber on stderr, leaving stdout to the
    /// program's own output.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] if a global subscriber is already set.
    pub fn init(fallback: &str) -> Result<(), TelemetryError> {
        tracing_subscriber::registry()
            .with(env_filter(fallback))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|err| TelemetryError {
                reason: err.to_string(),
            })
    }

}
