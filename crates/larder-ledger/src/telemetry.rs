//! # Logging Setup
//!
//! Installs the global `tracing` subscriber.
//!
//! ## Filter Resolution
//! ```text
//! RUST_LOG set?            ──yes──► use it
//!      │ no
//!      ▼
//! [logging] filter valid?  ──yes──► use it
//!      │ no
//!      ▼
//! DEFAULT_FILTER  "info,larder=debug,sqlx=warn"
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Debug for our crates, quiet sqlx statement logging.
pub const DEFAULT_FILTER: &str = "info,larder=debug,sqlx=warn";

/// Installs a fmt subscriber. Returns false if one was already installed.
pub fn init_tracing(settings: &LogSettings) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(settings.filter.as_deref()))
        .with_target(true)
        .try_init()
        .is_ok()
}

fn build_filter(configured: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    configured
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let settings = LogSettings {
            filter: Some("warn".into()),
        };
        init_tracing(&settings);
        assert!(!init_tracing(&settings));
    }
}
