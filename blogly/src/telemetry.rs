use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

fn filter_from(env: Option<&str>) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global `fmt` subscriber. `RUST_LOG` wins over [`DEFAULT_FILTER`].
pub fn init() {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = fmt()
        .with_env_filter(filter_from(env.as_deref()))
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info() {
        assert_eq!(filter_from(None).to_string(), DEFAULT_FILTER);
        assert_eq!(filter_from(Some("warn")).to_string(), "warn");
    }
}
