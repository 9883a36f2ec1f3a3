//! Console logging setup.
//!
//! Library code only emits `tracing` events; binaries and hosts call
//! [`init_logging`] once to install a subscriber.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "SVGFX_LOG";

/// Installs a stderr `fmt` subscriber.
///
/// Filter priority: `filter` > `SVGFX_LOG` > `RUST_LOG` > [`default_log_filter`].
/// Returns false if a global subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

/// Builds the filter used by [`init_logging`].
pub fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Default filter for the build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "debug,svgfx_renderer=trace,reqwest=warn,hyper=warn,usvg=warn"
    }
    #[cfg(not(debug_assertions))]
    {
        "info,svgfx_renderer=info,reqwest=warn,hyper=warn,usvg=error"
    }
}
