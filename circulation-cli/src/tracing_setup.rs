//! Tracing setup for the circulation driver
//!
//! The driver and `circulation_core` log at info (debug with `--debug`);
//! everything else, the MongoDB driver included, is held at warn.
//!
//!   circulation --debug                           # driver + store at debug
//!   RUST_LOG=mongodb=debug,circulation=info circulation  # replaces the defaults

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "warn,circulation=info,circulation_core=info";
const DEBUG_DIRECTIVES: &str = "warn,circulation=debug,circulation_core=debug";

#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Raise the driver and store crates to debug
    pub debug: bool,
}

/// Filter directives used when `RUST_LOG` is unset
fn default_directives(debug: bool) -> &'static str {
    if debug {
        DEBUG_DIRECTIVES
    } else {
        DEFAULT_DIRECTIVES
    }
}

/// Initialize console tracing; `RUST_LOG` wins over the built-in directives
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(config.debug)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scope_verbosity_to_this_binary() {
        assert_eq!(
            default_directives(false),
            "warn,circulation=info,circulation_core=info"
        );
        assert!(default_directives(true).contains("circulation_core=debug"));
        assert!(default_directives(true).starts_with("warn,"));
    }

    #[test]
    fn default_directives_parse() {
        for debug in [false, true] {
            EnvFilter::try_new(default_directives(debug)).unwrap();
        }
    }
}
