//! Diagnostic logging setup.
//!
//! The library only emits `tracing` events. Binaries decide where they go; the `joblock`
//! CLI calls [`init`] to print them on stderr, filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "joblock=debug,info" } else { "warn" }
}

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or joblock's debug output
/// when `verbose` is set.
///
/// # Example
///
/// ```rust,no_run
/// # fn main() -> anyhow::Result<()> {
/// joblock::observability::init(false)?;
/// tracing::warn!("visible on stderr");
/// # Ok(())
/// # }
/// ```
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        for verbose in [false, true] {
            let directive = default_directive(verbose);
            assert!(directive.parse::<EnvFilter>().is_ok(), "{}", directive);
        }
    }

    #[test]
    fn verbose_raises_joblock_level() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).contains("joblock=debug"));
    }
}
