//! Subscriber installation
//!
//! Logs always go to stderr so that diff and plan output on stdout stays
//! machine-readable. `RUST_LOG` overrides the per-profile default filter.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// How log events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable lines at debug level
    Development,
    /// One JSON object per event at info level
    Production,
    /// Bare registry; tests install their own capture layer
    Test,
}

impl Profile {
    /// Map a CLI `--log-format` value onto a profile
    ///
    /// `json` selects [`Profile::Production`]; anything else is
    /// [`Profile::Development`].
    pub fn from_format(format: &str) -> Self {
        match format {
            "json" => Profile::Production,
            _ => Profile::Development,
        }
    }

    fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "gcdelta_core=debug",
            Profile::Production | Profile::Test => "gcdelta_core=info",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call has any effect. A subscriber installed elsewhere
/// beforehand (for example by [`init_test_capture`]) is left in place.
///
/// [`init_test_capture`]: super::test_capture::init_test_capture
///
/// ```
/// use gcdelta_core::logging_facility::{init, Profile};
///
/// init(Profile::from_format("pretty"));
/// ```
pub fn init(profile: Profile) {
    INIT.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_env_filter(profile.filter())
                .try_init()
                .is_ok(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .try_init()
                .is_ok(),
            Profile::Test => tracing_subscriber::registry().try_init().is_ok(),
        };
        if !installed {
            tracing::debug!(?profile, "global subscriber already set");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(Profile::Test);
        init(Profile::Development);
        init(Profile::Test);
    }

    #[test]
    fn test_profile_from_format_name() {
        assert_eq!(Profile::from_format("json"), Profile::Production);
        assert_eq!(Profile::from_format("pretty"), Profile::Development);
        assert_eq!(Profile::from_format("anything"), Profile::Development);
    }

    #[test]
    fn test_development_is_more_verbose() {
        assert_eq!(Profile::Development.default_directive(), "gcdelta_core=debug");
        assert_eq!(Profile::Production.default_directive(), "gcdelta_core=info");
    }
}
