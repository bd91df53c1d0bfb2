//! Session configuration.

use std::str::FromStr;
use std::time::Duration;

// ─── Config ───────────────────────────────────────────────────────────────

/// Tunables for a tree session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// How long a blocking store call may hold the UI before the failsafe
    /// releases it and warns. Default: **10 s**.
    pub failsafe: Duration,

    /// Clamp drop coordinates into [0, 100]. Applies to new placements and
    /// moves alike. Default: **true**.
    pub clamp_drops: bool,

    /// Origin used to build share links. Default: `http://localhost:8000`.
    pub origin: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            failsafe: Duration::from_secs(10),
            clamp_drops: true,
            origin: "http://localhost:8000".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `TINSEL_FAILSAFE_SECS` | `10`                    |
    /// | `TINSEL_CLAMP_DROPS`   | `true`                  |
    /// | `TINSEL_ORIGIN`        | `http://localhost:8000` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let failsafe_secs = parse_or(
            &lookup,
            "TINSEL_FAILSAFE_SECS",
            defaults.failsafe.as_secs(),
        );
        Self {
            failsafe: Duration::from_secs(failsafe_secs),
            clamp_drops: parse_or(&lookup, "TINSEL_CLAMP_DROPS", defaults.clamp_drops),
            origin: lookup("TINSEL_ORIGIN")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.origin),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("{key}={raw:?} is not valid, using the default");
            default
        }),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = SessionConfig::from_lookup(|_| None);
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn reads_every_key() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("TINSEL_FAILSAFE_SECS", "3"),
            ("TINSEL_CLAMP_DROPS", "false"),
            ("TINSEL_ORIGIN", "https://tinsel.example"),
        ]));
        assert_eq!(config.failsafe, Duration::from_secs(3));
        assert!(!config.clamp_drops);
        assert_eq!(config.origin, "https://tinsel.example");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("TINSEL_FAILSAFE_SECS", "soon"),
            ("TINSEL_CLAMP_DROPS", "maybe"),
            ("TINSEL_ORIGIN", "   "),
        ]));
        assert_eq!(config, SessionConfig::default());
    }
}
