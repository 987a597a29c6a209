//! Environment lookups behind a swappable reader.
//!
//! Config layering and credential fallbacks read variables through
//! [`Env`]. The process-backed reader is [`Env::real()`]; tests build a
//! fixed map with [`Env::mock()`] instead of touching `std::env`.

use std::collections::HashMap;

/// Reader for environment variables.
#[derive(Clone, Debug, Default)]
pub struct Env {
    fixed: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the real process environment.
    pub fn real() -> Self {
        Self { fixed: None }
    }

    /// Read only from the given pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            fixed: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up a variable. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<String> {
        let value = match &self.fixed {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Returns `true` if the variable holds a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_given_values() {
        let env = Env::mock([("A", "1"), ("B", "two")]);
        assert_eq!(env.get("A").as_deref(), Some("1"));
        assert_eq!(env.get("B").as_deref(), Some("two"));
        assert_eq!(env.get("C"), None);
    }

    #[test]
    fn empty_values_are_unset() {
        let env = Env::mock([("BLANK", "  ")]);
        assert!(!env.is_set("BLANK"));
    }

    #[test]
    fn real_env_sees_cargo_vars() {
        assert!(Env::real().is_set("CARGO_MANIFEST_DIR"));
    }
}
