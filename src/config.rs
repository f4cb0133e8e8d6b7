//! Container options.
//!
//! Options are shared by a whole container tree: children created through
//! [`Container::new_child_container`](crate::Container::new_child_container)
//! see (and change) the same values as their root.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Behaviour switches read on every unregistered resolution and every
/// multi-constructor decision.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::ContainerOptions;
///
/// let options = ContainerOptions::default()
///     .with_resolve_should_bubble_up(false)
///     .with_prefer_greediest_constructor(false);
///
/// assert!(options.try_resolve_unregistered);
/// assert!(!options.resolve_should_bubble_up);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Auto-register types that were never registered when they are resolved.
    pub try_resolve_unregistered: bool,
    /// Let children delegate lookups they can't satisfy to their parent.
    pub resolve_should_bubble_up: bool,
    /// Pick the constructor with the most parameters (otherwise the fewest).
    pub prefer_greediest_constructor: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            try_resolve_unregistered: true,
            resolve_should_bubble_up: true,
            prefer_greediest_constructor: true,
        }
    }
}

impl ContainerOptions {
    pub fn with_try_resolve_unregistered(mut self, enabled: bool) -> Self {
        self.try_resolve_unregistered = enabled;
        self
    }

    pub fn with_resolve_should_bubble_up(mut self, enabled: bool) -> Self {
        self.resolve_should_bubble_up = enabled;
        self
    }

    pub fn with_prefer_greediest_constructor(mut self, enabled: bool) -> Self {
        self.prefer_greediest_constructor = enabled;
        self
    }

    /// Defaults overridden by `FERROUS_IOC_*` environment variables.
    ///
    /// Recognised variables are `FERROUS_IOC_TRY_RESOLVE_UNREGISTERED`,
    /// `FERROUS_IOC_RESOLVE_SHOULD_BUBBLE_UP` and
    /// `FERROUS_IOC_PREFER_GREEDIEST_CONSTRUCTOR`; values are `true`/`false`
    /// (also `1`/`0`, `yes`/`no`, `on`/`off`).
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix("FERROUS_IOC")
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let mut options = Self::default();
        let fields: [(&str, &mut bool); 3] = [
            ("TRY_RESOLVE_UNREGISTERED", &mut options.try_resolve_unregistered),
            ("RESOLVE_SHOULD_BUBBLE_UP", &mut options.resolve_should_bubble_up),
            ("PREFER_GREEDIEST_CONSTRUCTOR", &mut options.prefer_greediest_constructor),
        ];
        for (name, slot) in fields {
            let var = format!("{}_{}", prefix.to_uppercase(), name);
            if let Ok(value) = env::var(&var) {
                *slot = parse_flag(&var, &value)?;
            }
        }
        Ok(options)
    }

    /// Parses options from JSON. Missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }

    /// Serializes options to JSON.
    #[cfg(feature = "config")]
    pub fn to_json_string(&self) -> DiResult<String> {
        serde_json::to_string(self).map_err(|e| DiError::Config(e.to_string()))
    }
}

fn parse_flag(var: &str, value: &str) -> DiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DiError::Config(format!("{} must be a boolean, got '{}'", var, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_enabled() {
        let options = ContainerOptions::default();
        assert!(options.try_resolve_unregistered);
        assert!(options.resolve_should_bubble_up);
        assert!(options.prefer_greediest_constructor);
    }

    #[test]
    fn env_overrides_with_prefix() {
        env::set_var("IOC_UNIT_TEST_RESOLVE_SHOULD_BUBBLE_UP", "off");
        env::set_var("IOC_UNIT_TEST_PREFER_GREEDIEST_CONSTRUCTOR", "0");
        let options = ContainerOptions::from_env_with_prefix("ioc_unit_test").unwrap();
        assert!(options.try_resolve_unregistered);
        assert!(!options.resolve_should_bubble_up);
        assert!(!options.prefer_greediest_constructor);

        env::set_var("IOC_UNIT_TEST_TRY_RESOLVE_UNREGISTERED", "maybe");
        let err = ContainerOptions::from_env_with_prefix("ioc_unit_test").unwrap_err();
        assert!(matches!(err, DiError::Config(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_keeps_defaults_for_missing_fields() {
        let options = ContainerOptions::from_json_str(r#"{ "try_resolve_unregistered": false }"#).unwrap();
        assert!(!options.try_resolve_unregistered);
        assert!(options.resolve_should_bubble_up);

        let round = ContainerOptions::from_json_str(&options.to_json_string().unwrap()).unwrap();
        assert_eq!(round, options);
        assert!(ContainerOptions::from_json_str("[1, 2]").is_err());
    }
}
