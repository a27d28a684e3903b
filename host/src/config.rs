use serde::Deserialize;

/// Largest argument copied into guest memory unless configured otherwise.
pub const DEFAULT_MAX_INPUT_LEN: usize = 64 * 1024;

/// Settings for loading and calling a guest module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fuel granted to each call. `None` disables metering.
    pub fuel: Option<u64>,
    /// Arguments longer than this are rejected before reaching the guest.
    pub max_input_len: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fuel: None,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

impl HostConfig {
    pub(crate) fn engine(&self) -> wasmi::Engine {
        let mut config = wasmi::Config::default();
        config.consume_fuel(self.fuel.is_some());
        wasmi::Engine::new(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_fuel() {
        let config = HostConfig::default();
        assert_eq!(config.fuel, None);
        assert_eq!(config.max_input_len, DEFAULT_MAX_INPUT_LEN);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: HostConfig = serde_json::from_str(r#"{"fuel": 10000}"#).unwrap();
        assert_eq!(config.fuel, Some(10_000));
        assert_eq!(config.max_input_len, DEFAULT_MAX_INPUT_LEN);
    }

    #[test]
    fn test_deserialize_empty_object_is_default() {
        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HostConfig::default());
    }
}
