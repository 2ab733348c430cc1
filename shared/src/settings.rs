//! Externally loaded service properties.
//!
//! Sources, later ones winning: built-in defaults, an optional properties
//! file (`config/<service>.toml` unless `<SERVICE>_CONFIG` names another
//! path), then `WORKSHOP_*` environment variables with `__` separating
//! nested keys, e.g. `WORKSHOP_DATABASE__HOST` or `WORKSHOP_BUCKET`.

use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "WORKSHOP";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Name of the environment variable that overrides the properties file path.
pub fn config_path_var(service_name: &str) -> String {
    format!("{}_CONFIG", service_name.to_uppercase().replace('-', "_"))
}

/// Load settings for `service_name` on top of `defaults`.
///
/// `list_keys` are parsed from comma-separated environment values.
pub fn load<T: DeserializeOwned>(
    service_name: &str,
    defaults: &[(&str, &str)],
    list_keys: &[&str],
) -> SettingsResult<T> {
    let path = std::env::var(config_path_var(service_name))
        .unwrap_or_else(|_| format!("config/{}", service_name));

    let mut environment = ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);
    if !list_keys.is_empty() {
        environment = environment.list_separator(",");
        for key in list_keys {
            environment = environment.with_list_parse_key(key);
        }
    }

    let mut builder = ::config::Config::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }

    let settings = builder
        .add_source(::config::File::with_name(&path).required(false))
        .add_source(environment)
        .build()?;

    Ok(settings.try_deserialize()?)
}
