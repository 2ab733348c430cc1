use serde::Deserialize;
use shared::database::DatabaseConfig;
use shared::observability::LoggingSettings;
use shared::settings::{self, ServerSettings, SettingsError, SettingsResult};

pub const SERVICE_NAME: &str = "person-service";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub bucket: String,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    pub fn load() -> SettingsResult<Self> {
        let config: Config = settings::load(
            SERVICE_NAME,
            &[
                ("server.host", "0.0.0.0"),
                ("server.port", "8080"),
                ("bucket", "default"),
            ],
            &[],
        )?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SettingsResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(SettingsError::Invalid("bucket must not be empty".to_string()));
        }
        if self.database.username.is_empty() {
            return Err(SettingsError::Invalid(
                "database.username must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
