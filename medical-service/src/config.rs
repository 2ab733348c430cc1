use serde::Deserialize;
use shared::database::DatabaseConfig;
use shared::observability::LoggingSettings;
use shared::settings::{self, ServerSettings, SettingsError, SettingsResult};
use shared::store::SearchIndexDefinition;

pub const SERVICE_NAME: &str = "medical-service";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub bucket: String,
    #[serde(default)]
    pub logging: LoggingSettings,
    pub search: SearchSettings,
}

/// Full-text index used by the patient condition search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    pub index: String,
    pub doc_type: String,
    #[serde(default = "default_search_fields")]
    pub fields: Vec<String>,
}

fn default_search_fields() -> Vec<String> {
    vec!["notes.message".to_string()]
}

impl SearchSettings {
    pub fn index_definition(&self) -> SearchIndexDefinition {
        SearchIndexDefinition {
            name: self.index.clone(),
            doc_type: Some(self.doc_type.clone()),
            fields: self.fields.clone(),
        }
    }
}

impl Config {
    pub fn load() -> SettingsResult<Self> {
        let config: Config = settings::load(
            SERVICE_NAME,
            &[
                ("server.host", "0.0.0.0"),
                ("server.port", "3000"),
                ("bucket", "default"),
                ("search.index", "medical-condition"),
                ("search.doc_type", "patient"),
            ],
            &["search.fields"],
        )?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SettingsResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(SettingsError::Invalid("bucket must not be empty".to_string()));
        }
        if self.search.index.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "search.index must not be empty".to_string(),
            ));
        }
        if self.search.fields.iter().all(|field| field.trim().is_empty()) {
            return Err(SettingsError::Invalid(
                "search.fields must name at least one field".to_string(),
            ));
        }
        Ok(())
    }
}
