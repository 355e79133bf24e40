use profile_sync_models::ServiceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Movie catalog instances, keyed by instance name.
    #[serde(default)]
    pub movies: BTreeMap<String, InstanceConfig>,
    /// Series catalog instances, keyed by instance name.
    #[serde(default)]
    pub series: BTreeMap<String, InstanceConfig>,
    /// Request-intake instances, keyed by instance name.
    #[serde(default)]
    pub intake: BTreeMap<String, IntakeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub reconciler: ReconcilerSettings,
}

/// One catalog instance: connection plus the language/profile policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Marker tag applied to dub-preferred items.
    #[serde(default = "default_tag_name")]
    pub tag_name: String,
    /// Languages the audience understands; ISO codes, names, or raw
    /// numeric catalog ids all work.
    #[serde(default = "default_original_languages")]
    pub original_languages: Vec<String>,
    #[serde(default = "default_original_profile")]
    pub original_profile: String,
    #[serde(default = "default_dub_profile")]
    pub dub_profile: String,

    #[serde(flatten)]
    pub search: SearchSettings,

    /// Audio-tagging policy: canonical language name -> tag label.
    /// Empty map disables the audio pass for this instance.
    #[serde(default)]
    pub audio_tags: BTreeMap<String, String>,
}

/// Search-trigger throttling knobs, flattened into the instance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_true")]
    pub trigger_search_on_update: bool,
    #[serde(default = "default_search_cooldown")]
    pub search_cooldown_seconds: u64,
    #[serde(default = "default_min_search_interval")]
    pub min_search_interval_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            trigger_search_on_update: true,
            search_cooldown_seconds: default_search_cooldown(),
            min_search_interval_seconds: default_min_search_interval(),
        }
    }
}

/// One request-intake instance and its server-id routing tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
    /// Intake movie-server id -> catalog instance name under `[movies]`.
    /// TOML table keys are strings, so the ids are too.
    #[serde(default)]
    pub movie_servers: BTreeMap<String, String>,
    /// Intake series-server id -> catalog instance name under `[series]`.
    #[serde(default)]
    pub series_servers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            run_on_startup: true,
        }
    }
}

/// Reconciler behavior, passed explicitly into the engine rather than
/// read from the environment inside domain logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerSettings {
    #[serde(default)]
    pub dry_run: bool,
    /// Pause after each remote write, to go easy on the catalog API.
    #[serde(default = "default_update_delay_ms")]
    pub update_delay_ms: u64,
    /// Pause between a profile write and its follow-up search trigger.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            update_delay_ms: default_update_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tag_name() -> String {
    "prefer-dub".to_string()
}

fn default_original_languages() -> Vec<String> {
    vec!["en".to_string(), "de".to_string()]
}

fn default_original_profile() -> String {
    "Original Preferred".to_string()
}

fn default_dub_profile() -> String {
    "Dub Preferred".to_string()
}

fn default_search_cooldown() -> u64 {
    60
}

fn default_min_search_interval() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    10
}

fn default_webhook_port() -> u16 {
    5678
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_interval_hours() -> u64 {
    24
}

fn default_update_delay_ms() -> u64 {
    500
}

fn default_settle_delay_ms() -> u64 {
    1000
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay per-instance credentials from environment variables.
    ///
    /// The `main` instance accepts the short forms `MOVIES_URL` /
    /// `MOVIES_API_KEY` (likewise `SERIES_*`, `INTAKE_*`); every instance
    /// accepts `MOVIES_<NAME>_BASE_URL` / `MOVIES_<NAME>_API_KEY`.
    pub fn apply_env_overrides(&mut self) {
        for (name, instance) in self.movies.iter_mut() {
            apply_instance_env(env_prefix(ServiceKind::Movies), name, &mut instance.base_url, &mut instance.api_key);
        }
        for (name, instance) in self.series.iter_mut() {
            apply_instance_env(env_prefix(ServiceKind::Series), name, &mut instance.base_url, &mut instance.api_key);
        }
        for (name, intake) in self.intake.iter_mut() {
            apply_instance_env("INTAKE", name, &mut intake.base_url, &mut intake.api_key);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.enabled_instance_count() == 0 {
            return Err(anyhow::anyhow!(
                "Configuration must contain at least one enabled [movies.*] or [series.*] instance"
            ));
        }

        for (name, instance) in self.movies.iter().chain(self.series.iter()) {
            if !instance.enabled {
                continue;
            }
            if instance.base_url.is_empty() {
                return Err(anyhow::anyhow!("Instance '{}': base_url is required", name));
            }
            if instance.api_key.is_empty() {
                return Err(anyhow::anyhow!("Instance '{}': api_key is required", name));
            }
            if instance.original_languages.is_empty() {
                return Err(anyhow::anyhow!(
                    "Instance '{}': original_languages cannot be empty",
                    name
                ));
            }
        }

        for (name, intake) in &self.intake {
            if !intake.enabled {
                continue;
            }
            if intake.base_url.is_empty() || intake.api_key.is_empty() {
                return Err(anyhow::anyhow!(
                    "Intake '{}': base_url and api_key are required",
                    name
                ));
            }
            for target in intake.movie_servers.values() {
                if !self.movies.contains_key(target) {
                    return Err(anyhow::anyhow!(
                        "Intake '{}': movie server maps to unknown instance '{}'",
                        name,
                        target
                    ));
                }
            }
            for target in intake.series_servers.values() {
                if !self.series.contains_key(target) {
                    return Err(anyhow::anyhow!(
                        "Intake '{}': series server maps to unknown instance '{}'",
                        name,
                        target
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn enabled_instance_count(&self) -> usize {
        self.movies
            .values()
            .chain(self.series.values())
            .filter(|i| i.enabled)
            .count()
    }
}

fn env_prefix(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Movies => "MOVIES",
        ServiceKind::Series => "SERIES",
    }
}

fn apply_instance_env(prefix: &str, name: &str, base_url: &mut String, api_key: &mut String) {
    if name == "main" {
        if let Ok(value) = std::env::var(format!("{}_URL", prefix)) {
            info!("Using environment variable {}_URL for {}.{}", prefix, prefix.to_lowercase(), name);
            *base_url = value;
        }
        if let Ok(value) = std::env::var(format!("{}_API_KEY", prefix)) {
            info!("Using environment variable {}_API_KEY for {}.{}", prefix, prefix.to_lowercase(), name);
            *api_key = value;
        }
    }

    let instance_key = name.to_uppercase().replace('-', "_");
    if let Ok(value) = std::env::var(format!("{}_{}_BASE_URL", prefix, instance_key)) {
        *base_url = value;
    }
    if let Ok(value) = std::env::var(format!("{}_{}_API_KEY", prefix, instance_key)) {
        *api_key = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_instance() -> InstanceConfig {
        InstanceConfig {
            base_url: "http://localhost:7878".to_string(),
            api_key: "secret".to_string(),
            enabled: true,
            tag_name: default_tag_name(),
            original_languages: vec!["en".to_string(), "de".to_string()],
            original_profile: default_original_profile(),
            dub_profile: default_dub_profile(),
            search: SearchSettings::default(),
            audio_tags: BTreeMap::new(),
        }
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.movies.insert("main".to_string(), sample_instance());

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        let instance = loaded.movies.get("main").unwrap();
        assert_eq!(instance.base_url, "http://localhost:7878");
        assert_eq!(instance.tag_name, "prefer-dub");
        assert_eq!(instance.search.search_cooldown_seconds, 60);
        assert_eq!(loaded.schedule.interval_hours, 24);
    }

    #[test]
    fn test_defaults_fill_minimal_instance() {
        let toml = r#"
            [movies.main]
            base_url = "http://localhost:7878"
            api_key = "secret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let instance = config.movies.get("main").unwrap();
        assert!(instance.enabled);
        assert_eq!(instance.original_languages, vec!["en", "de"]);
        assert_eq!(instance.original_profile, "Original Preferred");
        assert_eq!(instance.dub_profile, "Dub Preferred");
        assert!(instance.search.trigger_search_on_update);
        assert_eq!(instance.search.min_search_interval_seconds, 5);
        assert_eq!(config.reconciler.update_delay_ms, 500);
        assert!(!config.reconciler.dry_run);
    }

    #[test]
    fn test_validate_requires_an_instance() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_api_key() {
        let mut config = Config::default();
        let mut instance = sample_instance();
        instance.api_key = String::new();
        config.movies.insert("main".to_string(), instance);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_intake_server_target() {
        let mut config = Config::default();
        config.movies.insert("main".to_string(), sample_instance());
        config.intake.insert(
            "main".to_string(),
            IntakeConfig {
                base_url: "http://localhost:5055".to_string(),
                api_key: "secret".to_string(),
                enabled: true,
                poll_interval_minutes: 10,
                movie_servers: [("0".to_string(), "nope".to_string())].into_iter().collect(),
                series_servers: BTreeMap::new(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audio_tags_parse() {
        let toml = r#"
            [series.tv]
            base_url = "http://localhost:8989"
            api_key = "secret"

            [series.tv.audio_tags]
            german = "audio-de"
            english = "audio-en"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let instance = config.series.get("tv").unwrap();
        assert_eq!(instance.audio_tags.get("german").unwrap(), "audio-de");
        assert_eq!(instance.audio_tags.len(), 2);
    }
}
