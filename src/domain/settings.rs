use crate::domain::models::{
    known_identities, ControllerIdentity, HubDialect, QueuePolicy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "toy_hub_controller".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Output pipeline
    #[serde(default)]
    pub queue_policy: QueuePolicy,
    #[serde(default)]
    pub hub_dialect: HubDialect,

    // Discovery: controllers recognized on top of the built-in table
    #[serde(default)]
    pub extra_identities: Vec<ControllerIdentity>,

    // Session behavior
    #[serde(default = "default_true")]
    pub send_init_sequence: bool,
    #[serde(default = "default_false")]
    pub request_port_info: bool,
    #[serde(default = "default_true")]
    pub auto_enable_sensors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            queue_policy: QueuePolicy::default(),
            hub_dialect: HubDialect::default(),
            extra_identities: Vec::new(),
            send_init_sequence: default_true(),
            request_port_info: default_false(),
            auto_enable_sensors: default_true(),
        }
    }
}

impl Settings {
    /// Built-in identities followed by the configured extras
    pub fn identity_filters(&self) -> Vec<ControllerIdentity> {
        let mut filters = known_identities();
        filters.extend(self.extra_identities.iter().cloned());
        filters
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::load_from(settings_path))
    }

    /// Falls back to defaults when the file is missing or unreadable
    pub fn load_from(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(
                    "Using default settings ({}): {}",
                    settings_path.display(),
                    e
                );
                Settings::default()
            }
        };

        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("ToyHubController");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ControllerFamily;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "queue_policy": "coalesce" }"#).unwrap();
        assert_eq!(settings.queue_policy, QueuePolicy::Coalesce);
        assert_eq!(settings.hub_dialect, HubDialect::PoweredUp);
        assert!(settings.send_init_sequence);
        assert!(!settings.request_port_info);
        assert_eq!(settings.log_settings.file_name_prefix, "toy_hub_controller");
    }

    #[test]
    fn test_extra_identities_extend_builtin_table() {
        let mut settings = Settings::default();
        let builtin = settings.identity_filters().len();
        settings.extra_identities.push(ControllerIdentity::new(
            [0x00, 0x81, 0xf9],
            "Technic Hub",
            ControllerFamily::LegoHub,
        ));
        let filters = settings.identity_filters();
        assert_eq!(filters.len(), builtin + 1);
        assert_eq!(filters.last().map(|i| i.name.as_str()), Some("Technic Hub"));
    }

    #[test]
    fn test_save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut service = SettingsService::load_from(path.clone());
        service.get_mut().hub_dialect = HubDialect::Classic;
        service.get_mut().log_settings.level = "debug".to_string();
        service.save().unwrap();

        let reloaded = SettingsService::load_from(path);
        assert_eq!(reloaded.get().hub_dialect, HubDialect::Classic);
        assert_eq!(reloaded.get().log_settings.level, "debug");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let service = SettingsService::load_from(path);
        assert_eq!(service.get().queue_policy, QueuePolicy::Fifo);
    }
}
