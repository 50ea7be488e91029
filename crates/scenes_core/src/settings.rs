use std::{fs, path::Path};

use serde::Deserialize;
use storage::DEFAULT_NAMESPACE;
use tracing::warn;

use crate::{
    observer::DEFAULT_EVENT_CAPACITY,
    script::Script,
    template::DEFAULT_ITEM_TEMPLATE,
};

pub const SETTINGS_FILE: &str = "scenes.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub namespace: String,
    pub script: Script,
    pub item_template: String,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/scenes.db".into(),
            namespace: DEFAULT_NAMESPACE.into(),
            script: Script::default(),
            item_template: DEFAULT_ITEM_TEMPLATE.into(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE))
}

/// Defaults, then the TOML file at `path` if present, then environment overrides.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<Settings>(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed settings file");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SCENES_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("SCENES_NAMESPACE") {
        settings.namespace = v;
    }
    if let Some(v) = lookup("APP__NAMESPACE") {
        settings.namespace = v;
    }

    if let Some(v) = lookup("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
