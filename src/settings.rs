use log::{LevelFilter, debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

use crate::backend::StoreLimit;
use crate::render::PixelFormat;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagefit";

pub const DEFAULT_TEXTURE_SIZE: u32 = 1024;

/// How many pages a viewer shows at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageLayout {
    /// One page fitted to the whole texture
    #[default]
    Single,
    /// Two facing pages side by side
    Spread,
}

impl PageLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageLayout::Single => "single",
            PageLayout::Spread => "spread",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_texture_size")]
    pub texture_width: u32,

    #[serde(default = "default_texture_size")]
    pub texture_height: u32,

    #[serde(default)]
    pub layout: PageLayout,

    #[serde(default)]
    pub pixel_format: PixelFormat,

    /// Zero the texture before every render
    #[serde(default)]
    pub clear_backdrop: bool,

    /// Decoded pages kept per session, 0 for no limit
    #[serde(default)]
    pub cache_pages: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_texture_size() -> u32 {
    DEFAULT_TEXTURE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            texture_width: DEFAULT_TEXTURE_SIZE,
            texture_height: DEFAULT_TEXTURE_SIZE,
            layout: PageLayout::default(),
            pixel_format: PixelFormat::default(),
            clear_backdrop: false,
            cache_pages: 0,
            log_level: default_log_level(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config directory, writing defaults there if the
/// file does not exist yet
pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Replace the global settings with the contents of `path`.
///
/// Unreadable or malformed files are logged and leave the current settings
/// in place. Older versions are migrated and written back.
pub fn load_settings_from(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v0 files predate the texture size keys; serde defaults cover them

    settings.version = CURRENT_VERSION;
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Size of the BGRA texture pages are rendered into\n");
    content.push_str(&format!("texture_width: {}\n", settings.texture_width));
    content.push_str(&format!("texture_height: {}\n", settings.texture_height));
    content.push('\n');
    content.push_str("# single | spread\n");
    content.push_str(&format!("layout: {}\n", settings.layout.as_str()));
    content.push_str("# bgra | rgb\n");
    content.push_str(&format!(
        "pixel_format: {}\n",
        settings.pixel_format.as_str()
    ));
    content.push_str("# Zero the texture before each render instead of leaving stale pixels\n");
    content.push_str(&format!("clear_backdrop: {}\n", settings.clear_backdrop));
    content.push('\n');
    content.push_str("# Decoded pages kept in memory per document (0 = no limit)\n");
    content.push_str(&format!("cache_pages: {}\n", settings.cache_pages));
    content.push_str("# off | error | warn | info | debug | trace\n");
    content.push_str(&format!("log_level: {}\n", settings.log_level));

    content
}

// Public API for accessing settings

/// Snapshot of the current settings
pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Replace the in-memory settings without touching the config file
pub fn replace(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

pub fn get_texture_size() -> (u32, u32) {
    SETTINGS
        .read()
        .map(|s| (s.texture_width, s.texture_height))
        .unwrap_or((DEFAULT_TEXTURE_SIZE, DEFAULT_TEXTURE_SIZE))
}

pub fn get_layout() -> PageLayout {
    SETTINGS.read().map(|s| s.layout).unwrap_or_default()
}

pub fn get_pixel_format() -> PixelFormat {
    SETTINGS.read().map(|s| s.pixel_format).unwrap_or_default()
}

pub fn is_clear_backdrop() -> bool {
    SETTINGS.read().map(|s| s.clear_backdrop).unwrap_or(false)
}

pub fn get_store_limit() -> StoreLimit {
    SETTINGS
        .read()
        .map(|s| StoreLimit::from_pages(s.cache_pages))
        .unwrap_or_default()
}

/// Configured log level; unknown names fall back to `Info`
pub fn get_log_level() -> LevelFilter {
    SETTINGS
        .read()
        .ok()
        .and_then(|s| LevelFilter::from_str(&s.log_level).ok())
        .unwrap_or(LevelFilter::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            texture_width: 2048,
            layout: PageLayout::Spread,
            pixel_format: PixelFormat::Rgb,
            clear_backdrop: true,
            cache_pages: 8,
            log_level: "debug".to_string(),
            ..Settings::default()
        };
        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let parsed: Settings = serde_yaml::from_str("layout: spread\n").unwrap();
        assert_eq!(parsed.layout, PageLayout::Spread);
        assert_eq!(parsed.texture_width, DEFAULT_TEXTURE_SIZE);
        assert_eq!(parsed.pixel_format, PixelFormat::Bgra);
        assert_eq!(parsed.version, CURRENT_VERSION);
    }

    #[test]
    fn migration_bumps_version() {
        let mut settings = Settings {
            version: 0,
            ..Settings::default()
        };
        migrate_settings(&mut settings);
        assert_eq!(settings.version, CURRENT_VERSION);
    }
}
