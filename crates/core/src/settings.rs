//! User settings and the per-domain selector map.
//!
//! Stored settings are merged over the defaults key by key, so a settings
//! file written by an older version (or by hand, with only one field in it)
//! still yields a complete [`Settings`]. Unknown enum strings degrade to a
//! safe variant instead of failing the load.
//!
//! Everything persists in a single `storage.json` with two top-level keys,
//! `settings` and `domainSelectors`.
//!
//! # Example
//!
//! ```rust
//! use mdyoink_core::settings::{OutputMode, Settings};
//! use serde_json::json;
//!
//! let stored = json!({"outputMode": "obsidian", "llm": {"stripLinks": false}});
//! let settings = Settings::from_stored(&stored).unwrap();
//!
//! assert_eq!(settings.output_mode, OutputMode::Obsidian);
//! assert!(!settings.llm.strip_links);
//! assert!(settings.llm.strip_images);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::formatters::markdown::MarkdownOptions;
use crate::{Result, YoinkError};

/// Domain → CSS selector.
pub type DomainSelectorMap = BTreeMap<String, String>;

/// Post-processing profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Llm,
    Obsidian,
    #[serde(other)]
    Raw,
}

impl OutputMode {
    /// Parses a mode name. Unrecognized names mean [`OutputMode::Raw`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "llm" => Self::Llm,
            "obsidian" => Self::Obsidian,
            _ => Self::Raw,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Obsidian => "obsidian",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When transcript lines carry `[m:ss]` timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampDisplay {
    Always,
    /// Only in obsidian mode.
    #[default]
    Obsidian,
    #[serde(other)]
    Never,
}

/// Transcript body layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptLayout {
    /// Timestamped in obsidian mode, paragraphs otherwise.
    #[default]
    Auto,
    Timestamped,
    #[serde(other)]
    Paragraphs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    pub strip_links: bool,
    pub strip_images: bool,
    pub strip_front_matter: bool,
    /// Prepended to the output; supports `{url}`, `{title}` and `{domain}`.
    /// Empty disables the line.
    pub source_line_format: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            strip_links: true,
            strip_images: true,
            strip_front_matter: true,
            source_line_format: "Source: {url}".to_string(),
        }
    }
}

pub const DEFAULT_FRONT_MATTER: &str = "---\ntitle: {title}\nurl: {url}\ndate: {date:YYYY-MM-DD}\n---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObsidianSettings {
    pub front_matter_template: String,
}

impl Default for ObsidianSettings {
    fn default() -> Self {
        Self { front_matter_template: DEFAULT_FRONT_MATTER.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenCounterSettings {
    pub model: String,
    pub show: bool,
}

impl Default for TokenCounterSettings {
    fn default() -> Self {
        Self { model: "Claude 200k".to_string(), show: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadSettings {
    pub filename_template: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self { filename_template: "{title}".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YoutubeSettings {
    pub timestamps: TimestampDisplay,
    pub format: TranscriptLayout,
}

/// The complete settings record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub output_mode: OutputMode,
    pub llm: LlmSettings,
    pub obsidian: ObsidianSettings,
    pub token_counter: TokenCounterSettings,
    pub markdown: MarkdownOptions,
    pub downloads: DownloadSettings,
    pub youtube: YoutubeSettings,
}

impl Settings {
    /// Builds settings from a stored JSON value merged over the defaults.
    ///
    /// A stored field that does not fit its type is skipped with a warning
    /// and keeps its default; the rest of the stored value still applies.
    pub fn from_stored(stored: &Value) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, stored);
        if let Ok(settings) = serde_json::from_value(merged) {
            return Ok(settings);
        }

        let mut merged = serde_json::to_value(Self::default())?;
        match stored {
            Value::Object(stored) => merge_accepted::<Self>(&mut merged, "", stored),
            _ => warn!("ignoring stored settings that are not an object"),
        }
        Ok(serde_json::from_value(merged)?)
    }
}

/// Merges `overlay` into the object at `pointer` one key at a time, keeping
/// only keys under which `root` still deserializes as `T`. Objects that fail
/// as a whole are retried field by field.
fn merge_accepted<T: DeserializeOwned>(root: &mut Value, pointer: &str, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        let child = format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"));

        let mut candidate = root.clone();
        if let Some(target) = candidate.pointer_mut(pointer) {
            deep_merge(target, &Value::Object(Map::from_iter([(key.clone(), value.clone())])));
        }
        if serde_json::from_value::<T>(candidate.clone()).is_ok() {
            *root = candidate;
        } else if let Value::Object(nested) = value
            && root.pointer(&child).is_some_and(Value::is_object)
        {
            merge_accepted::<T>(root, &child, nested);
        } else {
            warn!(setting = %child, "ignoring stored setting of the wrong type");
        }
    }
}

/// Merges `overlay` into `base`.
///
/// Objects merge key by key, recursively. Any other overlay value replaces
/// the base value, except `null`, which leaves it untouched.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None if !value.is_null() => {
                        base.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

const STORAGE_FILE: &str = "storage.json";
const SETTINGS_KEY: &str = "settings";
const SELECTORS_KEY: &str = "domainSelectors";

/// JSON-file persistence for settings and domain selectors.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store under the user's configuration directory
    /// (`~/.config/mdyoink` on Linux).
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .ok_or_else(|| YoinkError::ConfigError("no configuration directory".to_string()))?;
        Ok(Self::new(base.join("mdyoink")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn read(&self) -> Result<Map<String, Value>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&fs::read_to_string(&path)?)? {
            Value::Object(map) => Ok(map),
            _ => Err(YoinkError::ConfigError(format!("{} is not a JSON object", path.display()))),
        }
    }

    fn write_key(&self, key: &str, value: Value) -> Result<()> {
        let mut storage = self.read()?;
        storage.insert(key.to_string(), value);

        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(), serde_json::to_string_pretty(&Value::Object(storage))?)?;
        debug!(key, path = %self.path().display(), "storage written");
        Ok(())
    }

    /// Loads settings; a missing file or key yields the defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        match self.read()?.get(SETTINGS_KEY) {
            Some(stored) => Settings::from_stored(stored),
            None => Ok(Settings::default()),
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write_key(SETTINGS_KEY, serde_json::to_value(settings)?)
    }

    pub fn load_selectors(&self) -> Result<DomainSelectorMap> {
        match self.read()?.remove(SELECTORS_KEY) {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(DomainSelectorMap::new()),
        }
    }

    fn save_selectors(&self, selectors: &DomainSelectorMap) -> Result<()> {
        self.write_key(SELECTORS_KEY, serde_json::to_value(selectors)?)
    }

    pub fn selector_for(&self, domain: &str) -> Result<Option<String>> {
        Ok(self.load_selectors()?.remove(domain))
    }

    pub fn set_selector(&self, domain: &str, selector: &str) -> Result<()> {
        let mut selectors = self.load_selectors()?;
        selectors.insert(domain.to_string(), selector.to_string());
        self.save_selectors(&selectors)
    }

    /// Returns whether a selector was removed.
    pub fn remove_selector(&self, domain: &str) -> Result<bool> {
        let mut selectors = self.load_selectors()?;
        let removed = selectors.remove(domain).is_some();
        if removed {
            self.save_selectors(&selectors)?;
        }
        Ok(removed)
    }

    /// Merges a `{domain: selector}` JSON object into the stored map.
    ///
    /// Returns the number of entries imported.
    pub fn import_selectors(&self, json: &str) -> Result<usize> {
        let Value::Object(incoming) = serde_json::from_str::<Value>(json)? else {
            return Err(YoinkError::ConfigError("selector import must be a JSON object".to_string()));
        };

        let mut selectors = self.load_selectors()?;
        let mut imported = 0;
        for (domain, selector) in incoming {
            let Value::String(selector) = selector else {
                return Err(YoinkError::ConfigError(format!("selector for {domain} must be a string")));
            };
            selectors.insert(domain, selector);
            imported += 1;
        }

        self.save_selectors(&selectors)?;
        Ok(imported)
    }

    /// The stored map as pretty-printed JSON.
    pub fn export_selectors(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load_selectors()?)?)
    }
}
