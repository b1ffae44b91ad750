use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for by [`Config::discover`]
pub const CONFIG_FILE: &str = "pyospray.toml";

/// Environment variable naming the shared library to load
pub const LIBRARY_ENV: &str = "PYOSPRAY_LIBRARY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Explicit path to the shared library; tried before `name`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Base name resolved with the platform's library naming
    #[serde(default = "default_library_name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormatName,

    /// Log to a daily-rotated file in this directory instead of stderr
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_false")]
    pub spans: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatName {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None,
            name: default_library_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormatName::Pretty,
            directory: None,
            spans: false,
            filter: None,
        }
    }
}

fn default_library_name() -> String {
    "ospray".to_string()
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_false() -> bool {
    false
}

fn env_lookup(key: &str) -> Option<OsString> {
    std::env::var_os(key)
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Find the config file in the current directory or its parents, then
    /// apply environment overrides
    pub fn discover() -> Self {
        let (config, warnings) = Self::discover_with_warnings();
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    /// Same search as [`Config::discover`], returning problems instead of
    /// logging them, for callers that install logging from the result
    pub fn discover_with_warnings() -> (Self, Vec<String>) {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(e) => {
                let mut warnings = vec![format!("Cannot read current directory: {}", e)];
                let config = Self::default().apply_overrides(env_lookup, &mut warnings);
                (config, warnings)
            }
        }
    }

    /// Search `start` and its parents for the config file
    pub fn discover_from(start: &Path) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = None;

        for dir in start.ancestors() {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(found) => {
                        config = Some(found);
                        break;
                    }
                    Err(e) => warnings.push(format!("{}: {}", config_path.display(), e)),
                }
            }
        }

        let config = config
            .unwrap_or_default()
            .apply_overrides(env_lookup, &mut warnings);
        (config, warnings)
    }

    /// Apply `PYOSPRAY_*` environment variables
    pub fn with_env_overrides(self) -> Self {
        let mut warnings = Vec::new();
        let config = self.apply_overrides(env_lookup, &mut warnings);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        config
    }

    fn apply_overrides<F>(mut self, lookup: F, warnings: &mut Vec<String>) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if let Some(path) = lookup(LIBRARY_ENV) {
            self.library.path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("PYOSPRAY_LOG_LEVEL") {
            self.logging.level = level.to_string_lossy().into_owned();
        }
        if let Some(format) = lookup("PYOSPRAY_LOG_FORMAT") {
            match format.to_string_lossy().to_lowercase().as_str() {
                "pretty" => self.logging.format = LogFormatName::Pretty,
                "compact" => self.logging.format = LogFormatName::Compact,
                "json" => self.logging.format = LogFormatName::Json,
                other => warnings.push(format!("Unknown PYOSPRAY_LOG_FORMAT '{}'", other)),
            }
        }
        if let Some(dir) = lookup("PYOSPRAY_LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(dir));
        }
        if lookup("PYOSPRAY_LOG_SPANS").is_some() {
            self.logging.spans = true;
        }
        self
    }

    /// Library locations to try, in order
    pub fn library_candidates(&self) -> Vec<OsString> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.library.path {
            candidates.push(path.clone().into_os_string());
        }
        candidates.push(libloading::library_filename(&self.library.name));
        candidates
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }
}
