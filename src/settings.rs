use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::CrawlerError;

pub const GITHUB_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const DEFAULT_SETTINGS_REL_PATH: &str = "settings.toml";
const DEFAULT_USER_AGENT: &str = "who-submodules";
const DEFAULT_OUTPUT_DIR: &str = "repos";
const DEFAULT_PAGE_SIZE: u32 = 50;
const DEFAULT_MIN_STARS: u32 = 1000;
const DEFAULT_RETRY_DELAY_SECS: u64 = 10;
// Github refuses `first` values above 100
const MAX_PAGE_SIZE: u32 = 100;

const TOKEN_VAR: &str = "GITHUB_ACCESS_TOKEN";
const USER_AGENT_VAR: &str = "GH_API_USER_AGENT";
const SETTINGS_PATH_VAR: &str = "WHO_SUBMODULES_SETTINGS";
const OUTPUT_DIR_VAR: &str = "WHO_SUBMODULES_OUTPUT_DIR";
const PAGE_SIZE_VAR: &str = "WHO_SUBMODULES_PAGE_SIZE";
const MIN_STARS_VAR: &str = "WHO_SUBMODULES_MIN_STARS";
const RETRY_DELAY_VAR: &str = "WHO_SUBMODULES_RETRY_DELAY_SECS";

/// Optional `settings.toml`, every key may be omitted.
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    endpoint: Option<String>,
    output_dir: Option<PathBuf>,
    page_size: Option<u32>,
    min_stars: Option<u32>,
    retry_delay_secs: Option<u64>,
    include_submodule_names: Option<bool>,
}

/// Everything the crawler needs, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct CrawlerSettings {
    pub token: String,
    pub user_agent: String,
    pub endpoint: String,
    pub output_dir: PathBuf,
    pub page_size: u32,
    pub min_stars: u32,
    pub retry_delay: Duration,
    /// Also request submodule names/paths and `updatedAt`.
    /// Github tends to error on submodules with uncommon characters in their names.
    pub include_submodule_names: bool,
}

impl CrawlerSettings {
    /// Reads the process environment (call `dotenv()` first) and, if present, the
    /// settings file pointed to by *WHO_SUBMODULES_SETTINGS* (default `settings.toml`).
    pub fn from_env() -> Result<CrawlerSettings, CrawlerError> {
        let file_contents = match std::env::var(SETTINGS_PATH_VAR) {
            Ok(explicit_path) => read_settings_file(Path::new(&explicit_path), true)?,
            Err(_) => read_settings_file(Path::new(DEFAULT_SETTINGS_REL_PATH), false)?,
        };
        Self::from_sources(file_contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Environment values win over the settings file, which wins over the defaults.
    pub fn from_sources<F>(file_contents: Option<&str>, env: F) -> Result<CrawlerSettings, CrawlerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: SettingsFile = match file_contents {
            Some(contents) => toml::from_str(contents)
                .map_err(|e| CrawlerError::settings(format!("settings file: {e}")))?,
            None => SettingsFile::default(),
        };

        let token = env(TOKEN_VAR)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(CrawlerError::MissingToken)?;

        let page_size = match env(PAGE_SIZE_VAR) {
            Some(raw) => parse_var(PAGE_SIZE_VAR, &raw)?,
            None => file.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        };
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CrawlerError::settings(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let retry_delay_secs = match env(RETRY_DELAY_VAR) {
            Some(raw) => parse_var(RETRY_DELAY_VAR, &raw)?,
            None => file.retry_delay_secs.unwrap_or(DEFAULT_RETRY_DELAY_SECS),
        };
        if retry_delay_secs == 0 {
            return Err(CrawlerError::settings("retry_delay_secs must be at least 1"));
        }

        let min_stars = match env(MIN_STARS_VAR) {
            Some(raw) => parse_var(MIN_STARS_VAR, &raw)?,
            None => file.min_stars.unwrap_or(DEFAULT_MIN_STARS),
        };

        Ok(CrawlerSettings {
            token,
            user_agent: env(USER_AGENT_VAR).unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            endpoint: file
                .endpoint
                .unwrap_or_else(|| GITHUB_GRAPHQL_ENDPOINT.to_owned()),
            output_dir: env(OUTPUT_DIR_VAR)
                .map(PathBuf::from)
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            page_size,
            min_stars,
            retry_delay: Duration::from_secs(retry_delay_secs),
            include_submodule_names: file.include_submodule_names.unwrap_or(false),
        })
    }
}

/// Reads the settings file. Only the implicit default may be missing, a path
/// given through *WHO_SUBMODULES_SETTINGS* has to exist.
fn read_settings_file(path: &Path, explicit: bool) -> Result<Option<String>, CrawlerError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            info!("Loaded settings from {}", path.display());
            Ok(Some(contents))
        }
        Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CrawlerError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CrawlerError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| CrawlerError::settings(format!("couldn't parse '{key}' value '{raw}'")))
}
