use anyhow::Context;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use wa_timetable_api::TimetableConfig;

pub const CONFIG_ENV: &str = "WA_TIMETABLE_CONFIG";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Seconds between automatic refreshes. Zero disables them.
    pub refresh_secs: u64,
    pub timetable: TimetableConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            refresh_secs: 300,
            timetable: TimetableConfig::default(),
        }
    }
}

/// On-disk layout: a `[ui]` table and a `[timetable]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    ui: UiSection,
    timetable: TimetableConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiSection {
    full_screen: bool,
    log_level: Option<String>,
    refresh_secs: Option<u64>,
}

impl AppSettings {
    /// Defaults, then the TOML file (explicit path or `WA_TIMETABLE_CONFIG`),
    /// then environment overrides. Fails on an unreadable file or an invalid result.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = config_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from));

        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("could not read config file {}", path.display()))?;
                Self::from_toml(&content)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };

        apply_env(&mut settings.timetable, |key| std::env::var(key).ok())?;
        settings.timetable.validate()?;
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let file: SettingsFile = toml::from_str(content)?;
        let log_level = match file.ui.log_level.as_deref() {
            Some(level) => Some(
                LevelFilter::from_str(level).with_context(|| format!("unknown log level {level:?}"))?,
            ),
            None => None,
        };
        Ok(Self {
            full_screen: file.ui.full_screen,
            log_level,
            refresh_secs: file.ui.refresh_secs.unwrap_or(Self::default().refresh_secs),
            timetable: file.timetable,
        })
    }
}

/// Environment overrides, looked up through `var` so tests don't touch the process env.
pub fn apply_env(
    config: &mut TimetableConfig,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("WA_TIMETABLE_URL") {
        config.url = url;
    }
    if let Some(path) = var("WA_TIMETABLE_SOURCE") {
        config.source_file = Some(PathBuf::from(path));
    }
    if let Some(timeout) = var("WA_TIMETABLE_TIMEOUT") {
        config.timeout_secs = timeout
            .trim()
            .parse()
            .with_context(|| format!("WA_TIMETABLE_TIMEOUT must be whole seconds, got {timeout:?}"))?;
    }
    if let Some(zone) = var("WA_TIMETABLE_FROM_TZ") {
        config.source_timezone = zone;
    }
    if let Some(zone) = var("WA_TIMETABLE_TO_TZ") {
        config.target_timezone = zone;
    }
    Ok(())
}
