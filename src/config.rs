use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};

/// Retry budget for page probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum number of probe attempts.
    pub tries: u32,

    /// Wait between two attempts.
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tries: 10,
            interval: Duration::from_millis(1000),
        }
    }
}

/// Fixed locations on the bank's site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// The run refuses to start anywhere else.
    pub history_url: String,

    /// Where the page is sent once the run is over, whatever the outcome.
    pub logout_path: String,

    /// How long the run waits for the logout page to load.
    #[serde(
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub logout_timeout: Duration,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            history_url: "https://online.mbank.pl/history".to_string(),
            logout_path: "/LoginMain/Account/Logout".to_string(),
            logout_timeout: Duration::from_secs(10),
        }
    }
}

/// An element located by tag name and a fragment of its own text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub tag: String,
    pub text: String,
}

/// Cell positions of the four extracted fields within a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub balance: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            date: 1,
            description: 3,
            amount: 6,
            balance: 7,
        }
    }
}

/// Structural assumptions about the history page markup.
///
/// None of this is validated against the live site, which can change
/// without notice. Everything is overridable from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Label of the "show balance" switch.
    pub saldo_label: LabelConfig,

    /// Child indices leading from the label's parent to the switch ball.
    pub ball_path: Vec<usize>,

    /// Ball background color meaning the balances are hidden.
    pub saldo_off_color: String,

    pub columns: ColumnLayout,

    /// Only every `row_stride`-th child of the table body is a data row.
    pub row_stride: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            saldo_label: LabelConfig {
                tag: "span".to_string(),
                text: "Saldo".to_string(),
            },
            ball_path: vec![2, 1],
            saldo_off_color: "rgb(255, 255, 255)".to_string(),
            columns: ColumnLayout::default(),
            row_stride: 2,
        }
    }
}

/// Default time given to the host page before the run starts.
fn default_startup_delay() -> Duration {
    Duration::from_secs(5)
}

/// Everything the scrape run itself depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    #[serde(
        default = "default_startup_delay",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub startup_delay: Duration,

    pub probe: ProbeConfig,

    pub pages: PagesConfig,

    pub layout: LayoutConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            startup_delay: default_startup_delay(),
            probe: ProbeConfig::default(),
            pages: PagesConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// How the CLI gets hold of a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// DevTools websocket of an already running browser. When set, nothing
    /// is launched.
    pub ws_url: Option<String>,

    /// Chrome/Chromium executable. Searched for when unset.
    pub chrome_path: Option<PathBuf>,

    /// Browser profile directory. Defaults to a directory under the user's
    /// data dir so that a login survives between runs.
    pub profile_dir: Option<PathBuf>,

    pub headless: bool,
}

fn default_export_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default()
}

/// CSV history export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub base_url: String,

    /// Product (account) identifier the export is filtered on.
    pub product_id: String,

    /// First day of the exported range when none is given on the command line.
    #[serde(default = "default_export_from")]
    pub from: NaiveDate,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://online.mbank.pl".to_string(),
            product_id: "399116".to_string(),
            from: default_export_from(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scrape: ScraperConfig,
    pub browser: BrowserSettings,
    pub export: ExportConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject settings the scraper cannot work with.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.scrape.layout;
        if layout.row_stride == 0 {
            anyhow::bail!("scrape.layout.row_stride must be at least 1");
        }
        if layout.saldo_label.tag.trim().is_empty() || layout.saldo_label.text.is_empty() {
            anyhow::bail!("scrape.layout.saldo_label needs both a tag and a text");
        }
        if self.scrape.probe.tries == 0 {
            anyhow::bail!("scrape.probe.tries must be at least 1");
        }
        Ok(())
    }

    /// Browser profile directory, falling back to the user's data dir.
    pub fn profile_dir(&self) -> Result<PathBuf> {
        match &self.browser.profile_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let base = dirs::data_dir().context("Could not find data directory")?;
                Ok(base.join("mbank-history").join("profile"))
            }
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./mbank-history.toml` if it exists in current directory
/// 2. `~/.config/mbank-history/mbank-history.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("mbank-history.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("mbank-history").join("mbank-history.toml");
    }

    local_config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_site_layout() {
        let config = Config::default();
        assert_eq!(config.scrape.probe.tries, 10);
        assert_eq!(config.scrape.probe.interval, Duration::from_millis(1000));
        assert_eq!(config.scrape.startup_delay, Duration::from_secs(5));
        assert_eq!(config.scrape.pages.logout_timeout, Duration::from_secs(10));
        assert_eq!(config.scrape.layout.ball_path, vec![2, 1]);
        assert_eq!(config.scrape.layout.row_stride, 2);
        assert_eq!(
            config.scrape.layout.columns,
            ColumnLayout {
                date: 1,
                description: 3,
                amount: 6,
                balance: 7
            }
        );
        assert_eq!(
            config.export.from,
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mbank-history.toml");
        std::fs::write(
            &path,
            r#"
[scrape]
startup_delay = "2s"

[scrape.probe]
interval = "250ms"

[scrape.layout.columns]
amount = 5
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.scrape.startup_delay, Duration::from_secs(2));
        assert_eq!(config.scrape.probe.interval, Duration::from_millis(250));
        assert_eq!(config.scrape.probe.tries, 10);
        assert_eq!(config.scrape.layout.columns.amount, 5);
        assert_eq!(config.scrape.layout.columns.balance, 7);
        assert_eq!(config.scrape.pages, PagesConfig::default());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mbank-history.toml");
        std::fs::write(&path, "[scrape.layout]\nrow_stride = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row_stride"));
    }

    #[test]
    fn test_rendered_config_loads_back() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
