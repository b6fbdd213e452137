//! Getting a browser tab to scrape: launch Chrome or attach to a running one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;

/// A browser plus the task pumping its DevTools connection.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    /// Whether the browser process is ours to shut down.
    launched: bool,
}

impl BrowserSession {
    /// Attach to `settings.ws_url` if set, otherwise launch Chrome with a
    /// persistent profile in `profile_dir`.
    pub async fn start(settings: &BrowserSettings, profile_dir: &Path) -> Result<Self> {
        let launched = settings.ws_url.is_none();
        let (browser, mut handler) = match &settings.ws_url {
            Some(ws_url) => {
                tracing::info!(%ws_url, "connecting to running browser");
                Browser::connect(ws_url.as_str())
                    .await
                    .with_context(|| format!("Failed to connect to browser at {ws_url}"))?
            }
            None => launch(settings, profile_dir).await?,
        };

        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        Ok(Self {
            browser,
            handler_task,
            launched,
        })
    }

    /// Open a new tab at `url`.
    pub async fn open(&self, url: &str) -> Result<chromiumoxide::Page> {
        self.browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {url}"))
    }

    /// Cookies visible to `page`, as name/value pairs.
    pub async fn cookies(page: &chromiumoxide::Page) -> Result<Vec<(String, String)>> {
        let cookies = page.get_cookies().await.context("Failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|cookie| (cookie.name, cookie.value))
            .collect())
    }

    /// Shut down a launched browser and wait for the process to exit. A
    /// browser we only attached to is left running.
    pub async fn close(mut self) -> Result<()> {
        if self.launched {
            self.browser
                .close()
                .await
                .context("Failed to close browser")?;
            self.browser
                .wait()
                .await
                .context("Failed to wait for browser exit")?;
            tracing::debug!("browser closed");
        }
        self.handler_task.abort();
        Ok(())
    }
}

async fn launch(
    settings: &BrowserSettings,
    profile_dir: &Path,
) -> Result<(Browser, chromiumoxide::handler::Handler)> {
    let chrome_path = match &settings.chrome_path {
        Some(path) => path.clone(),
        None => find_chrome().context(
            "Chrome/Chromium not found. Install it or set browser.chrome_path in the config.",
        )?,
    };

    std::fs::create_dir_all(profile_dir)
        .with_context(|| format!("Failed to create profile dir: {}", profile_dir.display()))?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(chrome_path)
        .viewport(None)
        .user_data_dir(profile_dir)
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--no-first-run")
        .arg("--no-default-browser-check");
    if !settings.headless {
        builder = builder.with_head();
    }
    let config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

    tracing::info!(profile = %profile_dir.display(), headless = settings.headless, "launching browser");
    Browser::launch(config)
        .await
        .context("Failed to launch browser")
}

/// Find Chrome/Chromium executable.
pub fn find_chrome() -> Option<PathBuf> {
    for name in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    candidates
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}
