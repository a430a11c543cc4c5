use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{info, warn};

pub const DEFAULT_DEBUG_URL: &str = "http://127.0.0.1:9222";
pub const DEFAULT_CALENDAR_URL: &str = "https://calendar.google.com/calendar/r/month";
pub const CALENDAR_HOST: &str = "calendar.google.com";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// DevTools endpoint of a Chrome that is already running and logged in.
    pub debug_url: String,
    /// Opened when a fresh Chrome has to be launched.
    pub calendar_url: String,
    pub chrome_path: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            debug_url: DEFAULT_DEBUG_URL.to_string(),
            calendar_url: DEFAULT_CALENDAR_URL.to_string(),
            chrome_path: None,
            profile_dir: None,
        }
    }
}

/// Browser plus the tab showing the calendar.
pub struct BrowserSession {
    _browser: Browser,
    pub tab: Arc<Tab>,
}

impl BrowserSession {
    /// Blocking; call from `spawn_blocking`.
    pub fn launch(options: &SessionOptions) -> Result<Self> {
        // 1. Prefer the user's own Chrome: it is already signed in to the calendar.
        info!(debug_url = options.debug_url.as_str(), "Attempting to attach to existing Chrome");
        match Browser::connect(options.debug_url.clone()) {
            Ok(browser) => {
                info!("Attached to existing Chrome");
                let tab = pick_calendar_tab(&browser)?;
                return Ok(Self {
                    _browser: browser,
                    tab,
                });
            }
            Err(e) => warn!(error = %e, "Could not attach, launching a dedicated Chrome"),
        }

        // 2. Launch one with a persistent profile so the login survives between runs.
        let profile_dir = match &options.profile_dir {
            Some(dir) => dir.clone(),
            None => default_profile_dir()?,
        };
        std::fs::create_dir_all(&profile_dir)
            .with_context(|| format!("creating profile dir {}", profile_dir.display()))?;

        let chrome_path = match &options.chrome_path {
            Some(path) => path.clone(),
            None => headless_chrome::browser::default_executable()
                .map_err(|e| anyhow::anyhow!("Chrome executable not found: {}", e))?,
        };

        let launch_options = LaunchOptions {
            headless: false,
            path: Some(chrome_path),
            user_data_dir: Some(profile_dir.clone()),
            args: vec![
                OsStr::new("--no-first-run"),
                OsStr::new("--no-default-browser-check"),
                OsStr::new("--password-store=basic"),
            ],
            idle_browser_timeout: Duration::from_secs(600),
            ..Default::default()
        };

        info!(profile = %profile_dir.display(), "Starting Chrome");
        let browser = Browser::new(launch_options)
            .map_err(|e| anyhow::anyhow!("Browser launch failed: {}", e))?;

        let tab = browser.new_tab()?;
        tab.navigate_to(&options.calendar_url)?;
        tab.wait_until_navigated()?;
        info!(url = options.calendar_url.as_str(), "Chrome ready");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

fn pick_calendar_tab(browser: &Browser) -> Result<Arc<Tab>> {
    let existing = {
        let tabs = browser
            .get_tabs()
            .lock()
            .map_err(|_| anyhow::anyhow!("tab list lock poisoned"))?;
        tabs.iter()
            .find(|t| t.get_url().contains(CALENDAR_HOST))
            .or_else(|| tabs.first())
            .cloned()
    };

    match existing {
        Some(tab) => {
            info!(url = tab.get_url().as_str(), "Using existing tab");
            Ok(tab)
        }
        None => {
            info!("No tabs found, creating new one");
            Ok(browser.new_tab()?)
        }
    }
}

fn default_profile_dir() -> Result<PathBuf> {
    let local_data =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("no local data directory"))?;
    Ok(local_data.join("calendar-purge").join("chrome-profile"))
}
