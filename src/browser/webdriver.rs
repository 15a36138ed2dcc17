//! WebDriver backend for Chrome and Firefox.
//!
//! Both browsers are driven over the W3C WebDriver protocol. When a driver
//! executable path is given, the service (chromedriver or geckodriver) is
//! started as a child process on the chosen port and killed when the
//! session is released; otherwise an already running service is used.
//!
//! Image loading is switched off through browser preferences, which makes
//! listing pages load noticeably faster.

use super::BrowserSession;
use crate::error::{Result, ScrapeError};
use clap::ValueEnum;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thirtyfour::error::{WebDriverErrorInner, WebDriverResult};
use thirtyfour::{BrowserCapabilitiesHelper, By, DesiredCapabilities, WebDriver, WebElement};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_BACKOFF: Duration = Duration::from_millis(500);

/// Browser backend, selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverKind {
    #[value(name = "chrome_driver", alias = "chrome")]
    Chrome,
    #[value(name = "firefox_driver", alias = "firefox")]
    Firefox,
}

impl DriverKind {
    /// Port the driver service listens on by default.
    pub fn default_port(self) -> u16 {
        match self {
            DriverKind::Chrome => 9515,
            DriverKind::Firefox => 4444,
        }
    }
}

/// How to reach (and optionally start) the WebDriver service.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub kind: DriverKind,
    pub driver_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub server_url: Option<String>,
    pub headless: bool,
}

impl LaunchOptions {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.kind.default_port())
    }

    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port()))
    }
}

/// A live browser session plus the driver process that serves it, if owned.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
    service: Option<Child>,
}

impl WebDriverSession {
    /// Start the driver service if requested and open a browser session.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Io`] if the driver executable cannot be started, and
    /// [`ScrapeError::Session`] if no session could be created after
    /// several attempts.
    #[instrument(level = "info", skip_all, fields(kind = ?options.kind))]
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut service = match &options.driver_path {
            Some(path) => Some(spawn_service(path, options.port())?),
            None => None,
        };

        let url = options.server_url();
        match connect(options.kind, &url, options.headless).await {
            Ok(driver) => {
                info!(%url, "Browser session started");
                Ok(Self {
                    driver: Some(driver),
                    service,
                })
            }
            Err(e) => {
                if let Some(child) = service.as_mut() {
                    stop_service(child).await;
                }
                Err(e)
            }
        }
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| ScrapeError::session("browser session already closed"))
    }
}

fn spawn_service(path: &Path, port: u16) -> Result<Child> {
    let child = Command::new(path)
        .arg(format!("--port={port}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    info!(path = %path.display(), port, "Started WebDriver service");
    Ok(child)
}

async fn stop_service(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to stop WebDriver service");
    }
}

/// A tile that went stale between lookup and the display check is simply
/// not visible yet; any other error means the session is gone.
fn displayed_or_stale(result: WebDriverResult<bool>) -> Result<bool> {
    match result {
        Ok(displayed) => Ok(displayed),
        Err(e) if matches!(e.as_inner(), WebDriverErrorInner::StaleElementReference(_)) => Ok(false),
        Err(e) => Err(ScrapeError::session(e)),
    }
}

async fn connect(kind: DriverKind, url: &str, headless: bool) -> Result<WebDriver> {
    let mut last_error = String::new();
    for attempt in 1..=CONNECT_ATTEMPTS {
        let result = match kind {
            DriverKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                caps.insert_browser_option(
                    "prefs",
                    json!({ "profile.managed_default_content_settings.images": 2 }),
                )
                .map_err(ScrapeError::session)?;
                if headless {
                    caps.insert_browser_option("args", ["--headless=new"])
                        .map_err(ScrapeError::session)?;
                }
                WebDriver::new(url, caps).await
            }
            DriverKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                caps.insert_browser_option("prefs", json!({ "permissions.default.image": 2 }))
                    .map_err(ScrapeError::session)?;
                if headless {
                    caps.insert_browser_option("args", ["-headless"])
                        .map_err(ScrapeError::session)?;
                }
                WebDriver::new(url, caps).await
            }
        };

        match result {
            Ok(driver) => return Ok(driver),
            Err(e) => {
                debug!(attempt, error = %e, "WebDriver service not ready");
                last_error = e.to_string();
                sleep(CONNECT_BACKOFF).await;
            }
        }
    }
    Err(ScrapeError::Session(format!(
        "could not open a session at {url} after {CONNECT_ATTEMPTS} attempts: {last_error}"
    )))
}

impl BrowserSession for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.driver()?.goto(url).await.map_err(ScrapeError::session)
    }

    async fn find_visible(&mut self, locator: &str) -> Result<Option<WebElement>> {
        let elements = self
            .driver()?
            .find_all(By::XPath(locator))
            .await
            .map_err(ScrapeError::session)?;
        for element in elements {
            if displayed_or_stale(element.is_displayed().await)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    async fn find(&mut self, locator: &str) -> Result<WebElement> {
        self.driver()?
            .find(By::XPath(locator))
            .await
            .map_err(ScrapeError::session)
    }

    async fn click(&mut self, element: &WebElement) -> Result<()> {
        element.click().await.map_err(ScrapeError::session)
    }

    async fn scroll_into_view(&mut self, element: &WebElement) -> Result<()> {
        element.scroll_into_view().await.map_err(ScrapeError::session)
    }

    async fn back(&mut self) -> Result<()> {
        self.driver()?.back().await.map_err(ScrapeError::session)
    }

    async fn page_source(&mut self) -> Result<String> {
        self.driver()?.source().await.map_err(ScrapeError::session)
    }

    async fn quit(&mut self) -> Result<()> {
        let quit = match self.driver.take() {
            Some(driver) => driver.quit().await.map_err(ScrapeError::session),
            None => Ok(()),
        };
        if let Some(mut child) = self.service.take() {
            stop_service(&mut child).await;
        }
        quit
    }
}
