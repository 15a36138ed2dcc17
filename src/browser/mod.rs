//! Browser control.
//!
//! [`BrowserSession`] is the raw capability a browser backend provides.
//! [`Navigator`] wraps a session with the timing rules the traversal relies
//! on: a bounded wait for elements to become visible, and a fixed settle
//! pause after going back and after scrolling so the listing page and its
//! lazily rendered tiles are in place before the next interaction.
//!
//! # Backends
//!
//! | Backend | Module | Driver |
//! |---------|--------|--------|
//! | Chrome | [`webdriver`] | chromedriver |
//! | Firefox | [`webdriver`] | geckodriver |

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

use crate::config::TimingConfig;
use crate::error::{Result, ScrapeError};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

pub use webdriver::{DriverKind, LaunchOptions, WebDriverSession};

/// Operations a browser backend exposes. Locators are XPath expressions.
pub trait BrowserSession {
    type Element;

    /// Load `url` in the current tab and wait for the navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// The first element matching `locator` that is currently displayed.
    async fn find_visible(&mut self, locator: &str) -> Result<Option<Self::Element>>;

    /// The first element matching `locator`, visible or not.
    async fn find(&mut self, locator: &str) -> Result<Self::Element>;

    async fn click(&mut self, element: &Self::Element) -> Result<()>;

    async fn scroll_into_view(&mut self, element: &Self::Element) -> Result<()>;

    /// Go back one history entry.
    async fn back(&mut self) -> Result<()>;

    /// Markup of the page as currently rendered.
    async fn page_source(&mut self) -> Result<String>;

    /// End the session. Calling it again is a no-op.
    async fn quit(&mut self) -> Result<()>;
}

/// A [`BrowserSession`] plus waits and settle pauses.
pub struct Navigator<S: BrowserSession> {
    session: S,
    visibility_timeout: Duration,
    poll_interval: Duration,
    settle_pause: Duration,
}

impl<S: BrowserSession> Navigator<S> {
    pub fn new(session: S, timing: &TimingConfig) -> Self {
        Self {
            session,
            visibility_timeout: timing.visibility_timeout(),
            poll_interval: timing.poll_interval(),
            settle_pause: timing.settle_pause(),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn open(&mut self, url: &str) -> Result<()> {
        self.session.navigate(url).await
    }

    /// Poll until an element matching `locator` is visible.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NavigationTimeout`] once the configured timeout has
    /// elapsed without a visible match.
    #[instrument(level = "debug", skip(self))]
    pub async fn await_visible(&mut self, locator: &str) -> Result<S::Element> {
        let deadline = Instant::now() + self.visibility_timeout;
        loop {
            if let Some(element) = self.session.find_visible(locator).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::NavigationTimeout {
                    locator: locator.to_string(),
                    timeout: self.visibility_timeout,
                });
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Click without waiting for any navigation it triggers.
    pub async fn click(&mut self, element: &S::Element) -> Result<()> {
        self.session.click(element).await
    }

    /// Bring the element at `locator` into the viewport, then settle.
    #[instrument(level = "debug", skip(self))]
    pub async fn scroll_into_view(&mut self, locator: &str) -> Result<()> {
        let element = self.session.find(locator).await?;
        self.session.scroll_into_view(&element).await?;
        self.settle().await;
        Ok(())
    }

    /// Return to the previous page, then settle.
    pub async fn go_back(&mut self) -> Result<()> {
        self.session.back().await?;
        self.settle().await;
        Ok(())
    }

    pub async fn markup(&mut self) -> Result<String> {
        self.session.page_source().await
    }

    /// Shut the browser session down.
    pub async fn release(&mut self) -> Result<()> {
        self.session.quit().await
    }

    async fn settle(&self) {
        if !self.settle_pause.is_zero() {
            debug!(pause = ?self.settle_pause, "Settling");
            sleep(self.settle_pause).await;
        }
    }
}
