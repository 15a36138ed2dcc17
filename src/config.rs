//! Site layout configuration.
//!
//! The layout file is YAML with upper-case keys. It names the selectors used
//! to pull fields out of an article page, the XPath templates that locate
//! article tiles on a listing page, and the paginated sections to walk.
//!
//! ```yaml
//! TITLE_CLASS: title pg-title
//! FALLBACK_TITLE_CLASS: media-block__content
//! CATEGORY_CLASS: category
//! FIRST_ARTICLE_PATH: "//div[@class='media-block-wrap']/div[1]//a"
//! ARTICLE_PATH: "//ul[@id='ordinaryItems']/li[{}]//a"
//! SOURCES:
//!   - "https://www.example.org/z/2772?p={}"
//! PAGE_LIMIT: [40]
//! ```

use crate::error::{Result, ScrapeError};
use crate::models::SourceDescriptor;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Placeholder substituted by page or slot numbers in templates.
pub const PLACEHOLDER: &str = "{}";

/// Selectors, locators and sections describing one news site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LayoutConfig {
    #[serde(default = "default_title_tag")]
    pub title_tag: String,
    pub title_class: String,

    #[serde(default = "default_fallback_title_tag")]
    pub fallback_title_tag: String,
    #[serde(alias = "TITLE_CLASS2")]
    pub fallback_title_class: String,

    #[serde(default = "default_category_tag")]
    pub category_tag: String,
    pub category_class: String,

    #[serde(alias = "FIRST_ARTICLE_PATH1")]
    pub first_article_path: String,
    #[serde(alias = "ARTICLE_PATH1")]
    pub article_path: String,

    /// Section URL templates, walked in order.
    pub sources: Vec<String>,
    /// Page count for each entry in `sources`.
    pub page_limit: Vec<usize>,

    /// Exact paragraph texts that are site chrome rather than content.
    #[serde(default = "default_unallowed_tokens")]
    pub unallowed_tokens: Vec<String>,

    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Waits and pauses used while driving the browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TimingConfig {
    #[serde(default = "default_visibility_timeout_ms")]
    pub visibility_timeout_ms: u64,
    #[serde(default = "default_settle_pause_ms")]
    pub settle_pause_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            visibility_timeout_ms: default_visibility_timeout_ms(),
            settle_pause_ms: default_settle_pause_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl TimingConfig {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_millis(self.visibility_timeout_ms)
    }

    pub fn settle_pause(&self) -> Duration {
        Duration::from_millis(self.settle_pause_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl LayoutConfig {
    /// Load and validate a layout file.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Io`] if the file cannot be read,
    /// [`ScrapeError::Yaml`] if it is not valid YAML for this schema, and
    /// [`ScrapeError::Config`] if validation fails.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            sources = config.sources.len(),
            pages = config.page_limit.iter().sum::<usize>(),
            "Loaded layout configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: LayoutConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The configured sections paired with their page limits.
    pub fn sources(&self) -> Vec<SourceDescriptor> {
        self.sources
            .iter()
            .zip(&self.page_limit)
            .map(|(template, &limit)| SourceDescriptor {
                url_template: template.clone(),
                page_limit: limit,
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(ScrapeError::config("SOURCES must list at least one section"));
        }
        if self.sources.len() != self.page_limit.len() {
            return Err(ScrapeError::config(format!(
                "SOURCES has {} entries but PAGE_LIMIT has {}",
                self.sources.len(),
                self.page_limit.len()
            )));
        }

        for template in &self.sources {
            if !template.contains(PLACEHOLDER) {
                return Err(ScrapeError::config(format!(
                    "source template has no page placeholder: {template}"
                )));
            }
            let first_page = fill_template(template, 0);
            Url::parse(&first_page).map_err(|e| {
                ScrapeError::config(format!("source template is not a URL ({e}): {template}"))
            })?;
        }

        if !self.article_path.contains(PLACEHOLDER) {
            return Err(ScrapeError::config(format!(
                "ARTICLE_PATH has no slot placeholder: {}",
                self.article_path
            )));
        }

        for (key, value) in [
            ("TITLE_CLASS", &self.title_class),
            ("FALLBACK_TITLE_CLASS", &self.fallback_title_class),
            ("CATEGORY_CLASS", &self.category_class),
            ("FIRST_ARTICLE_PATH", &self.first_article_path),
        ] {
            if value.trim().is_empty() {
                return Err(ScrapeError::config(format!("{key} cannot be empty")));
            }
        }

        Ok(())
    }
}

/// Substitute `value` for the first `{}` in `template`.
pub fn fill_template(template: &str, value: usize) -> String {
    template.replacen(PLACEHOLDER, &value.to_string(), 1)
}

fn default_title_tag() -> String {
    "h1".to_string()
}

fn default_fallback_title_tag() -> String {
    "div".to_string()
}

fn default_category_tag() -> String {
    "div".to_string()
}

fn default_unallowed_tokens() -> Vec<String> {
    vec![
        "Print".to_string(),
        "No media source currently available".to_string(),
    ]
}

fn default_output_prefix() -> String {
    "voa_swahili".to_string()
}

fn default_visibility_timeout_ms() -> u64 {
    15_000
}

fn default_settle_pause_ms() -> u64 {
    1_000
}

fn default_poll_interval_ms() -> u64 {
    500
}
