//! Command-line interface definitions.
//!
//! A single invocation walks the configured sections once, starting from
//! the given offsets, and exits when the walk completes or fails.

use crate::browser::{DriverKind, LaunchOptions};
use crate::models::Position;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Start a fresh run with a local chromedriver
/// voa_text_news --driver-path /usr/local/bin/chromedriver
///
/// # Resume after a failure at source 1, page 2, article 5
/// voa_text_news --driver-type firefox_driver --driver-path ./geckodriver \
///     --source-to-start-from 1 --page-to-start-from 2 --article-to-start-from 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Browser backend: chrome_driver or firefox_driver
    #[arg(long, value_enum, ignore_case = true, default_value = "chrome_driver")]
    pub driver_type: DriverKind,

    /// Path of the driver executable (chromedriver or geckodriver); when
    /// omitted an already running driver service is used
    #[arg(long)]
    pub driver_path: Option<PathBuf>,

    /// Port for the driver service (default 9515 for Chrome, 4444 for Firefox)
    #[arg(long)]
    pub port: Option<u16>,

    /// Full URL of a running WebDriver service
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Site layout file
    #[arg(short, long, env = "VOA_TEXT_NEWS_CONFIG", default_value = "config.yml")]
    pub config: PathBuf,

    /// Output file (default: timestamped name embedding the start offsets)
    #[arg(long)]
    pub filename: Option<PathBuf>,

    /// Source to start scraping from
    #[arg(long, default_value_t = 0)]
    pub source_to_start_from: usize,

    /// Page to start scraping from
    #[arg(long, default_value_t = 0)]
    pub page_to_start_from: usize,

    /// Article to start scraping from
    #[arg(long, default_value_t = 0)]
    pub article_to_start_from: usize,

    /// Progress file written on failure and removed on completion
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Continue from the position and output file stored in --checkpoint
    #[arg(long, requires = "checkpoint")]
    pub resume: bool,
}

impl Cli {
    pub fn start_position(&self) -> Position {
        Position::new(
            self.source_to_start_from,
            self.page_to_start_from,
            self.article_to_start_from,
        )
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            kind: self.driver_type,
            driver_path: self.driver_path.clone(),
            port: self.port,
            server_url: self.webdriver_url.clone(),
            headless: self.headless,
        }
    }
}
