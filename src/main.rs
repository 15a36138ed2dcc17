//! # VOA Text News
//!
//! Walks the paginated sections of a news site in a real browser, opens
//! every article tile, and appends the article's title, category and body
//! to a plain-text file, one sentence per line.
//!
//! ## Usage
//!
//! ```sh
//! voa_text_news --driver-path /usr/local/bin/chromedriver --checkpoint progress.json
//! # after a failure:
//! voa_text_news --driver-path /usr/local/bin/chromedriver --checkpoint progress.json --resume
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: load the site layout (selectors, locators, sections)
//! 2. **Browser**: start or attach to a WebDriver service and open a session
//! 3. **Traversal**: walk source × page × article, extracting and writing each article
//! 4. **Outcome**: on failure, report the exact offset and save a checkpoint

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod checkpoint;
mod cli;
mod config;
mod engine;
mod error;
mod extract;
mod models;
mod sink;
mod utils;

use browser::{BrowserSession, WebDriverSession};
use checkpoint::Checkpoint;
use cli::Cli;
use config::LayoutConfig;
use engine::Traversal;
use extract::MarkupExtractor;
use sink::TextSink;
use utils::{default_output_filename, resume_flags};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let layout = Arc::new(LayoutConfig::from_file(&args.config)?);
    // Fail on bad selectors before a browser is started.
    MarkupExtractor::new(&layout)?;

    // ---- Resume point and output file ----
    let mut start = args.start_position();
    let mut output = args.filename.clone();
    if args.resume {
        if let Some(path) = &args.checkpoint {
            match Checkpoint::load(path)? {
                Some(saved) => {
                    info!(position = %saved.position, output = %saved.output.display(), "Resuming from checkpoint");
                    start = saved.position;
                    output = Some(saved.output);
                }
                None => warn!(path = %path.display(), "No checkpoint found; using command-line offsets"),
            }
        }
    }
    let output = output.unwrap_or_else(|| {
        PathBuf::from(default_output_filename(&layout.output_prefix, start, Local::now()))
    });

    // ---- Browser ----
    let mut session = WebDriverSession::launch(&args.launch_options()).await?;

    // Only create the output once a browser is up, so a failed launch leaves no file.
    let sink = match TextSink::append_to(&output) {
        Ok(sink) => sink,
        Err(e) => {
            if let Err(quit) = session.quit().await {
                warn!(error = %quit, "Failed to release browser");
            }
            return Err(e.into());
        }
    };
    info!(path = %output.display(), "Writing sentences");

    // ---- Traversal ----
    let mut traversal = Traversal::new(Arc::clone(&layout), session, sink, start)?;
    let outcome = traversal.run().await;
    debug!(state = ?traversal.state(), "Traversal finished");
    match outcome {
        Ok(summary) => {
            if let Some(path) = &args.checkpoint {
                Checkpoint::clear(path)?;
            }
            let elapsed = start_time.elapsed();
            info!(
                articles = summary.articles,
                lines = summary.lines,
                last = ?summary.last_position,
                secs = elapsed.as_secs(),
                path = %output.display(),
                "Collection complete"
            );
            Ok(())
        }
        Err(failure) => {
            error!(
                position = %failure.position,
                resume = %resume_flags(failure.position),
                "Collection stopped; rerun with these offsets to continue"
            );
            if let Some(path) = &args.checkpoint {
                if let Err(e) = Checkpoint::new(failure.position, &output).save(path) {
                    error!(error = %e, path = %path.display(), "Failed to save checkpoint");
                }
            }
            Err(failure.into())
        }
    }
}
