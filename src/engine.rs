//! The source × page × article traversal.
//!
//! For every configured section the engine loads each listing page, then
//! opens the twelve article tiles one by one: wait for the tile, click it,
//! extract the article, append its sentences, go back. The walk can start
//! anywhere in the grid, so a run that died part way through is restarted
//! from the position it reported instead of from the beginning.
//!
//! # Ordering
//!
//! ```text
//! sources  [s, N)
//!   pages  [p, limit(s)) for the first source, [0, limit(i)) afterwards
//!     articles [a, 12) for the first page, [0, 12) afterwards
//! ```
//!
//! # Lazy listing tiles
//!
//! Tiles further down a listing are only rendered as the viewport gets
//! close. Before opening slot `k > 2` the engine scrolls slot `k - 2` into
//! view and settles. The lead story has its own container, which is why
//! numbered slots trail the visual position by two.

use crate::browser::{BrowserSession, Navigator};
use crate::config::LayoutConfig;
use crate::error::{Result, ScrapeError, TraversalFailure};
use crate::extract::MarkupExtractor;
use crate::models::{ARTICLES_PER_PAGE, ArticleLocator, Position, RunState, RunSummary};
use crate::sink::TextSink;
use crate::utils::truncate_for_log;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// First slot that needs a warm-up scroll before it can be clicked.
const PRESCROLL_AFTER_SLOT: usize = 2;

pub struct Traversal<S: BrowserSession, W: Write> {
    layout: Arc<LayoutConfig>,
    navigator: Navigator<S>,
    extractor: MarkupExtractor,
    sink: Option<TextSink<W>>,
    start: Position,
    state: RunState,
}

impl<S: BrowserSession, W: Write> Traversal<S, W> {
    /// Build an idle engine that will start at `start`.
    ///
    /// The engine takes ownership of the browser session and the sink and
    /// releases both when [`run`](Self::run) returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Extraction`] if the layout's selectors do not
    /// compile.
    pub fn new(
        layout: Arc<LayoutConfig>,
        session: S,
        sink: TextSink<W>,
        start: Position,
    ) -> Result<Self> {
        let extractor = MarkupExtractor::new(&layout)?;
        let navigator = Navigator::new(session, &layout.timing);
        Ok(Self {
            layout,
            navigator,
            extractor,
            sink: Some(sink),
            start,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Walk the grid from the start position to the end.
    ///
    /// On success the state becomes [`RunState::Completed`]. On any error the
    /// sink and browser are released, the state becomes
    /// [`RunState::Failed`], and the returned [`TraversalFailure`] names the
    /// position at which the run stopped.
    #[instrument(level = "info", skip_all, fields(start = %self.start))]
    pub async fn run(&mut self) -> std::result::Result<RunSummary, TraversalFailure> {
        let Some(mut sink) = self.sink.take() else {
            return Err(TraversalFailure {
                position: self.start,
                cause: ScrapeError::AlreadyRan,
            });
        };

        let mut cursor = self.start;
        self.state = RunState::Running(cursor);
        info!(position = %cursor, "Traversal started");

        let outcome = match self.check_start() {
            Ok(()) => self.traverse(&mut sink, &mut cursor).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(articles) => {
                let lines = sink.lines_written();
                let closed = sink.close().map_err(ScrapeError::from);
                let released = self.navigator.release().await;
                if let Err(cause) = closed.and(released) {
                    return Err(self.fail(cursor, cause));
                }
                let summary = RunSummary {
                    articles,
                    lines,
                    last_position: (articles > 0).then_some(cursor),
                };
                info!(articles, lines, "Traversal completed");
                self.state = RunState::Completed(summary);
                Ok(summary)
            }
            Err(cause) => {
                if let Err(e) = sink.close() {
                    warn!(error = %e, "Failed to close output after traversal error");
                }
                if let Err(e) = self.navigator.release().await {
                    warn!(error = %e, "Failed to release browser after traversal error");
                }
                Err(self.fail(cursor, cause))
            }
        }
    }

    fn fail(&mut self, position: Position, cause: ScrapeError) -> TraversalFailure {
        error!(
            source = position.source,
            page = position.page,
            article = position.article,
            error = %cause,
            "Failed after: source {} page {} article {}",
            position.source,
            position.page,
            position.article
        );
        self.state = RunState::Failed(position);
        TraversalFailure { position, cause }
    }

    fn check_start(&self) -> Result<()> {
        let start = self.start;
        let out_of_bounds = |reason: String| ScrapeError::OutOfBounds {
            position: start,
            reason,
        };

        let sources = self.layout.sources();
        let Some(source) = sources.get(start.source) else {
            return Err(out_of_bounds(format!(
                "only {} sources are configured",
                sources.len()
            )));
        };
        if start.page >= source.page_limit {
            return Err(out_of_bounds(format!(
                "source {} has {} pages",
                start.source, source.page_limit
            )));
        }
        if start.article >= ARTICLES_PER_PAGE {
            return Err(out_of_bounds(format!(
                "a page holds {ARTICLES_PER_PAGE} articles"
            )));
        }
        Ok(())
    }

    async fn traverse(&mut self, sink: &mut TextSink<W>, cursor: &mut Position) -> Result<usize> {
        let start = self.start;
        let mut articles = 0;

        for (s, source) in self.layout.sources().into_iter().enumerate().skip(start.source) {
            let first_page = if s == start.source { start.page } else { 0 };
            info!(source = s, url = %source.url_template, pages = source.page_limit, "Collecting source");

            for p in first_page..source.page_limit {
                let first_article = if (s, p) == (start.source, start.page) {
                    start.article
                } else {
                    0
                };
                *cursor = Position::new(s, p, first_article);
                self.state = RunState::Running(*cursor);

                let url = source.page_url(p);
                debug!(source = s, page = p, %url, "Opening listing page");
                self.navigator.open(&url).await?;

                for k in first_article..ARTICLES_PER_PAGE {
                    cursor.article = k;
                    self.state = RunState::Running(*cursor);
                    self.collect_article(k, sink).await?;
                    articles += 1;

                    // The article is on disk; a failure from here on must not repeat it.
                    if let Err(cause) = self.navigator.go_back().await {
                        match self.position_after(*cursor) {
                            Some(next) => {
                                *cursor = next;
                                return Err(cause);
                            }
                            None => warn!(
                                error = %cause,
                                "Could not return to the listing after the last article"
                            ),
                        }
                    }
                }
            }
        }

        Ok(articles)
    }

    /// The grid position that follows `position`, or `None` past the end.
    fn position_after(&self, position: Position) -> Option<Position> {
        if position.article + 1 < ARTICLES_PER_PAGE {
            return Some(Position::new(position.source, position.page, position.article + 1));
        }
        let sources = self.layout.sources();
        if position.page + 1 < sources.get(position.source)?.page_limit {
            return Some(Position::new(position.source, position.page + 1, 0));
        }
        sources
            .iter()
            .enumerate()
            .skip(position.source + 1)
            .find(|(_, source)| source.page_limit > 0)
            .map(|(s, _)| Position::new(s, 0, 0))
    }

    /// Open the article in `slot` on the current listing page and write it.
    ///
    /// Leaves the browser on the article page.
    async fn collect_article(&mut self, slot: usize, sink: &mut TextSink<W>) -> Result<()> {
        if slot > PRESCROLL_AFTER_SLOT {
            let warm_up = ArticleLocator::Slot(slot - PRESCROLL_AFTER_SLOT).resolve(&self.layout);
            self.navigator.scroll_into_view(&warm_up).await?;
        }

        let locator = ArticleLocator::for_slot(slot).resolve(&self.layout);
        let tile = self.navigator.await_visible(&locator).await?;
        self.navigator.click(&tile).await?;

        let markup = self.navigator.markup().await?;
        let article = self.extractor.extract(&markup).inspect_err(|e| {
            debug!(error = %e, markup = %truncate_for_log(&markup, 300), "Article markup did not match layout");
        })?;
        let lines = sink.write_article(&article)?;
        debug!(slot, %locator, lines, title = %article.title, "Collected article");
        Ok(())
    }
}
