//! Data models shared by the traversal, extraction and output stages.
//!
//! - [`Position`]: where in the source × page × article space the run is
//! - [`SourceDescriptor`]: one paginated news section
//! - [`ArticleLocator`]: which element on a listing page opens an article
//! - [`ExtractedArticle`]: the fields pulled out of one rendered article
//! - [`RunState`] and [`RunSummary`]: engine lifecycle and outcome

use crate::config::{LayoutConfig, fill_template};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of article tiles on every listing page of the site.
pub const ARTICLES_PER_PAGE: usize = 12;

/// A point in the traversal: `(source, page, article)`.
///
/// The engine only ever moves this forward. When a run fails, the position
/// names the exact article (or page, if the listing itself failed to load)
/// to pass back as resume offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub source: usize,
    pub page: usize,
    pub article: usize,
}

impl Position {
    pub fn new(source: usize, page: usize, article: usize) -> Self {
        Self {
            source,
            page,
            article,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source {} page {} article {}",
            self.source, self.page, self.article
        )
    }
}

/// A paginated section of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// URL with a single `{}` placeholder for the page number.
    pub url_template: String,
    /// Number of listing pages to walk, starting at page 0.
    pub page_limit: usize,
}

impl SourceDescriptor {
    pub fn page_url(&self, page: usize) -> String {
        fill_template(&self.url_template, page)
    }
}

/// Which element on a listing page leads to an article.
///
/// The lead story sits in its own container, so slot 0 has a dedicated
/// locator; every other slot shares a numbered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleLocator {
    First,
    Slot(usize),
}

impl ArticleLocator {
    pub fn for_slot(slot: usize) -> Self {
        if slot == 0 {
            ArticleLocator::First
        } else {
            ArticleLocator::Slot(slot)
        }
    }

    /// Turn the locator into the XPath expression configured for the site.
    pub fn resolve(&self, layout: &LayoutConfig) -> String {
        match self {
            ArticleLocator::First => layout.first_article_path.clone(),
            ArticleLocator::Slot(slot) => fill_template(&layout.article_path, *slot),
        }
    }
}

/// Title, category and body text of one article.
///
/// Built from rendered markup, handed to the sink and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub category: String,
    /// Paragraph texts in document order, boilerplate already removed.
    pub body_lines: Vec<String>,
}

/// Totals reported by a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Articles opened, extracted and written.
    pub articles: usize,
    /// Sentence lines appended to the output.
    pub lines: usize,
    /// Position of the last article written, if any.
    pub last_position: Option<Position>,
}

/// Lifecycle of a traversal engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(Position),
    Completed(RunSummary),
    Failed(Position),
}
