//! Pull title, category and body text out of a rendered article page.
//!
//! Extraction is a pure transform over markup the browser has already
//! rendered. It never waits or retries; if a required element is missing
//! the page layout is not what the configuration describes and the run
//! should stop.

use crate::config::LayoutConfig;
use crate::error::ExtractionError;
use crate::models::ExtractedArticle;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Compiled selectors plus the boilerplate filter for one site layout.
#[derive(Debug)]
pub struct MarkupExtractor {
    title: CompiledSelector,
    fallback_title: CompiledSelector,
    category: CompiledSelector,
    paragraph: CompiledSelector,
    unallowed: HashSet<String>,
}

#[derive(Debug)]
struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    /// Build `tag.class1.class2` from a tag and a space-separated class list.
    ///
    /// Every token must be a plain CSS identifier. Anything else is rejected
    /// rather than handed to the parser, which would read `a[b` as an
    /// attribute selector instead of a class.
    fn new(tag: &str, classes: &str) -> Result<Self, ExtractionError> {
        let tag = tag.trim();
        let source = std::iter::once(tag.to_string())
            .chain(classes.split_whitespace().map(|class| format!(".{class}")))
            .collect::<String>();
        let invalid = |message: String| ExtractionError::InvalidSelector {
            selector: source.clone(),
            message,
        };

        if let Some(token) = std::iter::once(tag)
            .chain(classes.split_whitespace())
            .find(|token| !is_identifier(token))
        {
            return Err(invalid(format!("`{token}` is not a CSS identifier")));
        }
        let selector = Selector::parse(&source).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { source, selector })
    }

    fn first<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.selector).next()
    }
}

impl MarkupExtractor {
    /// Compile the selectors named by `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidSelector`] if a tag or class name
    /// does not form a valid CSS selector.
    pub fn new(layout: &LayoutConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            title: CompiledSelector::new(&layout.title_tag, &layout.title_class)?,
            fallback_title: CompiledSelector::new(
                &layout.fallback_title_tag,
                &layout.fallback_title_class,
            )?,
            category: CompiledSelector::new(&layout.category_tag, &layout.category_class)?,
            paragraph: CompiledSelector::new("p", "")?,
            unallowed: layout.unallowed_tokens.iter().cloned().collect(),
        })
    }

    /// Extract an article from page markup.
    ///
    /// The title comes from the primary selector, or the fallback selector
    /// when the primary matches nothing. The category is mandatory. Body
    /// lines are every `<p>` in document order, minus paragraphs whose
    /// trimmed text is exactly an unallowed token.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::MissingTitle`] if neither title selector matches
    /// - [`ExtractionError::MissingCategory`] if the category selector matches nothing
    #[instrument(level = "debug", skip_all, fields(bytes = markup.len()))]
    pub fn extract(&self, markup: &str) -> Result<ExtractedArticle, ExtractionError> {
        let document = Html::parse_document(markup);

        let title = self
            .title
            .first(&document)
            .or_else(|| self.fallback_title.first(&document))
            .ok_or_else(|| ExtractionError::MissingTitle {
                primary: self.title.source.clone(),
                fallback: self.fallback_title.source.clone(),
            })?;

        let category = self
            .category
            .first(&document)
            .ok_or_else(|| ExtractionError::MissingCategory(self.category.source.clone()))?;

        let body_lines = document
            .select(&self.paragraph.selector)
            .map(|p| text_of(&p))
            .filter(|line| !self.unallowed.contains(line))
            .collect::<Vec<_>>();

        let article = ExtractedArticle {
            title: text_of(&title),
            category: text_of(&category),
            body_lines,
        };
        debug!(
            title = %article.title,
            category = %article.category,
            paragraphs = article.body_lines.len(),
            "Extracted article"
        );
        Ok(article)
    }
}

/// Letters, digits, `-`, `_` and non-ASCII, not starting with a digit or `-<digit>`.
fn is_identifier(token: &str) -> bool {
    let unprefixed = token.strip_prefix('-').unwrap_or(token);
    let Some(first) = unprefixed.chars().next() else {
        return false;
    };
    !first.is_ascii_digit()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
