//! Scripted in-memory browser for tests.
//!
//! Listing pages are plain URLs; clicking an element opens an "article"
//! whose markup is produced from the listing URL and the clicked locator.
//! Elements are identified by their locator string.

use super::BrowserSession;
use crate::error::{Result, ScrapeError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(String),
    Scroll(String),
    /// Listing URL and the locator clicked on it.
    Click(String, String),
    Back,
    Quit,
}

#[derive(Debug, Clone)]
enum Page {
    Listing(String),
    Article { listing: String, locator: String },
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    lookups: HashMap<String, usize>,
    quit: bool,
}

type MarkupFn = Box<dyn Fn(&str, &str) -> String + Send>;

pub struct FakeSession {
    history: Vec<Page>,
    hidden: HashSet<(Option<String>, String)>,
    delayed: HashMap<String, usize>,
    unreachable: HashSet<String>,
    backs_before_failure: Option<usize>,
    markup: MarkupFn,
    shared: Arc<Mutex<Shared>>,
}

/// Read-only view of what a [`FakeSession`] was asked to do.
#[derive(Clone)]
pub struct Probe(Arc<Mutex<Shared>>);

impl Probe {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().events.clone()
    }

    /// `(listing url, locator)` of every click, in order.
    pub fn clicks(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Click(url, locator) => Some((url, locator)),
                _ => None,
            })
            .collect()
    }

    pub fn lookups(&self, locator: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .lookups
            .get(locator)
            .copied()
            .unwrap_or(0)
    }

    pub fn quit(&self) -> bool {
        self.0.lock().unwrap().quit
    }
}

/// Minimal article page matching the test layouts.
pub fn article_html(title: &str, category: &str, paragraphs: &[&str]) -> String {
    let body = paragraphs
        .iter()
        .map(|p| format!("<p>{p}</p>"))
        .collect::<String>();
    format!(
        r#"<html><body><h1 class="title pg-title">{title}</h1><div class="category">{category}</div><div class="body">{body}</div></body></html>"#
    )
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            hidden: HashSet::new(),
            delayed: HashMap::new(),
            unreachable: HashSet::new(),
            backs_before_failure: None,
            markup: Box::new(|listing, locator| {
                article_html(
                    &format!("{listing} {locator}"),
                    "Habari",
                    &["Print", "Body one. Body two."],
                )
            }),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn probe(&self) -> Probe {
        Probe(Arc::clone(&self.shared))
    }

    /// Never show `locator`, on any page.
    pub fn hide(mut self, locator: &str) -> Self {
        self.hidden.insert((None, locator.to_string()));
        self
    }

    /// Never show `locator` on the listing at `url`.
    pub fn hide_on(mut self, url: &str, locator: &str) -> Self {
        self.hidden
            .insert((Some(url.to_string()), locator.to_string()));
        self
    }

    /// Report `locator` as invisible for the first `misses` lookups.
    pub fn visible_after(mut self, locator: &str, misses: usize) -> Self {
        self.delayed.insert(locator.to_string(), misses);
        self
    }

    /// Fail every navigation to `url`.
    pub fn fail_navigate_on(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// Let `successes` back navigations through, then fail every later one.
    pub fn fail_back_after(mut self, successes: usize) -> Self {
        self.backs_before_failure = Some(successes);
        self
    }

    pub fn with_markup<F>(mut self, markup: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + 'static,
    {
        self.markup = Box::new(markup);
        self
    }

    fn record(&self, event: Event) {
        self.shared.lock().unwrap().events.push(event);
    }

    fn current_listing(&self) -> Result<String> {
        match self.history.last() {
            Some(Page::Listing(url)) => Ok(url.clone()),
            Some(Page::Article { .. }) => Err(ScrapeError::session("not on a listing page")),
            None => Err(ScrapeError::session("no page loaded")),
        }
    }

    fn is_hidden(&self, url: &str, locator: &str) -> bool {
        self.hidden.contains(&(None, locator.to_string()))
            || self
                .hidden
                .contains(&(Some(url.to_string()), locator.to_string()))
    }
}

impl BrowserSession for FakeSession {
    type Element = String;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(Event::Navigate(url.to_string()));
        if self.unreachable.contains(url) {
            return Err(ScrapeError::session(format!("navigation to {url} failed")));
        }
        self.history.push(Page::Listing(url.to_string()));
        Ok(())
    }

    async fn find_visible(&mut self, locator: &str) -> Result<Option<String>> {
        *self
            .shared
            .lock()
            .unwrap()
            .lookups
            .entry(locator.to_string())
            .or_default() += 1;

        let listing = self.current_listing()?;
        if self.is_hidden(&listing, locator) {
            return Ok(None);
        }
        if let Some(misses) = self.delayed.get_mut(locator) {
            if *misses > 0 {
                *misses -= 1;
                return Ok(None);
            }
        }
        Ok(Some(locator.to_string()))
    }

    async fn find(&mut self, locator: &str) -> Result<String> {
        let listing = self.current_listing()?;
        if self.is_hidden(&listing, locator) {
            return Err(ScrapeError::session(format!("no such element: {locator}")));
        }
        Ok(locator.to_string())
    }

    async fn click(&mut self, element: &String) -> Result<()> {
        let listing = self.current_listing()?;
        self.record(Event::Click(listing.clone(), element.clone()));
        self.history.push(Page::Article {
            listing,
            locator: element.clone(),
        });
        Ok(())
    }

    async fn scroll_into_view(&mut self, element: &String) -> Result<()> {
        self.record(Event::Scroll(element.clone()));
        Ok(())
    }

    async fn back(&mut self) -> Result<()> {
        self.record(Event::Back);
        match self.backs_before_failure.as_mut() {
            Some(0) => return Err(ScrapeError::session("history navigation failed")),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        if self.history.len() > 1 {
            self.history.pop();
        }
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String> {
        match self.history.last() {
            Some(Page::Article { listing, locator }) => Ok((self.markup)(listing, locator)),
            Some(Page::Listing(_)) => Ok("<html><body></body></html>".to_string()),
            None => Err(ScrapeError::session("no page loaded")),
        }
    }

    async fn quit(&mut self) -> Result<()> {
        let mut shared = self.shared.lock().unwrap();
        if !shared.quit {
            shared.quit = true;
            shared.events.push(Event::Quit);
        }
        Ok(())
    }
}
