use std::collections::{HashMap, HashSet};

use portal_nav::browser::driver::{Browser, SelectorHint, extract_path};
use portal_nav::browser::error::BrowserError;

pub const ORIGIN: &str = "https://portal.test";

/// Scripted in-memory browser.
///
/// Clicking `a[href='/x']` loads `/x`; other selectors load whatever path
/// `link` wired them to. Visibility, text and counts come from the script.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    pub url: String,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub visits: Vec<String>,
    pub settled: usize,
    links: HashMap<String, String>,
    visible_on: HashMap<String, HashSet<String>>,
    texts: HashMap<String, String>,
    counts: HashMap<String, u32>,
    failing: HashSet<String>,
}

impl FakeBrowser {
    /// Browser showing `path` on the test origin.
    pub fn at(path: &str) -> Self {
        FakeBrowser {
            url: format!("{}{}", ORIGIN, path),
            ..Default::default()
        }
    }

    /// Clicking `css` loads `path`.
    pub fn link(mut self, css: &str, path: &str) -> Self {
        self.links.insert(css.to_string(), path.to_string());
        self
    }

    /// `css` is visible while `path` is shown.
    pub fn show(mut self, path: &str, css: &str) -> Self {
        self.visible_on
            .entry(path.to_string())
            .or_default()
            .insert(css.to_string());
        self
    }

    pub fn text(mut self, css: &str, text: &str) -> Self {
        self.texts.insert(css.to_string(), text.to_string());
        self
    }

    pub fn elements(mut self, css: &str, count: u32) -> Self {
        self.counts.insert(css.to_string(), count);
        self
    }

    /// Clicking `css` fails.
    pub fn failing(mut self, css: &str) -> Self {
        self.failing.insert(css.to_string());
        self
    }

    pub fn path(&self) -> &str {
        extract_path(&self.url)
    }

    fn load_path(&mut self, path: &str) -> Result<(), BrowserError> {
        let url = format!("{}{}", ORIGIN, path);
        self.goto(&url)
    }
}

impl Browser for FakeBrowser {
    fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.url.clone())
    }

    fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.url = url.to_string();
        self.visits.push(url.to_string());
        self.wait_settled()
    }

    fn click(&mut self, selector: &SelectorHint) -> Result<(), BrowserError> {
        let label = selector.to_string();
        self.clicks.push(label.clone());
        if self.failing.contains(&label) {
            return Err(BrowserError::Element {
                selector: label,
                reason: "scripted failure".into(),
            });
        }

        let href = label
            .strip_prefix("a[href='")
            .and_then(|rest| rest.strip_suffix("']"))
            .map(|path| path.to_string());
        match href.or_else(|| self.links.get(&label).cloned()) {
            Some(path) => self.load_path(&path),
            None => self.wait_settled(),
        }
    }

    fn fill(&mut self, selector: &SelectorHint, value: &str) -> Result<(), BrowserError> {
        self.fills.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let path = extract_path(&self.url).to_string();
        Ok(self
            .visible_on
            .get(&path)
            .is_some_and(|shown| shown.contains(selector)))
    }

    fn text_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.texts.get(selector).cloned())
    }

    fn count(&mut self, selector: &str) -> Result<u32, BrowserError> {
        Ok(self.counts.get(selector).copied().unwrap_or(0))
    }

    fn wait_settled(&mut self) -> Result<(), BrowserError> {
        self.settled += 1;
        Ok(())
    }
}
