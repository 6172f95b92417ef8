use std::fmt;

use serde::{Deserialize, Serialize};

use crate::browser::error::BrowserError;

/// Selector hints used by browser_server.js to locate elements in the DOM.
///
/// `css` wins when present; otherwise the server resolves the element from
/// the ARIA role, accessible name and tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>, // raw CSS selector, e.g. "a#accounts"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // ARIA role, e.g. "textbox", "link"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>, // accessible name (aria-label or visible text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>, // HTML tag, e.g. "input", "button", "a"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>, // type attribute, e.g. "text", "submit"
    #[serde(rename = "formId", default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>, // parent form ID, e.g. "login"
}

impl SelectorHint {
    pub fn css(selector: impl Into<String>) -> Self {
        SelectorHint {
            css: Some(selector.into()),
            ..Default::default()
        }
    }

    pub fn role(role: &str, name: &str) -> Self {
        SelectorHint {
            role: Some(role.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Anchor whose href is exactly `path`.
    pub fn link_to(path: &str) -> Self {
        Self::css(format!("a[href='{}']", path))
    }

    /// Copy of this hint with `{param}` placeholders substituted.
    pub fn map_text(&self, f: impl Fn(&str) -> String) -> Self {
        SelectorHint {
            css: self.css.as_deref().map(&f),
            role: self.role.clone(),
            name: self.name.as_deref().map(&f),
            tag: self.tag.clone(),
            input_type: self.input_type.clone(),
            form_id: self.form_id.clone(),
        }
    }
}

impl fmt::Display for SelectorHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(css) = &self.css {
            return write!(f, "{}", css);
        }
        let mut parts = Vec::new();
        if let Some(role) = &self.role {
            parts.push(format!("role={}", role));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={:?}", name));
        }
        if let Some(tag) = &self.tag {
            parts.push(format!("tag={}", tag));
        }
        if let Some(form) = &self.form_id {
            parts.push(format!("form={}", form));
        }
        write!(f, "[{}]", parts.join(" "))
    }
}

/// The browser-automation handle the navigator drives.
///
/// Every interaction blocks until the page has settled; the timeout for that
/// belongs to the implementation, never to the caller.
pub trait Browser {
    /// Current absolute URL.
    fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Load an absolute URL.
    fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Load `path` on the origin currently open.
    fn set_path(&mut self, path: &str) -> Result<(), BrowserError> {
        let current = self.current_url()?;
        let origin =
            extract_origin(&current).ok_or_else(|| BrowserError::InvalidUrl(current.clone()))?;
        self.goto(&join_path(origin, path))
    }

    fn click(&mut self, selector: &SelectorHint) -> Result<(), BrowserError>;

    fn fill(&mut self, selector: &SelectorHint, value: &str) -> Result<(), BrowserError>;

    /// Whether an element matching the CSS selector is visible.
    fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError>;

    /// Text content of the first element matching the CSS selector.
    fn text_of(&mut self, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Number of elements matching the CSS selector.
    fn count(&mut self, selector: &str) -> Result<u32, BrowserError>;

    /// Block until the page is settled.
    fn wait_settled(&mut self) -> Result<(), BrowserError>;
}

/// Extract the origin (scheme + host) from a URL.
pub fn extract_origin(url: &str) -> Option<&str> {
    let after_scheme = url.find("://").map(|i| i + 3)?;
    let end = url[after_scheme..]
        .find('/')
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    Some(&url[..end])
}

/// Path component of a URL, without query or fragment. `/` when empty.
pub fn extract_path(url: &str) -> &str {
    let rest = match extract_origin(url) {
        Some(origin) => &url[origin.len()..],
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    match &rest[..end] {
        "" => "/",
        path => path,
    }
}

/// Join an origin and an absolute or relative path.
pub fn join_path(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", origin, path)
    } else {
        format!("{}/{}", origin, path)
    }
}
