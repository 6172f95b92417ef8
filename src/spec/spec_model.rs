use serde::{Deserialize, Serialize};

use crate::browser::driver::SelectorHint;
use crate::page::params::NavArgs;

/// A navigation test. Deserialized from YAML for human review and
/// execution against a site map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavSpec {
    /// Human-readable name for this test
    pub name: String,

    /// URL to load before executing steps
    #[serde(default)]
    pub start_url: Option<String>,

    /// Ordered list of steps to execute
    pub steps: Vec<NavStep>,
}

/// A single step in a navigation spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavStep {
    /// Load a page (or URL) directly, without walking prerequisites
    Open {
        #[serde(default)]
        page: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        args: NavArgs,
    },

    /// Reach a page from whatever is displayed
    Navigate {
        page: String,
        #[serde(default)]
        args: NavArgs,
    },

    /// Click an element on the current page
    Click { selector: SelectorHint },

    /// Fill an input on the current page
    Fill { selector: SelectorHint, value: String },

    /// Run assertions against the current page state
    Assert { assertions: Vec<AssertionSpec> },
}

/// A single assertion to evaluate against the browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssertionSpec {
    /// Current URL contains the expected substring
    UrlContains { expected: String },

    /// Current URL exactly matches
    UrlEquals { expected: String },

    /// The named page reports itself displayed
    PageDisplayed {
        page: String,
        #[serde(default)]
        args: NavArgs,
    },

    /// A specific element's text contains the expected string
    ElementText { selector: String, expected: String },

    /// A specific element is visible on the page
    ElementVisible { selector: String },

    /// Count of matching elements equals expected
    ElementCount { selector: String, expected: u32 },
}

impl AssertionSpec {
    /// Variant name for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AssertionSpec::UrlContains { .. } => "UrlContains",
            AssertionSpec::UrlEquals { .. } => "UrlEquals",
            AssertionSpec::PageDisplayed { .. } => "PageDisplayed",
            AssertionSpec::ElementText { .. } => "ElementText",
            AssertionSpec::ElementVisible { .. } => "ElementVisible",
            AssertionSpec::ElementCount { .. } => "ElementCount",
        }
    }
}

/// Result of evaluating a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionResult {
    /// Which step this assertion belongs to (0-indexed)
    pub step_index: usize,

    pub spec: AssertionSpec,

    pub passed: bool,

    /// Actual value found (for debugging failed assertions)
    pub actual: Option<String>,

    /// Human-readable failure message
    pub message: Option<String>,
}

/// Result of running a complete navigation spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub spec_name: String,

    /// Whether all steps and assertions passed
    pub passed: bool,

    /// Number of steps that were executed
    pub steps_run: usize,

    /// Pages reached by `open`/`navigate` steps, in order
    pub pages: Vec<String>,

    pub assertion_results: Vec<AssertionResult>,

    /// Error message if the test failed due to an error (not assertion failure)
    pub error: Option<String>,
}
