use thiserror::Error;

use crate::browser::error::BrowserError;
use crate::page::params::TemplateError;

/// Error raised by a step's browser action.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum NavError {
    /// No step on the current page matched the destination under any rule.
    #[error("no navigation step from {current} to {dest}; possibilities: [{}]", .possibilities.join(", "))]
    StepNotFound {
        current: String,
        dest: String,
        possibilities: Vec<String>,
    },

    /// A matched step failed while binding its arguments or running.
    #[error("navigation step {page}::{step} failed: {source}")]
    StepFailed {
        page: String,
        step: String,
        #[source]
        source: StepError,
    },

    /// The same page class came up twice while walking prerequisites.
    #[error("prerequisite cycle: {}", .chain.join(" -> "))]
    PrerequisiteCycle { chain: Vec<String> },

    /// Backtrace walked more pages than allowed.
    #[error("backtrace exceeded {limit} pages: {}", .chain.join(" -> "))]
    BacktraceTooDeep { limit: usize, chain: Vec<String> },

    /// A page could not be built from the supplied arguments.
    #[error("cannot construct page {page}: {source}")]
    PageConstruction {
        page: String,
        #[source]
        source: TemplateError,
    },

    /// `open` was called with neither a page class nor a URL.
    #[error("open() needs a page class or an absolute url")]
    NothingToOpen,

    /// Navigation by name found no registered page.
    #[error("unknown page '{0}'")]
    UnknownPage(String),

    /// A typed navigation produced a page of another type.
    #[error("expected page {expected}, navigation returned {actual}")]
    UnexpectedPage { expected: String, actual: String },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Argument binding failure for a step's declared parameters.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("href step invoked without a path")]
    ExpectedPath,

    #[error("step expects keyword arguments, got a path")]
    ExpectedArguments,
}
