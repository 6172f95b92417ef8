//! Page-graph navigation for browser-driven portal tests.
//!
//! Pages declare a prerequisite page, a visibility check and the transition
//! steps they offer. The [`Navigator`] walks prerequisites back from a
//! requested page to the one the browser shows, then replays the path,
//! dispatching one step per hop.

pub mod browser;
pub mod cli;
pub mod navigation;
pub mod page;
pub mod report;
pub mod site;
pub mod spec;

pub use browser::driver::{Browser, SelectorHint};
pub use browser::error::BrowserError;
pub use navigation::error::{NavError, StepError};
pub use navigation::navigator::{Navigator, NavigatorConfig};
pub use navigation::step::{Destination, StepRegistry};
pub use page::catalog::PageCatalog;
pub use page::page_model::{Page, PageClass, PageType};
pub use page::params::{NavArgs, nav_args};
