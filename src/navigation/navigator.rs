use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::browser::driver::{Browser, join_path};
use crate::navigation::dispatch::{DispatchRule, default_rules, dispatch};
use crate::navigation::error::NavError;
use crate::navigation::step::StepRegistry;
use crate::navigation::trace::{NavTraceEvent, TraceLogger};
use crate::page::catalog::PageCatalog;
use crate::page::page_model::{Page, PageClass, PageType, downcast_page};
use crate::page::params::NavArgs;

pub const DEFAULT_MAX_BACKTRACE_DEPTH: usize = 32;

// ============================================================================
// Navigator configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Longest prerequisite chain a backtrace may build
    #[serde(default = "default_max_backtrace_depth")]
    pub max_backtrace_depth: usize,

    /// Origin that `open` loads page paths on; the current origin when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// JSONL navigation trace file; disabled when unset
    #[serde(default)]
    pub trace_path: Option<String>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_backtrace_depth: DEFAULT_MAX_BACKTRACE_DEPTH,
            base_url: None,
            trace_path: None,
        }
    }
}

fn default_max_backtrace_depth() -> usize {
    DEFAULT_MAX_BACKTRACE_DEPTH
}

// ============================================================================
// Path chain
// ============================================================================

/// Pages between the displayed page and the target, built target-first by
/// the backtrace and consumed root-first by the replay.
pub struct PathChain {
    target: Box<dyn Page>,
    hops: Vec<Box<dyn Page>>,
    anchored: bool,
}

impl PathChain {
    pub fn new(target: Box<dyn Page>) -> Self {
        PathChain {
            target,
            hops: Vec::new(),
            anchored: false,
        }
    }

    /// Add the prerequisite of the page pushed last.
    pub fn push(&mut self, page: Box<dyn Page>) {
        self.hops.push(page);
    }

    pub fn len(&self) -> usize {
        self.hops.len() + 1
    }

    /// Whether the top of the chain was found displayed.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn contains(&self, class: &PageClass) -> bool {
        self.target.class() == *class || self.hops.iter().any(|p| p.class() == *class)
    }

    /// Page names, target first.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(&self.target)
            .chain(self.hops.iter())
            .map(|p| p.name())
            .collect()
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Reaches a requested page from whatever page the browser shows.
///
/// `navigate` walks prerequisites back from the target until it meets a
/// displayed page, then replays the path forward, dispatching one step per
/// hop. One navigation at a time; the navigator is not meant to be shared.
pub struct Navigator<B: Browser> {
    browser: B,
    rules: Vec<Box<dyn DispatchRule>>,
    config: NavigatorConfig,
    tracer: TraceLogger,
    navigation: u64,
    last_path: Vec<String>,
    last_displayed: Option<(PageClass, NavArgs)>,
}

impl<B: Browser> Navigator<B> {
    pub fn new(browser: B) -> Self {
        Self::with_config(browser, NavigatorConfig::default())
    }

    pub fn with_config(browser: B, config: NavigatorConfig) -> Self {
        let tracer = match &config.trace_path {
            Some(path) => TraceLogger::new(path),
            None => TraceLogger::disabled(),
        };
        Navigator {
            browser,
            rules: default_rules(),
            config,
            tracer,
            navigation: 0,
            last_path: Vec::new(),
            last_displayed: None,
        }
    }

    /// Replace the dispatch rules (tried in the given order).
    pub fn with_rules(mut self, rules: Vec<Box<dyn DispatchRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Page names of the last backtrace, target first.
    pub fn last_path(&self) -> &[String] {
        &self.last_path
    }

    /// Build a page without touching the browser.
    pub fn new_page(&self, class: &PageClass, args: &NavArgs) -> Result<Box<dyn Page>, NavError> {
        class.build(args)
    }

    /// Navigate to `class`, returning the freshly built target page.
    pub fn navigate(&mut self, class: &PageClass, args: &NavArgs) -> Result<Box<dyn Page>, NavError> {
        self.navigation += 1;
        let chain = self.backtrace(class, args)?;
        self.last_path = chain.names();
        debug!(path = ?self.last_path, anchored = chain.is_anchored(), "backtrace complete");

        self.replay(chain, args)
    }

    pub fn navigate_to<P: PageType>(&mut self, args: &NavArgs) -> Result<P, NavError> {
        let page = self.navigate(&PageClass::of::<P>(), args)?;
        downcast_page(page)
    }

    pub fn navigate_by_name(
        &mut self,
        catalog: &PageCatalog,
        name: &str,
        args: &NavArgs,
    ) -> Result<Box<dyn Page>, NavError> {
        let class = catalog.resolve(name)?;
        self.navigate(&class, args)
    }

    /// Load a page directly, skipping backtrace and steps.
    ///
    /// With `url`, the browser goes there. With `class`, the page is built and,
    /// unless a `url` was given, its own path is loaded; its post-navigation
    /// hook runs and the page is returned.
    pub fn open(
        &mut self,
        class: Option<&PageClass>,
        url: Option<&str>,
        args: &NavArgs,
    ) -> Result<Option<Box<dyn Page>>, NavError> {
        if class.is_none() && url.is_none() {
            return Err(NavError::NothingToOpen);
        }
        self.navigation += 1;

        if let Some(url) = url {
            info!(url, "opening url");
            self.browser.goto(url)?;
        }

        let Some(class) = class else {
            self.last_displayed = None;
            if let Some(url) = url {
                self.trace(NavTraceEvent::now(self.navigation, "open", "").with_url(url));
            }
            return Ok(None);
        };

        let mut page = class.build(args)?;
        if url.is_none() {
            info!(page = %class, path = page.path(), "opening page");
            match &self.config.base_url {
                Some(base) => self.browser.goto(&join_path(base, page.path()))?,
                None => self.browser.set_path(page.path())?,
            }
        }
        page.post_navigate(&mut self.browser)?;

        let mut event = NavTraceEvent::now(self.navigation, "open", class.name());
        if let Some(url) = url {
            event = event.with_url(url);
        }
        self.trace(event);
        self.last_displayed = Some((class.clone(), args.clone()));
        Ok(Some(page))
    }

    pub fn open_page<P: PageType>(&mut self, args: &NavArgs) -> Result<P, NavError> {
        match self.open(Some(&PageClass::of::<P>()), None, args)? {
            Some(page) => downcast_page(page),
            None => Err(NavError::NothingToOpen),
        }
    }

    // ------------------------------------------------------------------
    // Backtrace
    // ------------------------------------------------------------------

    fn backtrace(&mut self, class: &PageClass, args: &NavArgs) -> Result<PathChain, NavError> {
        let target = class.build(args)?;
        let (mut displayed, mut next) = self.visit(target.as_ref(), args)?;
        let mut chain = PathChain::new(target);

        while let Some(class) = next {
            if chain.contains(&class) {
                let mut names = chain.names();
                names.push(class.name().to_string());
                warn!(chain = ?names, "prerequisite cycle");
                return Err(NavError::PrerequisiteCycle { chain: names });
            }
            if chain.len() >= self.config.max_backtrace_depth {
                let mut names = chain.names();
                names.push(class.name().to_string());
                return Err(NavError::BacktraceTooDeep {
                    limit: self.config.max_backtrace_depth,
                    chain: names,
                });
            }

            let page = class.build(args)?;
            (displayed, next) = self.visit(page.as_ref(), args)?;
            chain.push(page);
        }

        chain.anchored = displayed;
        Ok(chain)
    }

    /// Check one page; returns whether it is displayed and the class to
    /// visit next, if any.
    fn visit(
        &mut self,
        page: &dyn Page,
        args: &NavArgs,
    ) -> Result<(bool, Option<PageClass>), NavError> {
        let displayed = page.is_displayed(&mut self.browser)?;
        debug!(page = %page.name(), displayed, "backtrace visit");
        self.trace(
            NavTraceEvent::now(self.navigation, "backtrace", &page.name()).with_displayed(displayed),
        );

        if displayed {
            self.last_displayed = Some((page.class(), args.clone()));
            return Ok((true, None));
        }
        Ok((false, page.prerequisite()))
    }

    // ------------------------------------------------------------------
    // Replay
    // ------------------------------------------------------------------

    fn replay(&mut self, chain: PathChain, args: &NavArgs) -> Result<Box<dyn Page>, NavError> {
        let PathChain {
            target,
            mut hops,
            anchored,
        } = chain;

        // Unanchored root: start from the last displayed page, provided the
        // browser still shows it.
        if !anchored {
            let root_name = hops.last().unwrap_or(&target).name();
            match self.still_displayed()? {
                Some(shown) => hops.push(shown),
                None => {
                    warn!(dest = %root_name, "no displayed page to start from");
                    self.last_displayed = None;
                    return Err(NavError::StepNotFound {
                        current: "<none>".to_string(),
                        dest: root_name,
                        possibilities: Vec::new(),
                    });
                }
            }
        }

        let mut current = match hops.pop() {
            Some(root) => root,
            None => return Ok(target),
        };
        while let Some(dest) = hops.pop() {
            current = self.advance(current.as_ref(), dest, args)?;
        }
        self.advance(current.as_ref(), target, args)
    }

    /// Rebuild the last displayed page if the browser is still on it.
    fn still_displayed(&mut self) -> Result<Option<Box<dyn Page>>, NavError> {
        let Some((class, shown_args)) = self.last_displayed.clone() else {
            return Ok(None);
        };
        let page = class.build(&shown_args)?;
        if page.is_displayed(&mut self.browser)? {
            return Ok(Some(page));
        }
        debug!(page = %page.name(), "last displayed page is gone");
        Ok(None)
    }

    /// Step from `page` to `dest` and run `dest`'s post-navigation hook.
    fn advance(
        &mut self,
        page: &dyn Page,
        mut dest: Box<dyn Page>,
        args: &NavArgs,
    ) -> Result<Box<dyn Page>, NavError> {
        let steps = StepRegistry::collect(page);
        let dispatched = match dispatch(&self.rules, &steps, &mut self.browser, dest.as_ref(), args)
        {
            Ok(dispatched) => dispatched,
            Err(e) => {
                warn!(from = %page.name(), to = %dest.name(), error = %e, "navigation step failed");
                return Err(e);
            }
        };

        info!(
            from = %page.name(),
            to = %dest.name(),
            step = %dispatched.step,
            rule = dispatched.rule,
            "navigation step"
        );
        self.trace(
            NavTraceEvent::now(self.navigation, "step", &page.name())
                .with_dest(dest.name())
                .with_step(&dispatched.step, dispatched.rule),
        );

        dest.post_navigate(&mut self.browser)?;
        self.last_displayed = Some((dest.class(), args.clone()));
        Ok(dest)
    }

    fn trace(&self, event: NavTraceEvent) {
        if self.tracer.is_enabled() {
            self.tracer.log(&event);
        }
    }
}
