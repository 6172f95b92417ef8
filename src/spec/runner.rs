use tracing::{info, warn};

use crate::browser::driver::Browser;
use crate::navigation::error::NavError;
use crate::navigation::navigator::Navigator;
use crate::page::catalog::PageCatalog;
use crate::spec::context::TestContext;
use crate::spec::spec_model::{AssertionResult, AssertionSpec, NavSpec, NavStep, TestResult};

/// Executes a `NavSpec` step-by-step through a `Navigator`.
pub struct SpecRunner;

impl SpecRunner {
    /// Run a complete spec. Never fails: errors end the run and are
    /// reported in the `TestResult`.
    pub fn run<B: Browser>(
        spec: &NavSpec,
        navigator: &mut Navigator<B>,
        catalog: &PageCatalog,
    ) -> TestResult {
        let mut ctx = TestContext::new();
        info!(spec = %spec.name, "running spec");

        if let Some(url) = &spec.start_url {
            if let Err(e) = navigator.browser_mut().goto(url) {
                return Self::finish(spec, ctx, 0, Some(format!("Failed to load start_url: {}", e)));
            }
        }

        for (i, step) in spec.steps.iter().enumerate() {
            ctx.current_step = i;
            if let Err(e) = Self::execute_step(step, i, navigator, catalog, &mut ctx) {
                warn!(spec = %spec.name, step = i, error = %e, "spec step failed");
                return Self::finish(spec, ctx, i + 1, Some(format!("Step {} failed: {}", i, e)));
            }
        }

        Self::finish(spec, ctx, spec.steps.len(), None)
    }

    fn finish(spec: &NavSpec, ctx: TestContext, steps_run: usize, error: Option<String>) -> TestResult {
        TestResult {
            spec_name: spec.name.clone(),
            passed: error.is_none() && ctx.all_passed(),
            steps_run,
            pages: ctx.pages,
            assertion_results: ctx.assertion_results,
            error,
        }
    }

    fn execute_step<B: Browser>(
        step: &NavStep,
        step_index: usize,
        navigator: &mut Navigator<B>,
        catalog: &PageCatalog,
        ctx: &mut TestContext,
    ) -> Result<(), NavError> {
        match step {
            NavStep::Open { page, url, args } => {
                let class = page.as_deref().map(|name| catalog.resolve(name)).transpose()?;
                if let Some(opened) = navigator.open(class.as_ref(), url.as_deref(), args)? {
                    ctx.record_page(opened.name());
                }
                Ok(())
            }

            NavStep::Navigate { page, args } => {
                let reached = navigator.navigate_by_name(catalog, page, args)?;
                ctx.record_page(reached.name());
                Ok(())
            }

            NavStep::Click { selector } => Ok(navigator.browser_mut().click(selector)?),

            NavStep::Fill { selector, value } => Ok(navigator.browser_mut().fill(selector, value)?),

            NavStep::Assert { assertions } => {
                let results = assertions
                    .iter()
                    .map(|spec| Self::evaluate_one(spec, step_index, navigator, catalog))
                    .collect();
                ctx.record_assertions(results);
                Ok(())
            }
        }
    }

    /// Evaluate a single assertion.
    fn evaluate_one<B: Browser>(
        spec: &AssertionSpec,
        step_index: usize,
        navigator: &mut Navigator<B>,
        catalog: &PageCatalog,
    ) -> AssertionResult {
        let outcome = match spec {
            AssertionSpec::UrlContains { expected } => {
                navigator.browser_mut().current_url().map(|url| {
                    let passed = url.contains(expected.as_str());
                    let message = format!("URL does not contain '{}'", expected);
                    (passed, Some(url), message)
                })
            }

            AssertionSpec::UrlEquals { expected } => {
                navigator.browser_mut().current_url().map(|url| {
                    let passed = url == *expected;
                    let message = format!("URL does not equal '{}'", expected);
                    (passed, Some(url), message)
                })
            }

            AssertionSpec::PageDisplayed { page, args } => {
                let displayed = catalog
                    .resolve(page)
                    .and_then(|class| navigator.new_page(&class, args))
                    .and_then(|p| p.is_displayed(navigator.browser_mut()).map_err(NavError::from));
                match displayed {
                    Ok(displayed) => Ok((
                        displayed,
                        Some(displayed.to_string()),
                        format!("Page '{}' is not displayed", page),
                    )),
                    Err(e) => return Self::errored(spec, step_index, e),
                }
            }

            AssertionSpec::ElementText { selector, expected } => {
                match navigator.browser_mut().text_of(selector) {
                    Ok(Some(text)) => {
                        let passed = text.to_lowercase().contains(&expected.to_lowercase());
                        let message =
                            format!("Element '{}' text does not contain '{}'", selector, expected);
                        Ok((passed, Some(text), message))
                    }
                    Ok(None) => Ok((false, None, format!("Element '{}' not found on page", selector))),
                    Err(e) => Err(e),
                }
            }

            AssertionSpec::ElementVisible { selector } => {
                navigator.browser_mut().is_visible(selector).map(|visible| {
                    let message = format!("Element '{}' is not visible", selector);
                    (visible, Some(visible.to_string()), message)
                })
            }

            AssertionSpec::ElementCount { selector, expected } => {
                navigator.browser_mut().count(selector).map(|count| {
                    let message = format!(
                        "Element '{}' count is {} but expected {}",
                        selector, count, expected
                    );
                    (count == *expected, Some(count.to_string()), message)
                })
            }
        };

        match outcome {
            Ok((passed, actual, message)) => AssertionResult {
                step_index,
                spec: spec.clone(),
                passed,
                actual,
                message: if passed { None } else { Some(message) },
            },
            Err(e) => Self::errored(spec, step_index, e),
        }
    }

    fn errored(
        spec: &AssertionSpec,
        step_index: usize,
        error: impl std::fmt::Display,
    ) -> AssertionResult {
        AssertionResult {
            step_index,
            spec: spec.clone(),
            passed: false,
            actual: None,
            message: Some(format!("{} could not be evaluated: {}", spec.kind(), error)),
        }
    }
}
