use crate::browser::driver::Browser;
use crate::navigation::error::NavError;
use crate::navigation::step::{Destination, Step, StepRegistry};
use crate::page::page_model::Page;
use crate::page::params::NavArgs;

// ============================================================================
// Dispatch rules
// ============================================================================

/// Decides whether a step leads to a destination page and, if so, runs it.
pub trait DispatchRule {
    fn name(&self) -> &'static str;

    fn applies(&self, step: &Step<'_>, dest: &dyn Page) -> bool;

    fn invoke(
        &self,
        step: &Step<'_>,
        browser: &mut dyn Browser,
        dest: &dyn Page,
        args: &NavArgs,
    ) -> Result<(), NavError>;
}

/// Step tagged with exactly the destination's class.
pub struct ClassIdentityRule;

impl DispatchRule for ClassIdentityRule {
    fn name(&self) -> &'static str {
        "class"
    }

    fn applies(&self, step: &Step<'_>, dest: &dyn Page) -> bool {
        matches!(step.destination(), Destination::Page(class) if *class == dest.class())
    }

    fn invoke(
        &self,
        step: &Step<'_>,
        browser: &mut dyn Browser,
        _dest: &dyn Page,
        args: &NavArgs,
    ) -> Result<(), NavError> {
        step.invoke_with_args(browser, args)
    }
}

/// Step tagged with the destination's class name.
pub struct ClassNameRule;

impl DispatchRule for ClassNameRule {
    fn name(&self) -> &'static str {
        "class_name"
    }

    fn applies(&self, step: &Step<'_>, dest: &dyn Page) -> bool {
        matches!(step.destination(), Destination::Named(name) if name.as_str() == dest.class().name())
    }

    fn invoke(
        &self,
        step: &Step<'_>,
        browser: &mut dyn Browser,
        _dest: &dyn Page,
        args: &NavArgs,
    ) -> Result<(), NavError> {
        step.invoke_with_args(browser, args)
    }
}

/// Link-like step; reaches any destination through its path.
pub struct HrefRule;

impl DispatchRule for HrefRule {
    fn name(&self) -> &'static str {
        "href"
    }

    fn applies(&self, step: &Step<'_>, _dest: &dyn Page) -> bool {
        matches!(step.destination(), Destination::Href)
    }

    fn invoke(
        &self,
        step: &Step<'_>,
        browser: &mut dyn Browser,
        dest: &dyn Page,
        _args: &NavArgs,
    ) -> Result<(), NavError> {
        step.invoke_with_path(browser, dest.path())
    }
}

/// The rules in priority order.
pub fn default_rules() -> Vec<Box<dyn DispatchRule>> {
    vec![
        Box::new(ClassIdentityRule),
        Box::new(ClassNameRule),
        Box::new(HrefRule),
    ]
}

/// Which step ran and under which rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub rule: &'static str,
    pub step: String,
}

/// Run the one step of `steps` that leads to `dest`.
///
/// Rules are tried in order; within a rule, steps in declaration order. The
/// first applicable pair is invoked and nothing else is tried.
pub fn dispatch(
    rules: &[Box<dyn DispatchRule>],
    steps: &StepRegistry<'_>,
    browser: &mut dyn Browser,
    dest: &dyn Page,
    args: &NavArgs,
) -> Result<Dispatched, NavError> {
    for rule in rules {
        if let Some(step) = steps.steps().iter().find(|s| rule.applies(s, dest)) {
            rule.invoke(step, browser, dest, args)?;
            return Ok(Dispatched {
                rule: rule.name(),
                step: step.name().to_string(),
            });
        }
    }

    Err(NavError::StepNotFound {
        current: steps.owner().to_string(),
        dest: dest.name(),
        possibilities: steps.destinations(),
    })
}
