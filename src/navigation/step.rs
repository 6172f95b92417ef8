use std::fmt;

use serde_json::Value;

use crate::browser::driver::Browser;
use crate::navigation::error::{BindError, NavError, StepError};
use crate::page::page_model::{Page, PageClass, PageType};
use crate::page::params::NavArgs;

/// Tag marking a step that navigates by path rather than to a fixed class.
pub const HREF_MARKER: &str = "@href";

// ============================================================================
// Destination tags
// ============================================================================

/// Where a step leads.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// A concrete page class.
    Page(PageClass),
    /// A page class referenced by name, resolved when dispatching.
    Named(String),
    /// Any page, reached through its own path.
    Href,
}

impl Destination {
    pub fn page<P: PageType>() -> Self {
        Destination::Page(PageClass::of::<P>())
    }

    /// Label used in diagnostics.
    pub fn label(&self) -> String {
        match self {
            Destination::Page(class) => class.name().to_string(),
            Destination::Named(name) => name.clone(),
            Destination::Href => HREF_MARKER.to_string(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// Steps
// ============================================================================

/// A declared step parameter, with an optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct StepParam {
    pub name: String,
    pub default: Option<Value>,
}

pub type ArgsHandler<'p> = Box<dyn Fn(&mut dyn Browser, &NavArgs) -> Result<(), StepError> + 'p>;
pub type HrefHandler<'p> = Box<dyn Fn(&mut dyn Browser, &str) -> Result<(), StepError> + 'p>;

enum StepAction<'p> {
    Args(ArgsHandler<'p>),
    Href(HrefHandler<'p>),
}

/// A transition action declared on a page.
pub struct Step<'p> {
    owner: String,
    name: String,
    destination: Destination,
    params: Vec<StepParam>,
    action: StepAction<'p>,
}

impl<'p> Step<'p> {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn params(&self) -> &[StepParam] {
        &self.params
    }

    /// Bind caller arguments to the declared parameters.
    ///
    /// Arguments the step does not declare are dropped; undeclared-but-missing
    /// parameters take their defaults.
    pub fn bind(&self, args: &NavArgs) -> Result<NavArgs, BindError> {
        let mut bound = NavArgs::new();
        for param in &self.params {
            let value = args
                .get(&param.name)
                .or(param.default.as_ref())
                .ok_or_else(|| BindError::MissingArgument(param.name.clone()))?;
            bound.insert(param.name.clone(), value.clone());
        }
        Ok(bound)
    }

    /// Run the step with the subset of `args` it declares.
    pub fn invoke_with_args(
        &self,
        browser: &mut dyn Browser,
        args: &NavArgs,
    ) -> Result<(), NavError> {
        let result = match &self.action {
            StepAction::Args(handler) => match self.bind(args) {
                Ok(bound) => handler(browser, &bound),
                Err(e) => Err(e.into()),
            },
            StepAction::Href(_) => Err(BindError::ExpectedPath.into()),
        };
        result.map_err(|source| self.failed(source))
    }

    /// Run the step with a destination path as its only argument.
    pub fn invoke_with_path(&self, browser: &mut dyn Browser, path: &str) -> Result<(), NavError> {
        let result = match &self.action {
            StepAction::Href(handler) => handler(browser, path),
            StepAction::Args(_) => Err(BindError::ExpectedArguments.into()),
        };
        result.map_err(|source| self.failed(source))
    }

    fn failed(&self, source: StepError) -> NavError {
        NavError::StepFailed {
            page: self.owner.clone(),
            step: self.name.clone(),
            source,
        }
    }
}

impl fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("destination", &self.destination)
            .field("params", &self.params)
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The steps one page instance offers, in declaration order.
///
/// Pages fill it from `Page::register_steps`; a page composed from a shared
/// base calls the base's registration first and then adds its own.
pub struct StepRegistry<'p> {
    owner: String,
    steps: Vec<Step<'p>>,
}

impl<'p> StepRegistry<'p> {
    pub fn new(owner: &str) -> Self {
        StepRegistry {
            owner: owner.to_string(),
            steps: Vec::new(),
        }
    }

    /// Collect every step `page` declares.
    pub fn collect(page: &'p dyn Page) -> Self {
        let mut registry = StepRegistry::new(&page.name());
        page.register_steps(&mut registry);
        registry
    }

    /// Declare a step leading to `dest`.
    pub fn to(&mut self, name: &str, dest: PageClass) -> StepBuilder<'_, 'p> {
        StepBuilder::new(self, name, Destination::Page(dest))
    }

    pub fn to_page<P: PageType>(&mut self, name: &str) -> StepBuilder<'_, 'p> {
        self.to(name, PageClass::of::<P>())
    }

    /// Declare a step leading to a page known only by name.
    pub fn to_named(&mut self, name: &str, page_name: &str) -> StepBuilder<'_, 'p> {
        StepBuilder::new(self, name, Destination::Named(page_name.to_string()))
    }

    /// Declare a link-like step that can reach any page given its path.
    pub fn href<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&mut dyn Browser, &str) -> Result<(), StepError> + 'p,
    {
        self.steps.push(Step {
            owner: self.owner.clone(),
            name: name.to_string(),
            destination: Destination::Href,
            params: Vec::new(),
            action: StepAction::Href(Box::new(handler)),
        });
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn steps(&self) -> &[Step<'p>] {
        &self.steps
    }

    /// Destination labels of every step, in declaration order.
    pub fn destinations(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.destination.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builder returned by `StepRegistry::to*`; `run` registers the step.
pub struct StepBuilder<'r, 'p> {
    registry: &'r mut StepRegistry<'p>,
    name: String,
    destination: Destination,
    params: Vec<StepParam>,
}

impl<'r, 'p> StepBuilder<'r, 'p> {
    fn new(registry: &'r mut StepRegistry<'p>, name: &str, destination: Destination) -> Self {
        StepBuilder {
            registry,
            name: name.to_string(),
            destination,
            params: Vec::new(),
        }
    }

    /// Declare a required parameter.
    pub fn param(mut self, name: &str) -> Self {
        self.params.push(StepParam {
            name: name.to_string(),
            default: None,
        });
        self
    }

    /// Declare a parameter with a default value.
    pub fn param_or(mut self, name: &str, default: impl Into<Value>) -> Self {
        self.params.push(StepParam {
            name: name.to_string(),
            default: Some(default.into()),
        });
        self
    }

    pub fn run<F>(self, handler: F)
    where
        F: Fn(&mut dyn Browser, &NavArgs) -> Result<(), StepError> + 'p,
    {
        let owner = self.registry.owner.clone();
        self.registry.steps.push(Step {
            owner,
            name: self.name,
            destination: self.destination,
            params: self.params,
            action: StepAction::Args(Box::new(handler)),
        });
    }
}
