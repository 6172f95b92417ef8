use std::sync::Arc;

use crate::browser::driver::{Browser, SelectorHint, extract_path};
use crate::browser::error::BrowserError;
use crate::navigation::error::{NavError, StepError};
use crate::navigation::step::StepRegistry;
use crate::page::catalog::PageCatalog;
use crate::page::page_model::{Page, PageClass};
use crate::page::params::{NavArgs, TemplateError, render_template};
use crate::site::site_model::{ActionDef, Check, MenuLink, PageDef, ParamDef, SiteMap};

// ============================================================================
// Page classes for a site map
// ============================================================================

impl SiteMap {
    /// Class handle for the declared page `name`.
    pub fn class_named(self: &Arc<Self>, name: &str) -> Option<PageClass> {
        let index = self.index_of(name)?;
        Some(site_class(self, index))
    }

    /// Catalog holding every declared page.
    pub fn catalog(self: &Arc<Self>) -> PageCatalog {
        let mut catalog = PageCatalog::new();
        for page in &self.pages {
            if let Some(class) = self.class_named(&page.name) {
                catalog.register(class);
            }
        }
        catalog
    }
}

fn site_class(site: &Arc<SiteMap>, index: usize) -> PageClass {
    let site = Arc::clone(site);
    let name = site.pages[index].name.clone();
    PageClass::declared(&name, move |args| {
        Ok(Box::new(SitePage::new(Arc::clone(&site), index, args)?) as Box<dyn Page>)
    })
}

// ============================================================================
// Site page
// ============================================================================

/// A page instance built from a site map declaration.
pub struct SitePage {
    site: Arc<SiteMap>,
    index: usize,
    path: String,
    args: NavArgs,
}

impl SitePage {
    pub fn new(site: Arc<SiteMap>, index: usize, args: &NavArgs) -> Result<Self, NavError> {
        let def = &site.pages[index];
        let path = render_template(&def.path, args).map_err(|e| NavError::PageConstruction {
            page: def.name.clone(),
            source: e,
        })?;
        Ok(SitePage {
            site,
            index,
            path,
            args: args.clone(),
        })
    }

    pub fn def(&self) -> &PageDef {
        &self.site.pages[self.index]
    }

    /// Arguments the page was built with.
    pub fn args(&self) -> &NavArgs {
        &self.args
    }

    fn check(&self, check: &Check, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
        match check {
            Check::Visible { selector } => browser.is_visible(&self.render(selector)),
            Check::UrlContains { expected } => {
                let url = browser.current_url()?;
                Ok(url.contains(&self.render(expected)))
            }
            Check::PathMatches => {
                let url = browser.current_url()?;
                Ok(extract_path(&url) == self.path)
            }
        }
    }

    /// Templates in checks fall back to their raw text when an argument is
    /// missing.
    fn render(&self, template: &str) -> String {
        render_template(template, &self.args).unwrap_or_else(|_| template.to_string())
    }
}

impl Page for SitePage {
    fn class(&self) -> PageClass {
        site_class(&self.site, self.index)
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn prerequisite(&self) -> Option<PageClass> {
        let name = self.def().prerequisite.as_deref()?;
        self.site.class_named(name)
    }

    fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
        let def = self.def();
        if def.checks.is_empty() {
            return self.check(&Check::PathMatches, browser);
        }
        for check in &def.checks {
            if !self.check(check, browser)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn register_steps<'p>(&'p self, steps: &mut StepRegistry<'p>) {
        register_menu(&self.site.menu, steps);

        for step in &self.def().steps {
            let mut builder = steps.to_named(&step.step_name(), &step.to);
            for param in &step.params {
                builder = match param {
                    ParamDef::Required(name) => builder.param(name),
                    ParamDef::WithDefault { name, default } => builder.param_or(name, default.clone()),
                };
            }
            let actions = &step.actions;
            builder.run(move |browser, args| run_actions(actions, browser, args));
        }
    }
}

/// Link steps shared by every page of a site.
fn register_menu<'p>(menu: &'p [MenuLink], steps: &mut StepRegistry<'p>) {
    for link in menu {
        steps.href(&link.name, move |browser, path| {
            let selector = match &link.selector {
                Some(hint) => hint.map_text(|text| text.replace("{path}", path)),
                None => SelectorHint::link_to(path),
            };
            browser.click(&selector)?;
            Ok(())
        });
    }
}

fn run_actions(
    actions: &[ActionDef],
    browser: &mut dyn Browser,
    args: &NavArgs,
) -> Result<(), StepError> {
    for action in actions {
        match action {
            ActionDef::Click { selector } => {
                let selector = render_hint(selector, args)?;
                browser.click(&selector)?;
            }
            ActionDef::Fill { selector, value } => {
                let selector = render_hint(selector, args)?;
                browser.fill(&selector, &render_template(value, args)?)?;
            }
            ActionDef::Goto { path } => browser.set_path(&render_template(path, args)?)?,
        }
    }
    Ok(())
}

fn render_hint(hint: &SelectorHint, args: &NavArgs) -> Result<SelectorHint, TemplateError> {
    Ok(SelectorHint {
        css: hint.css.as_deref().map(|t| render_template(t, args)).transpose()?,
        name: hint.name.as_deref().map(|t| render_template(t, args)).transpose()?,
        ..hint.clone()
    })
}
