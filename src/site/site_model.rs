use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::browser::driver::SelectorHint;
use crate::page::params::{TemplateError, placeholders};

// ============================================================================
// Site map model (YAML)
// ============================================================================

/// A declarative page graph for one portal.
///
/// ```yaml
/// name: admin
/// menu:
///   - name: sidebar
/// pages:
///   - name: Dashboard
///     path: /p/admin/dashboard
///     checks:
///       - check: visible
///         selector: "#dashboard"
///     steps:
///       - to: Accounts
///         actions:
///           - action: click
///             selector: { css: "a#accounts" }
///   - name: Accounts
///     path: /buyers/accounts
///     prerequisite: Dashboard
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteMap {
    pub name: String,

    /// Link steps every page offers (the shared page chrome)
    #[serde(default)]
    pub menu: Vec<MenuLink>,

    pub pages: Vec<PageDef>,
}

/// One declared page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDef {
    pub name: String,

    /// Path template, e.g. `/buyers/accounts/{account_id}`
    pub path: String,

    #[serde(default)]
    pub prerequisite: Option<String>,

    /// All must hold for the page to count as displayed; `path_matches`
    /// when empty
    #[serde(default)]
    pub checks: Vec<Check>,

    #[serde(default)]
    pub steps: Vec<StepDef>,
}

/// A visibility check against the live browser. Selectors and URL
/// fragments may use `{param}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
    /// CSS selector that must be visible
    Visible { selector: String },
    /// Substring of the current URL
    UrlContains { expected: String },
    /// Current path equals the rendered page path
    PathMatches,
}

/// A transition declared on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDef {
    /// Destination page name
    pub to: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub params: Vec<ParamDef>,

    pub actions: Vec<ActionDef>,
}

impl StepDef {
    pub fn step_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("to_{}", self.to.to_lowercase()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamDef {
    Required(String),
    WithDefault { name: String, default: Value },
}

/// Browser interaction performed by a step. Selectors and values may use
/// `{param}` placeholders bound from navigation arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDef {
    Click { selector: SelectorHint },
    Fill { selector: SelectorHint, value: String },
    /// Load a path template on the current origin
    Goto { path: String },
}

/// Link step shared by all pages; `{path}` in the selector is replaced by
/// the destination path. Defaults to `a[href='{path}']`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuLink {
    pub name: String,

    #[serde(default)]
    pub selector: Option<SelectorHint>,
}

// ============================================================================
// Loading and validation
// ============================================================================

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("cannot read site map {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid site map YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("page '{0}' declared twice")]
    DuplicatePage(String),

    #[error("page '{page}' requires unknown page '{prerequisite}'")]
    UnknownPrerequisite { page: String, prerequisite: String },

    #[error("page '{page}' has a step to unknown page '{dest}'")]
    UnknownDestination { page: String, dest: String },

    #[error("prerequisite cycle: {}", .0.join(" -> "))]
    PrerequisiteCycle(Vec<String>),

    #[error("page '{page}': {source}")]
    Template {
        page: String,
        #[source]
        source: TemplateError,
    },
}

impl SiteMap {
    pub fn from_yaml(yaml: &str) -> Result<Arc<SiteMap>, SiteError> {
        let site: SiteMap = serde_yaml::from_str(yaml)?;
        site.validate()?;
        Ok(Arc::new(site))
    }

    pub fn load(path: &str) -> Result<Arc<SiteMap>, SiteError> {
        let content = std::fs::read_to_string(path).map_err(|e| SiteError::Io {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn page(&self, name: &str) -> Option<&PageDef> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.name == name)
    }

    /// Reject duplicate names, dangling references, malformed templates and
    /// prerequisite cycles.
    pub fn validate(&self) -> Result<(), SiteError> {
        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.name.as_str()) {
                return Err(SiteError::DuplicatePage(page.name.clone()));
            }
        }

        for page in &self.pages {
            placeholders(&page.path).map_err(|e| SiteError::Template {
                page: page.name.clone(),
                source: e,
            })?;

            if let Some(prerequisite) = &page.prerequisite {
                if !seen.contains(prerequisite.as_str()) {
                    return Err(SiteError::UnknownPrerequisite {
                        page: page.name.clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
            }

            for step in &page.steps {
                if !seen.contains(step.to.as_str()) {
                    return Err(SiteError::UnknownDestination {
                        page: page.name.clone(),
                        dest: step.to.clone(),
                    });
                }
            }
        }

        self.check_cycles()
    }

    fn check_cycles(&self) -> Result<(), SiteError> {
        for page in &self.pages {
            let mut chain = vec![page.name.as_str()];
            let mut current = page;
            while let Some(next) = current.prerequisite.as_deref().and_then(|r| self.page(r)) {
                if chain.contains(&next.name.as_str()) {
                    let mut names: Vec<String> = chain.iter().map(|s| s.to_string()).collect();
                    names.push(next.name.clone());
                    return Err(SiteError::PrerequisiteCycle(names));
                }
                chain.push(&next.name);
                current = next;
            }
        }
        Ok(())
    }

    /// Pages without a prerequisite, in declaration order.
    pub fn roots(&self) -> Vec<&PageDef> {
        self.pages
            .iter()
            .filter(|p| p.prerequisite.is_none())
            .collect()
    }

    /// Pages whose prerequisite is `name`, in declaration order.
    pub fn dependents(&self, name: &str) -> Vec<&PageDef> {
        self.pages
            .iter()
            .filter(|p| p.prerequisite.as_deref() == Some(name))
            .collect()
    }

    /// Indented prerequisite forest, one page per line with its steps.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            self.render_node(root, 0, &mut out);
        }
        out
    }

    fn render_node(&self, page: &PageDef, depth: usize, out: &mut String) {
        let targets: Vec<&str> = page.steps.iter().map(|s| s.to.as_str()).collect();
        out.push_str(&format!("{}{} {}", "  ".repeat(depth), page.name, page.path));
        if !targets.is_empty() {
            out.push_str(&format!(" -> [{}]", targets.join(", ")));
        }
        out.push('\n');
        for child in self.dependents(&page.name) {
            self.render_node(child, depth + 1, out);
        }
    }
}
