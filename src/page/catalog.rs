use std::collections::BTreeMap;

use crate::navigation::error::NavError;
use crate::page::page_model::{PageClass, PageType};

/// Page classes keyed by name.
///
/// Resolves string destinations and lets callers navigate by name (specs,
/// CLI). Filled once while the page set is declared.
#[derive(Debug, Clone, Default)]
pub struct PageCatalog {
    classes: BTreeMap<String, PageClass>,
}

impl PageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Returns the class previously registered under the
    /// same name, if any.
    pub fn register(&mut self, class: PageClass) -> Option<PageClass> {
        self.classes.insert(class.name().to_string(), class)
    }

    pub fn register_type<P: PageType>(&mut self) -> &mut Self {
        self.register(PageClass::of::<P>());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PageClass> {
        self.classes.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<PageClass, NavError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| NavError::UnknownPage(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
